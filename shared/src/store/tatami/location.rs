use serde::{Deserialize, Serialize};

use crate::position_manager::PositionHandle;

/// Handles at every level carry id-only equality, so two locations compare
/// equal when they name the same slots even if their index hints diverged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TatamiLocation {
    pub handle: PositionHandle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConcurrentGroupLocation {
    pub tatami: TatamiLocation,
    pub handle: PositionHandle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequentialGroupLocation {
    pub concurrent_group: ConcurrentGroupLocation,
    pub handle: PositionHandle,
}

/// Full address of a block slot: tatami, concurrent group, sequential
/// group, and the position within the sequential group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockLocation {
    pub sequential_group: SequentialGroupLocation,
    pub pos: usize,
}

impl BlockLocation {
    pub fn tatami_handle(&self) -> PositionHandle {
        self.sequential_group.concurrent_group.tatami.handle
    }

    pub fn concurrent_group_handle(&self) -> PositionHandle {
        self.sequential_group.concurrent_group.handle
    }

    pub fn sequential_group_handle(&self) -> PositionHandle {
        self.sequential_group.handle
    }

    pub fn tatami_location(&self) -> TatamiLocation {
        self.sequential_group.concurrent_group.tatami
    }

    pub fn concurrent_group_location(&self) -> ConcurrentGroupLocation {
        self.sequential_group.concurrent_group
    }
}
