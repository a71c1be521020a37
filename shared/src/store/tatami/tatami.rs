use serde::{Deserialize, Serialize};

use crate::position_manager::PositionManager;
use crate::store::tatami::concurrent_group::ConcurrentBlockGroup;

/// One mat: concurrent block groups in fight order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TatamiStore {
    groups: PositionManager<ConcurrentBlockGroup>,
}

impl TatamiStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &PositionManager<ConcurrentBlockGroup> {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut PositionManager<ConcurrentBlockGroup> {
        &mut self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
