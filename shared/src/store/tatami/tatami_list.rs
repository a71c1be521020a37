use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::{CategoryId, CombinedId, IdGenerator, PositionId};
use crate::position_manager::{PositionHandle, PositionManager};
use crate::store::category::CategoryStore;
use crate::store::match_store::MatchStatus;
use crate::store::tatami::concurrent_group::ConcurrentBlockGroup;
use crate::store::tatami::location::{
    BlockLocation, ConcurrentGroupLocation, SequentialGroupLocation, TatamiLocation,
};
use crate::store::tatami::sequential_group::{Block, SequentialBlockGroup};
use crate::store::tatami::tatami::TatamiStore;

/// All tatamis of the tournament, with the block-moving machinery shared by
/// the scheduling actions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TatamiList {
    tatamis: PositionManager<TatamiStore>,
}

impl TatamiList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tatami_count(&self) -> usize {
        self.tatamis.len()
    }

    pub fn handle_at(&self, index: usize) -> Option<PositionHandle> {
        self.tatamis.handle_at(index)
    }

    pub fn contains_tatami(&self, handle: PositionHandle) -> bool {
        self.tatamis.contains(handle)
    }

    pub fn get_tatami(&self, handle: PositionHandle) -> Option<&TatamiStore> {
        self.tatamis.get(handle)
    }

    pub fn insert_tatami(&mut self, handle: PositionHandle, tatami: TatamiStore) {
        self.tatamis.insert(handle, tatami);
    }

    pub fn erase_tatami(&mut self, handle: PositionHandle) -> Option<TatamiStore> {
        self.tatamis.remove(handle)
    }

    pub fn handles(&self) -> impl Iterator<Item = PositionHandle> + '_ {
        self.tatamis.handles()
    }

    /// All blocks currently scheduled on the tatami named by `handle`,
    /// paired with their full locations.
    pub fn blocks_on_tatami(&self, handle: PositionHandle) -> Vec<(Block, BlockLocation)> {
        let mut result = Vec::new();
        let tatami = match self.tatamis.get(handle) {
            Some(tatami) => tatami,
            None => return result,
        };
        let tatami_location = TatamiLocation { handle };
        for (group_handle, group) in tatami.groups().iter() {
            let group_location = ConcurrentGroupLocation {
                tatami: tatami_location,
                handle: group_handle,
            };
            for (seq_handle, seq) in group.groups().iter() {
                let seq_location = SequentialGroupLocation {
                    concurrent_group: group_location,
                    handle: seq_handle,
                };
                for (pos, block) in seq.blocks().iter().enumerate() {
                    result.push((
                        *block,
                        BlockLocation {
                            sequential_group: seq_location,
                            pos,
                        },
                    ));
                }
            }
        }
        result
    }

    /// Builds a location addressing `group_index`/`seq_index` on the tatami
    /// at `tatami_index`, minting fresh position ids for levels that do not
    /// exist yet. Returns `None` when the tatami itself is missing.
    pub fn generate_location(
        &self,
        generator: &mut IdGenerator,
        tatami_index: usize,
        group_index: usize,
        seq_index: usize,
        pos: usize,
    ) -> Option<BlockLocation> {
        let tatami_handle = self.tatamis.handle_at(tatami_index)?;
        let tatami = self.tatamis.get(tatami_handle)?;

        let group_handle = tatami.groups().handle_at(group_index).unwrap_or_else(|| {
            let id: PositionId = generator.generate(|id| {
                tatami.groups().contains(PositionHandle { id, index: 0 })
            });
            PositionHandle {
                id,
                index: group_index,
            }
        });

        let seq_handle = tatami
            .groups()
            .get(group_handle)
            .and_then(|group| group.groups().handle_at(seq_index))
            .unwrap_or_else(|| PositionHandle {
                id: generator.sample(),
                index: seq_index,
            });

        Some(BlockLocation {
            sequential_group: SequentialGroupLocation {
                concurrent_group: ConcurrentGroupLocation {
                    tatami: TatamiLocation {
                        handle: tatami_handle,
                    },
                    handle: group_handle,
                },
                handle: seq_handle,
            },
            pos,
        })
    }

    /// Moves `block` between locations. Either side may be absent: `from`
    /// of `None` schedules a new block, `to` of `None` unschedules it.
    /// Emptied groups are erased, affected groups recomputed.
    pub fn move_block(
        &mut self,
        categories: &HashMap<CategoryId, CategoryStore>,
        block: Block,
        from: Option<BlockLocation>,
        to: Option<BlockLocation>,
    ) {
        if let Some(from) = from {
            if let Some(seq) = self.sequential_group_mut(from) {
                seq.erase_block(block);
            }
        }

        if let Some(to) = to {
            if let Some(tatami) = self.tatamis.get_mut(to.tatami_handle()) {
                let group = tatami
                    .groups_mut()
                    .get_or_insert_with(to.concurrent_group_handle(), ConcurrentBlockGroup::new);
                let seq = group
                    .groups_mut()
                    .get_or_insert_with(to.sequential_group_handle(), SequentialBlockGroup::new);
                seq.add_block(to.pos, block);
            }
        }

        if let Some(from) = from {
            self.cleanup_and_recompute(categories, from);
        }

        if let Some(to) = to {
            let same_group = from
                .map(|from| from.sequential_group == to.sequential_group)
                .unwrap_or(false);
            if !same_group {
                self.recompute_location(categories, to);
            }
        }
    }

    /// Recomputes the groups at `location` after their match material
    /// changed, e.g. following a draw.
    pub fn recompute_location(
        &mut self,
        categories: &HashMap<CategoryId, CategoryStore>,
        location: BlockLocation,
    ) {
        if let Some(seq) = self.sequential_group_mut(location) {
            seq.recompute(categories);
        }
        if let Some(group) = self.concurrent_group_mut(location.concurrent_group_location()) {
            group.recompute(categories);
        }
    }

    /// Erases the groups at `location` if the move emptied them, otherwise
    /// recomputes them.
    fn cleanup_and_recompute(
        &mut self,
        categories: &HashMap<CategoryId, CategoryStore>,
        location: BlockLocation,
    ) {
        let group_location = location.concurrent_group_location();
        if let Some(group) = self.concurrent_group_mut(group_location) {
            let seq_handle = location.sequential_group_handle();
            let seq_empty = group.groups().get(seq_handle).map(|seq| seq.is_empty());
            match seq_empty {
                Some(true) => {
                    group.groups_mut().remove(seq_handle);
                }
                Some(false) => {
                    if let Some(seq) = group.groups_mut().get_mut(seq_handle) {
                        seq.recompute(categories);
                    }
                }
                None => {}
            }
        }

        if let Some(tatami) = self.tatamis.get_mut(group_location.tatami.handle) {
            let group_empty = tatami
                .groups()
                .get(group_location.handle)
                .map(|group| group.groups().is_empty());
            match group_empty {
                Some(true) => {
                    tatami.groups_mut().remove(group_location.handle);
                }
                Some(false) => {
                    if let Some(group) = tatami.groups_mut().get_mut(group_location.handle) {
                        group.recompute(categories);
                    }
                }
                None => {}
            }
        }
    }

    /// Incrementally updates group status sets after one match transition,
    /// avoiding a full recompute.
    pub fn update_match_status(
        &mut self,
        location: BlockLocation,
        combined: CombinedId,
        status: MatchStatus,
    ) {
        if let Some(group) = self.concurrent_group_mut(location.concurrent_group_location()) {
            group.update_status(combined, status);
        }
    }

    fn concurrent_group_mut(
        &mut self,
        location: ConcurrentGroupLocation,
    ) -> Option<&mut ConcurrentBlockGroup> {
        self.tatamis
            .get_mut(location.tatami.handle)?
            .groups_mut()
            .get_mut(location.handle)
    }

    fn sequential_group_mut(
        &mut self,
        location: BlockLocation,
    ) -> Option<&mut SequentialBlockGroup> {
        self.concurrent_group_mut(location.concurrent_group_location())?
            .groups_mut()
            .get_mut(location.sequential_group_handle())
    }
}
