use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::actions::error::ActionError;
use crate::actions::StoreAction;
use crate::id::PositionId;
use crate::position_manager::PositionHandle;
use crate::store::event::StoreEvent;
use crate::store::tatami::{Block, BlockLocation, TatamiLocation, TatamiStore};
use crate::store::tournament::TournamentStore;

/// Grows or shrinks the tatami list. Erased tatamis are retained for undo;
/// blocks scheduled on them are unscheduled through child actions first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetTatamiCount {
    count: usize,
    seed: u64,
    #[serde(skip)]
    added: Vec<PositionHandle>,
    #[serde(skip)]
    erased: Vec<(PositionHandle, TatamiStore)>,
    #[serde(skip)]
    unschedules: Vec<SetTatamiLocation>,
}

impl SetTatamiCount {
    pub fn new(count: usize, seed: u64) -> Self {
        Self {
            count,
            seed,
            added: Vec::new(),
            erased: Vec::new(),
            unschedules: Vec::new(),
        }
    }
}

impl StoreAction for SetTatamiCount {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        let current = store.tatamis().tatami_count();

        if self.count >= current {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            let mut locations = Vec::new();
            for index in current..self.count {
                let id = loop {
                    let id = PositionId::new(rng.gen());
                    let handle = PositionHandle { id, index: 0 };
                    if !store.tatamis().contains_tatami(handle) {
                        break id;
                    }
                };
                let handle = PositionHandle { id, index };
                store.tatamis_mut().insert_tatami(handle, TatamiStore::new());
                self.added.push(handle);
                locations.push(TatamiLocation { handle });
            }
            if !locations.is_empty() {
                store.record(StoreEvent::TatamisAdded(locations));
            }
        } else {
            let mut locations = Vec::new();
            for index in (self.count..current).rev() {
                let handle = match store.tatamis().handle_at(index) {
                    Some(handle) => handle,
                    None => continue,
                };

                for (block, _) in store.tatamis().blocks_on_tatami(handle) {
                    let mut child = SetTatamiLocation::new(block, None);
                    child.redo(store)?;
                    self.unschedules.push(child);
                }

                if let Some(tatami) = store.tatamis_mut().erase_tatami(handle) {
                    self.erased.push((handle, tatami));
                    locations.push(TatamiLocation { handle });
                }
            }
            if !locations.is_empty() {
                store.record(StoreEvent::TatamisErased(locations));
            }
        }
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        if !self.erased.is_empty() {
            let mut locations = Vec::new();
            for (handle, tatami) in self.erased.drain(..).rev() {
                store.tatamis_mut().insert_tatami(handle, tatami);
                locations.push(TatamiLocation { handle });
            }
            store.record(StoreEvent::TatamisAdded(locations));
        }

        for child in self.unschedules.iter_mut().rev() {
            child.undo(store);
        }
        self.unschedules.clear();

        if !self.added.is_empty() {
            let mut locations = Vec::new();
            for handle in self.added.drain(..).rev() {
                store.tatamis_mut().erase_tatami(handle);
                locations.push(TatamiLocation { handle });
            }
            store.record(StoreEvent::TatamisErased(locations));
        }
    }

    fn fresh_clone(&self) -> Self {
        Self::new(self.count, self.seed)
    }

    fn description(&self) -> &'static str {
        "set tatami count"
    }
}

/// Moves a category-phase block to a new location, or unschedules it when
/// the target is `None`. Degrades to a silent no-op when the category or
/// target tatami no longer exists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetTatamiLocation {
    block: Block,
    target: Option<BlockLocation>,
    #[serde(skip)]
    origin: Option<BlockLocation>,
    #[serde(skip)]
    position_set: bool,
}

impl SetTatamiLocation {
    pub fn new(block: Block, target: Option<BlockLocation>) -> Self {
        Self {
            block,
            target,
            origin: None,
            position_set: false,
        }
    }
}

impl StoreAction for SetTatamiLocation {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        self.origin = None;
        self.position_set = false;

        let (category_id, match_type) = self.block;
        let origin = match store.get_category(category_id) {
            Some(category) => category.location(match_type),
            None => return Ok(()),
        };
        if let Some(target) = self.target {
            if !store.tatamis().contains_tatami(target.tatami_handle()) {
                return Ok(());
            }
        }
        if origin == self.target {
            return Ok(());
        }

        {
            let (tatamis, categories) = store.tatamis_and_categories_mut();
            tatamis.move_block(categories, self.block, origin, self.target);
        }
        if let Some(category) = store.get_category_mut(category_id) {
            category.set_location(match_type, self.target);
        }

        let changed: Vec<BlockLocation> = origin.into_iter().chain(self.target).collect();
        store.record(StoreEvent::TatamisChanged(changed));

        self.origin = origin;
        self.position_set = true;
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        if !self.position_set {
            return;
        }
        self.position_set = false;

        let (category_id, match_type) = self.block;
        if !store.contains_category(category_id) {
            return;
        }

        {
            let (tatamis, categories) = store.tatamis_and_categories_mut();
            tatamis.move_block(categories, self.block, self.target, self.origin);
        }
        if let Some(category) = store.get_category_mut(category_id) {
            category.set_location(match_type, self.origin);
        }

        let changed: Vec<BlockLocation> = self.origin.into_iter().chain(self.target).collect();
        store.record(StoreEvent::TatamisChanged(changed));
        self.origin = None;
    }

    fn fresh_clone(&self) -> Self {
        Self::new(self.block, self.target)
    }

    fn description(&self) -> &'static str {
        "set tatami location"
    }
}
