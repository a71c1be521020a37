use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::actions::error::ActionError;
use crate::actions::tatami_actions::SetTatamiLocation;
use crate::actions::StoreAction;
use crate::id::{CategoryId, IdGenerator, MatchId, PlayerId};
use crate::store::category::CategoryStore;
use crate::store::event::StoreEvent;
use crate::store::match_store::{MatchStore, MatchType};
use crate::store::tatami::BlockLocation;
use crate::store::tournament::TournamentStore;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddCategory {
    id: CategoryId,
    name: String,
}

impl AddCategory {
    pub fn new(store: &TournamentStore, generator: &mut IdGenerator, name: String) -> Self {
        let id = generator.generate(|id| store.contains_category(id));
        Self { id, name }
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }
}

impl StoreAction for AddCategory {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        if store.contains_category(self.id) {
            return Err(ActionError::CategoryAlreadyExists(self.id));
        }
        store.add_category(CategoryStore::new(self.id, self.name.clone()));
        store.record(StoreEvent::CategoriesAdded(vec![self.id]));
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        store.erase_category(self.id);
        store.record(StoreEvent::CategoriesErased(vec![self.id]));
    }

    fn fresh_clone(&self) -> Self {
        self.clone()
    }

    fn description(&self) -> &'static str {
        "add category"
    }
}

/// Erases categories, first unscheduling their blocks via child actions and
/// detaching their players.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EraseCategories {
    ids: Vec<CategoryId>,
    #[serde(skip)]
    erased_ids: Vec<CategoryId>,
    #[serde(skip)]
    categories: Vec<CategoryStore>,
    #[serde(skip)]
    unschedules: Vec<SetTatamiLocation>,
}

impl EraseCategories {
    pub fn new(ids: Vec<CategoryId>) -> Self {
        Self {
            ids,
            erased_ids: Vec::new(),
            categories: Vec::new(),
            unschedules: Vec::new(),
        }
    }
}

impl StoreAction for EraseCategories {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        for id in &self.ids {
            if !store.contains_category(*id) {
                continue;
            }

            for match_type in MatchType::ALL {
                let scheduled = store
                    .get_category(*id)
                    .and_then(|category| category.location(match_type))
                    .is_some();
                if scheduled {
                    let mut child = SetTatamiLocation::new((*id, match_type), None);
                    child.redo(store)?;
                    self.unschedules.push(child);
                }
            }

            let player_ids: Vec<PlayerId> = store
                .get_category(*id)
                .map(|category| category.players().iter().copied().collect())
                .unwrap_or_default();
            for player_id in player_ids {
                if let Some(player) = store.get_player_mut(player_id) {
                    player.erase_category(*id);
                }
            }

            if let Some(category) = store.erase_category(*id) {
                self.erased_ids.push(*id);
                self.categories.push(category);
            }
        }
        store.record(StoreEvent::CategoriesErased(self.erased_ids.clone()));
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        for category in self.categories.drain(..) {
            let id = category.id();
            let player_ids: Vec<PlayerId> = category.players().iter().copied().collect();
            store.add_category(category);
            for player_id in player_ids {
                if let Some(player) = store.get_player_mut(player_id) {
                    player.add_category(id);
                }
            }
        }
        store.record(StoreEvent::CategoriesAdded(self.erased_ids.clone()));
        self.erased_ids.clear();

        for child in self.unschedules.iter_mut().rev() {
            child.undo(store);
        }
        self.unschedules.clear();
    }

    fn fresh_clone(&self) -> Self {
        Self::new(self.ids.clone())
    }

    fn description(&self) -> &'static str {
        "erase categories"
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeCategoriesName {
    ids: Vec<CategoryId>,
    value: String,
    #[serde(skip)]
    old_values: Vec<(CategoryId, String)>,
}

impl ChangeCategoriesName {
    pub fn new(ids: Vec<CategoryId>, value: String) -> Self {
        Self {
            ids,
            value,
            old_values: Vec::new(),
        }
    }
}

impl StoreAction for ChangeCategoriesName {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        let mut changed = Vec::new();
        for id in &self.ids {
            if let Some(category) = store.get_category_mut(*id) {
                self.old_values.push((*id, category.name().to_owned()));
                category.set_name(self.value.clone());
                changed.push(*id);
            }
        }
        if !changed.is_empty() {
            store.record(StoreEvent::CategoriesChanged(changed));
        }
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        let mut changed = Vec::new();
        for (id, old) in self.old_values.drain(..) {
            if let Some(category) = store.get_category_mut(id) {
                category.set_name(old);
                changed.push(id);
            }
        }
        if !changed.is_empty() {
            store.record(StoreEvent::CategoriesChanged(changed));
        }
    }

    fn fresh_clone(&self) -> Self {
        Self::new(self.ids.clone(), self.value.clone())
    }

    fn description(&self) -> &'static str {
        "change categories name"
    }
}

/// Adds players to a category and redraws it. No-op when the category has
/// vanished under a concurrent edit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddPlayersToCategory {
    category_id: CategoryId,
    ids: Vec<PlayerId>,
    seed: u64,
    #[serde(skip)]
    added_ids: Vec<PlayerId>,
    #[serde(skip)]
    draw: Option<Box<DrawCategories>>,
}

impl AddPlayersToCategory {
    pub fn new(category_id: CategoryId, ids: Vec<PlayerId>, seed: u64) -> Self {
        Self {
            category_id,
            ids,
            seed,
            added_ids: Vec::new(),
            draw: None,
        }
    }
}

impl StoreAction for AddPlayersToCategory {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        if !store.contains_category(self.category_id) {
            return Ok(());
        }

        for id in &self.ids {
            let eligible = store
                .get_player(*id)
                .map(|player| !player.contains_category(self.category_id))
                .unwrap_or(false);
            if !eligible {
                continue;
            }
            if let Some(player) = store.get_player_mut(*id) {
                player.add_category(self.category_id);
            }
            if let Some(category) = store.get_category_mut(self.category_id) {
                category.add_player(*id);
            }
            self.added_ids.push(*id);
        }

        if self.added_ids.is_empty() {
            return Ok(());
        }
        store.record(StoreEvent::PlayersAddedToCategory {
            category: self.category_id,
            players: self.added_ids.clone(),
        });

        let mut draw = Box::new(DrawCategories::new(vec![self.category_id], self.seed));
        draw.redo(store)?;
        self.draw = Some(draw);
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        if !store.contains_category(self.category_id) {
            return;
        }

        for id in &self.added_ids {
            if let Some(player) = store.get_player_mut(*id) {
                player.erase_category(self.category_id);
            }
            if let Some(category) = store.get_category_mut(self.category_id) {
                category.erase_player(*id);
            }
        }
        if !self.added_ids.is_empty() {
            store.record(StoreEvent::PlayersErasedFromCategory {
                category: self.category_id,
                players: self.added_ids.clone(),
            });
        }
        self.added_ids.clear();

        if let Some(mut draw) = self.draw.take() {
            draw.undo(store);
        }
    }

    fn fresh_clone(&self) -> Self {
        Self::new(self.category_id, self.ids.clone(), self.seed)
    }

    fn description(&self) -> &'static str {
        "add players to category"
    }

    fn requires_confirmation(&self, store: &TournamentStore) -> bool {
        category_started(store, self.category_id)
    }
}

/// Removes players from a category and redraws it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErasePlayersFromCategory {
    category_id: CategoryId,
    ids: Vec<PlayerId>,
    seed: u64,
    #[serde(skip)]
    erased_ids: Vec<PlayerId>,
    #[serde(skip)]
    draw: Option<Box<DrawCategories>>,
}

impl ErasePlayersFromCategory {
    pub fn new(category_id: CategoryId, ids: Vec<PlayerId>, seed: u64) -> Self {
        Self {
            category_id,
            ids,
            seed,
            erased_ids: Vec::new(),
            draw: None,
        }
    }
}

impl StoreAction for ErasePlayersFromCategory {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        if !store.contains_category(self.category_id) {
            return Ok(());
        }

        for id in &self.ids {
            let member = store
                .get_player(*id)
                .map(|player| player.contains_category(self.category_id))
                .unwrap_or(false);
            if !member {
                continue;
            }
            if let Some(player) = store.get_player_mut(*id) {
                player.erase_category(self.category_id);
            }
            if let Some(category) = store.get_category_mut(self.category_id) {
                category.erase_player(*id);
            }
            self.erased_ids.push(*id);
        }

        if self.erased_ids.is_empty() {
            return Ok(());
        }
        store.record(StoreEvent::PlayersErasedFromCategory {
            category: self.category_id,
            players: self.erased_ids.clone(),
        });

        let mut draw = Box::new(DrawCategories::new(vec![self.category_id], self.seed));
        draw.redo(store)?;
        self.draw = Some(draw);
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        if !store.contains_category(self.category_id) {
            return;
        }

        for id in &self.erased_ids {
            if let Some(player) = store.get_player_mut(*id) {
                player.add_category(self.category_id);
            }
            if let Some(category) = store.get_category_mut(self.category_id) {
                category.add_player(*id);
            }
        }
        if !self.erased_ids.is_empty() {
            store.record(StoreEvent::PlayersAddedToCategory {
                category: self.category_id,
                players: self.erased_ids.clone(),
            });
        }
        self.erased_ids.clear();

        if let Some(mut draw) = self.draw.take() {
            draw.undo(store);
        }
    }

    fn fresh_clone(&self) -> Self {
        Self::new(self.category_id, self.ids.clone(), self.seed)
    }

    fn description(&self) -> &'static str {
        "erase players from category"
    }

    fn requires_confirmation(&self, store: &TournamentStore) -> bool {
        category_started(store, self.category_id)
    }
}

/// Rebuilds match lists from a seeded shuffle of each category's players.
///
/// The seed travels inside the serialized action, so every replica draws the
/// identical pairing. Categories with drawing disabled keep their matches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrawCategories {
    ids: Vec<CategoryId>,
    seed: u64,
    #[serde(skip)]
    old_matches: Vec<(CategoryId, Vec<MatchStore>)>,
}

impl DrawCategories {
    pub fn new(ids: Vec<CategoryId>, seed: u64) -> Self {
        Self {
            ids,
            seed,
            old_matches: Vec::new(),
        }
    }

    fn refresh_schedule(store: &mut TournamentStore, id: CategoryId) {
        let locations: Vec<BlockLocation> = store
            .get_category(id)
            .map(|category| {
                MatchType::ALL
                    .iter()
                    .filter_map(|mt| category.location(*mt))
                    .collect()
            })
            .unwrap_or_default();
        if locations.is_empty() {
            return;
        }
        let (tatamis, categories) = store.tatamis_and_categories_mut();
        for location in &locations {
            tatamis.recompute_location(categories, *location);
        }
        store.record(StoreEvent::TatamisChanged(locations));
    }
}

fn mint_match_id(rng: &mut ChaCha8Rng, used: &mut HashSet<MatchId>) -> MatchId {
    loop {
        let id = MatchId::new(rng.gen());
        if used.insert(id) {
            return id;
        }
    }
}

impl StoreAction for DrawCategories {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        for id in &self.ids {
            let players = match store.get_category(*id) {
                Some(category) if !category.draw_disabled() => {
                    let mut players: Vec<PlayerId> =
                        category.players().iter().copied().collect();
                    // Stable base order before the seeded shuffle.
                    players.sort_unstable();
                    players
                }
                _ => continue,
            };

            let mut shuffled = players;
            shuffled.shuffle(&mut rng);

            let mut used = HashSet::new();
            let mut matches = Vec::new();
            for pair in shuffled.chunks(2) {
                if let [white, blue] = pair {
                    matches.push(MatchStore::new(
                        mint_match_id(&mut rng, &mut used),
                        MatchType::Elimination,
                        Some(*white),
                        Some(*blue),
                    ));
                }
            }
            if shuffled.len() >= 2 {
                // Finalists are determined as the bracket resolves.
                matches.push(MatchStore::new(
                    mint_match_id(&mut rng, &mut used),
                    MatchType::Final,
                    None,
                    None,
                ));
            }

            if let Some(category) = store.get_category_mut(*id) {
                let old = category.replace_matches(matches);
                self.old_matches.push((*id, old));
            }
            store.record(StoreEvent::MatchesReset(*id));
            Self::refresh_schedule(store, *id);
        }
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        for (id, old) in self.old_matches.drain(..).rev() {
            if let Some(category) = store.get_category_mut(id) {
                category.replace_matches(old);
                store.record(StoreEvent::MatchesReset(id));
                Self::refresh_schedule(store, id);
            }
        }
    }

    fn fresh_clone(&self) -> Self {
        Self::new(self.ids.clone(), self.seed)
    }

    fn description(&self) -> &'static str {
        "draw categories"
    }

    fn requires_confirmation(&self, store: &TournamentStore) -> bool {
        self.ids.iter().any(|id| category_started(store, *id))
    }
}

fn category_started(store: &TournamentStore, id: CategoryId) -> bool {
    store
        .get_category(id)
        .map(|category| MatchType::ALL.iter().any(|mt| category.is_started(*mt)))
        .unwrap_or(false)
}
