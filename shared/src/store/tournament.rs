use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::{CategoryId, PlayerId, TournamentId};
use crate::store::category::CategoryStore;
use crate::store::event::StoreEvent;
use crate::store::player::PlayerStore;
use crate::store::preferences::PreferencesStore;
use crate::store::tatami::TatamiList;

/// Aggregate root of all tournament state. Mutated exclusively by actions;
/// the store itself offers plain accessors plus change-event recording.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TournamentStore {
    id: TournamentId,
    name: String,
    players: HashMap<PlayerId, PlayerStore>,
    categories: HashMap<CategoryId, CategoryStore>,
    tatamis: TatamiList,
    preferences: PreferencesStore,
    #[serde(skip)]
    events: Vec<StoreEvent>,
}

impl PartialEq for TournamentStore {
    /// Structural equality over replicated state; pending change events are
    /// local to a process and excluded.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.players == other.players
            && self.categories == other.categories
            && self.tatamis == other.tatamis
            && self.preferences == other.preferences
    }
}

impl TournamentStore {
    pub fn new(id: TournamentId, name: String) -> Self {
        Self {
            id,
            name,
            players: HashMap::new(),
            categories: HashMap::new(),
            tatamis: TatamiList::new(),
            preferences: PreferencesStore::default(),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> TournamentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    // Players

    pub fn players(&self) -> &HashMap<PlayerId, PlayerStore> {
        &self.players
    }

    pub fn contains_player(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&PlayerStore> {
        self.players.get(&id)
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut PlayerStore> {
        self.players.get_mut(&id)
    }

    pub fn add_player(&mut self, player: PlayerStore) {
        self.players.insert(player.id(), player);
    }

    pub fn erase_player(&mut self, id: PlayerId) -> Option<PlayerStore> {
        self.players.remove(&id)
    }

    // Categories

    pub fn categories(&self) -> &HashMap<CategoryId, CategoryStore> {
        &self.categories
    }

    pub fn contains_category(&self, id: CategoryId) -> bool {
        self.categories.contains_key(&id)
    }

    pub fn get_category(&self, id: CategoryId) -> Option<&CategoryStore> {
        self.categories.get(&id)
    }

    pub fn get_category_mut(&mut self, id: CategoryId) -> Option<&mut CategoryStore> {
        self.categories.get_mut(&id)
    }

    pub fn add_category(&mut self, category: CategoryStore) {
        self.categories.insert(category.id(), category);
    }

    pub fn erase_category(&mut self, id: CategoryId) -> Option<CategoryStore> {
        self.categories.remove(&id)
    }

    // Tatamis

    pub fn tatamis(&self) -> &TatamiList {
        &self.tatamis
    }

    pub fn tatamis_mut(&mut self) -> &mut TatamiList {
        &mut self.tatamis
    }

    /// Splits the borrow so block moves can read categories while mutating
    /// the tatami list.
    pub fn tatamis_and_categories_mut(
        &mut self,
    ) -> (&mut TatamiList, &HashMap<CategoryId, CategoryStore>) {
        (&mut self.tatamis, &self.categories)
    }

    /// Same split with mutable category access, for actions that update a
    /// category and its schedule together.
    pub fn categories_and_tatamis_mut(
        &mut self,
    ) -> (&mut HashMap<CategoryId, CategoryStore>, &mut TatamiList) {
        (&mut self.categories, &mut self.tatamis)
    }

    // Preferences

    pub fn preferences(&self) -> &PreferencesStore {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut PreferencesStore {
        &mut self.preferences
    }

    // Change events

    pub fn record(&mut self, event: StoreEvent) {
        self.events.push(event);
    }

    /// Drains events recorded since the last call. Intended for the
    /// embedding presentation layer; never consulted by the sync core.
    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }
}
