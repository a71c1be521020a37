use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::actions::category_actions::ErasePlayersFromCategory;
use crate::actions::error::ActionError;
use crate::actions::StoreAction;
use crate::id::{CategoryId, IdGenerator, PlayerId};
use crate::store::event::StoreEvent;
use crate::store::player::{PlayerFields, PlayerStore, Weight};
use crate::store::tournament::TournamentStore;

/// Adds a batch of players with pre-minted ids.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddPlayers {
    ids: Vec<PlayerId>,
    fields: Vec<PlayerFields>,
}

impl AddPlayers {
    pub fn new(
        store: &TournamentStore,
        generator: &mut IdGenerator,
        fields: Vec<PlayerFields>,
    ) -> Self {
        let mut ids: Vec<PlayerId> = Vec::with_capacity(fields.len());
        for _ in &fields {
            let id = generator.generate(|id| store.contains_player(id) || ids.contains(&id));
            ids.push(id);
        }
        Self { ids, fields }
    }

    pub fn ids(&self) -> &[PlayerId] {
        &self.ids
    }
}

impl StoreAction for AddPlayers {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        for id in &self.ids {
            if store.contains_player(*id) {
                return Err(ActionError::PlayerAlreadyExists(*id));
            }
        }
        for (id, fields) in self.ids.iter().zip(self.fields.iter()) {
            store.add_player(PlayerStore::new(*id, fields.clone()));
        }
        store.record(StoreEvent::PlayersAdded(self.ids.clone()));
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        for id in &self.ids {
            store.erase_player(*id);
        }
        store.record(StoreEvent::PlayersErased(self.ids.clone()));
    }

    fn fresh_clone(&self) -> Self {
        self.clone()
    }

    fn description(&self) -> &'static str {
        "add players"
    }
}

/// Erases players, detaching them from every category they belong to via
/// child actions so each affected category is redrawn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErasePlayers {
    ids: Vec<PlayerId>,
    seed: u64,
    #[serde(skip)]
    erased_ids: Vec<PlayerId>,
    #[serde(skip)]
    players: Vec<PlayerStore>,
    #[serde(skip)]
    children: Vec<ErasePlayersFromCategory>,
}

impl ErasePlayers {
    pub fn new(ids: Vec<PlayerId>, seed: u64) -> Self {
        Self {
            ids,
            seed,
            erased_ids: Vec::new(),
            players: Vec::new(),
            children: Vec::new(),
        }
    }

    fn affected_categories(&self, store: &TournamentStore) -> BTreeSet<CategoryId> {
        // Ordered set so child actions run identically on every replica.
        self.ids
            .iter()
            .filter_map(|id| store.get_player(*id))
            .flat_map(|player| player.categories().iter().copied())
            .collect()
    }
}

impl StoreAction for ErasePlayers {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        self.erased_ids = self
            .ids
            .iter()
            .copied()
            .filter(|id| store.contains_player(*id))
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        for category_id in self.affected_categories(store) {
            let mut child =
                ErasePlayersFromCategory::new(category_id, self.erased_ids.clone(), rng.gen());
            child.redo(store)?;
            self.children.push(child);
        }

        for id in &self.erased_ids {
            if let Some(player) = store.erase_player(*id) {
                self.players.push(player);
            }
        }
        store.record(StoreEvent::PlayersErased(self.erased_ids.clone()));
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        for player in self.players.drain(..) {
            store.add_player(player);
        }
        store.record(StoreEvent::PlayersAdded(self.erased_ids.clone()));

        for child in self.children.iter_mut().rev() {
            child.undo(store);
        }
        self.children.clear();
        self.erased_ids.clear();
    }

    fn fresh_clone(&self) -> Self {
        Self::new(self.ids.clone(), self.seed)
    }

    fn description(&self) -> &'static str {
        "erase players"
    }

    fn requires_confirmation(&self, store: &TournamentStore) -> bool {
        self.affected_categories(store).iter().any(|id| {
            store
                .get_category(*id)
                .map(|category| {
                    crate::store::match_store::MatchType::ALL
                        .iter()
                        .any(|mt| category.is_started(*mt))
                })
                .unwrap_or(false)
        })
    }
}

macro_rules! change_players_field {
    ($(#[$meta:meta])* $name:ident, $value:ty, $get:ident, $set:expr, $desc:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Serialize, Deserialize)]
        pub struct $name {
            ids: Vec<PlayerId>,
            value: $value,
            #[serde(skip)]
            old_values: Vec<(PlayerId, $value)>,
        }

        impl $name {
            pub fn new(ids: Vec<PlayerId>, value: $value) -> Self {
                Self {
                    ids,
                    value,
                    old_values: Vec::new(),
                }
            }
        }

        impl StoreAction for $name {
            fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
                let mut changed = Vec::new();
                for id in &self.ids {
                    if let Some(player) = store.get_player_mut(*id) {
                        self.old_values
                            .push((*id, player.fields().$get.clone()));
                        let apply: fn(&mut PlayerFields, $value) = $set;
                        apply(player.fields_mut(), self.value.clone());
                        changed.push(*id);
                    }
                }
                if !changed.is_empty() {
                    store.record(StoreEvent::PlayersChanged(changed));
                }
                Ok(())
            }

            fn undo(&mut self, store: &mut TournamentStore) {
                let mut changed = Vec::new();
                for (id, old) in self.old_values.drain(..) {
                    if let Some(player) = store.get_player_mut(id) {
                        let apply: fn(&mut PlayerFields, $value) = $set;
                        apply(player.fields_mut(), old);
                        changed.push(id);
                    }
                }
                if !changed.is_empty() {
                    store.record(StoreEvent::PlayersChanged(changed));
                }
            }

            fn fresh_clone(&self) -> Self {
                Self::new(self.ids.clone(), self.value.clone())
            }

            fn description(&self) -> &'static str {
                $desc
            }
        }
    };
}

change_players_field!(
    ChangePlayersFirstName,
    String,
    first_name,
    |fields, value| fields.first_name = value,
    "change players first name"
);

change_players_field!(
    ChangePlayersLastName,
    String,
    last_name,
    |fields, value| fields.last_name = value,
    "change players last name"
);

change_players_field!(
    ChangePlayersWeight,
    Option<Weight>,
    weight,
    |fields, value| fields.weight = value,
    "change players weight"
);
