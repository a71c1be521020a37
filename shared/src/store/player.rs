use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::id::{CategoryId, PlayerId};

/// Player weight in kilograms.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Weight(pub f64);

/// ISO-style country label. Free-form; the presentation layer owns
/// normalization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Country(pub String);

/// The mutable descriptive fields of a player, separated from identity so
/// actions can carry them wholesale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerFields {
    pub first_name: String,
    pub last_name: String,
    pub club: String,
    pub weight: Option<Weight>,
    pub country: Option<Country>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStore {
    id: PlayerId,
    fields: PlayerFields,
    categories: HashSet<CategoryId>,
}

impl PlayerStore {
    pub fn new(id: PlayerId, fields: PlayerFields) -> Self {
        Self {
            id,
            fields,
            categories: HashSet::new(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn fields(&self) -> &PlayerFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut PlayerFields {
        &mut self.fields
    }

    pub fn categories(&self) -> &HashSet<CategoryId> {
        &self.categories
    }

    pub fn contains_category(&self, id: CategoryId) -> bool {
        self.categories.contains(&id)
    }

    pub fn add_category(&mut self, id: CategoryId) {
        self.categories.insert(id);
    }

    pub fn erase_category(&mut self, id: CategoryId) {
        self.categories.remove(&id);
    }
}
