use serde::{Deserialize, Serialize};

use crate::id::{CategoryId, CombinedId, PlayerId};
use crate::store::tatami::{BlockLocation, TatamiLocation};

/// Change notification recorded by the store while an action executes.
///
/// Events accumulate in the store and are drained by the embedding layer
/// with [`TournamentStore::take_events`](crate::store::TournamentStore::take_events)
/// after each action; the synchronization core itself never inspects them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StoreEvent {
    PlayersAdded(Vec<PlayerId>),
    PlayersErased(Vec<PlayerId>),
    PlayersChanged(Vec<PlayerId>),
    CategoriesAdded(Vec<CategoryId>),
    CategoriesErased(Vec<CategoryId>),
    CategoriesChanged(Vec<CategoryId>),
    PlayersAddedToCategory {
        category: CategoryId,
        players: Vec<PlayerId>,
    },
    PlayersErasedFromCategory {
        category: CategoryId,
        players: Vec<PlayerId>,
    },
    /// The category's match list was rebuilt from scratch by a draw.
    MatchesReset(CategoryId),
    MatchChanged(CombinedId),
    TatamisAdded(Vec<TatamiLocation>),
    TatamisErased(Vec<TatamiLocation>),
    /// Blocks at these locations moved or had their groups recomputed.
    TatamisChanged(Vec<BlockLocation>),
    PreferencesChanged,
}
