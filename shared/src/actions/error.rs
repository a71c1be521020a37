use thiserror::Error;

use crate::id::{CategoryId, PlayerId};

/// Precondition violation while executing an action.
///
/// Actions distinguish violations from benign staleness: an action whose
/// referent vanished under a concurrent edit degrades to a silent no-op,
/// while one that would corrupt identity invariants fails with an error.
/// During rebase an error means the replicas have diverged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    /// A freshly minted player id is already taken.
    #[error("player {0} already exists")]
    PlayerAlreadyExists(PlayerId),

    /// A freshly minted category id is already taken.
    #[error("category {0} already exists")]
    CategoryAlreadyExists(CategoryId),
}
