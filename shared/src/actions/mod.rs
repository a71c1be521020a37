//! Invertible edits over the tournament store.
//!
//! Every mutation of tournament state is an action: `redo` applies it and
//! captures whatever undo needs, `undo` restores the prior state exactly,
//! and `fresh_clone` yields the pristine form for transmission or replay.
//! Composite actions own their children and unwind them in reverse order.

pub mod category_actions;
pub mod error;
pub mod match_actions;
pub mod player_actions;
pub mod preference_actions;
pub mod tatami_actions;

use serde::{Deserialize, Serialize};

pub use category_actions::{
    AddCategory, AddPlayersToCategory, ChangeCategoriesName, DrawCategories, EraseCategories,
    ErasePlayersFromCategory,
};
pub use error::ActionError;
pub use match_actions::SetMatchStatus;
pub use player_actions::{
    AddPlayers, ChangePlayersFirstName, ChangePlayersLastName, ChangePlayersWeight, ErasePlayers,
};
pub use preference_actions::SetScoreboardStyle;
pub use tatami_actions::{SetTatamiCount, SetTatamiLocation};

use crate::store::tournament::TournamentStore;

/// Contract every concrete action fulfills.
///
/// `redo` must either complete or leave the store untouched; an action whose
/// referent vanished under a concurrent edit completes as a no-op rather
/// than failing. After `redo`, `undo` restores the previous state exactly.
pub trait StoreAction {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError>;

    fn undo(&mut self, store: &mut TournamentStore);

    /// Pristine copy with all undo bookkeeping cleared.
    fn fresh_clone(&self) -> Self
    where
        Self: Sized;

    fn description(&self) -> &'static str;

    /// Whether an interactive caller should confirm before dispatching,
    /// e.g. a redraw of a category that is already fighting.
    fn requires_confirmation(&self, store: &TournamentStore) -> bool {
        let _ = store;
        false
    }
}

macro_rules! define_action {
    ($($variant:ident),+ $(,)?) => {
        /// Tagged union of every concrete action; this is what travels on
        /// the wire and sits in the action logs.
        #[derive(Clone, Debug, Serialize, Deserialize)]
        pub enum Action {
            $($variant($variant),)+
        }

        $(
            impl From<$variant> for Action {
                fn from(action: $variant) -> Self {
                    Action::$variant(action)
                }
            }
        )+

        impl StoreAction for Action {
            fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
                match self {
                    $(Action::$variant(action) => action.redo(store),)+
                }
            }

            fn undo(&mut self, store: &mut TournamentStore) {
                match self {
                    $(Action::$variant(action) => action.undo(store),)+
                }
            }

            fn fresh_clone(&self) -> Self {
                match self {
                    $(Action::$variant(action) => Action::$variant(action.fresh_clone()),)+
                }
            }

            fn description(&self) -> &'static str {
                match self {
                    $(Action::$variant(action) => action.description(),)+
                }
            }

            fn requires_confirmation(&self, store: &TournamentStore) -> bool {
                match self {
                    $(Action::$variant(action) => action.requires_confirmation(store),)+
                }
            }
        }
    };
}

define_action!(
    AddPlayers,
    ErasePlayers,
    ChangePlayersFirstName,
    ChangePlayersLastName,
    ChangePlayersWeight,
    AddCategory,
    EraseCategories,
    ChangeCategoriesName,
    AddPlayersToCategory,
    ErasePlayersFromCategory,
    DrawCategories,
    SetTatamiCount,
    SetTatamiLocation,
    SetMatchStatus,
    SetScoreboardStyle,
);
