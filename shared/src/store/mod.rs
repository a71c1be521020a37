//! Tournament state: players, categories, matches, the tatami scheduling
//! hierarchy, and display preferences, rooted in [`TournamentStore`].

pub mod category;
pub mod event;
pub mod match_store;
pub mod player;
pub mod preferences;
pub mod tatami;
pub mod tournament;

pub use category::{CategoryStatus, CategoryStore};
pub use event::StoreEvent;
pub use match_store::{MatchStatus, MatchStore, MatchType};
pub use player::{Country, PlayerFields, PlayerStore, Weight};
pub use preferences::{PreferencesStore, ScoreboardStyle};
pub use tournament::TournamentStore;
