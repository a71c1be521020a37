use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreboardStyle {
    #[default]
    National,
    International,
}

/// Tournament-wide display preferences. Mutated only through actions so the
/// setting replicates like any other piece of state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesStore {
    pub scoreboard_style: ScoreboardStyle,
}
