use serde::{Deserialize, Serialize};

use crate::actions::error::ActionError;
use crate::actions::StoreAction;
use crate::store::event::StoreEvent;
use crate::store::preferences::ScoreboardStyle;
use crate::store::tournament::TournamentStore;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetScoreboardStyle {
    style: ScoreboardStyle,
    #[serde(skip)]
    old_style: Option<ScoreboardStyle>,
}

impl SetScoreboardStyle {
    pub fn new(style: ScoreboardStyle) -> Self {
        Self {
            style,
            old_style: None,
        }
    }
}

impl StoreAction for SetScoreboardStyle {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        self.old_style = Some(store.preferences().scoreboard_style);
        store.preferences_mut().scoreboard_style = self.style;
        store.record(StoreEvent::PreferencesChanged);
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        if let Some(old) = self.old_style.take() {
            store.preferences_mut().scoreboard_style = old;
            store.record(StoreEvent::PreferencesChanged);
        }
    }

    fn fresh_clone(&self) -> Self {
        Self::new(self.style)
    }

    fn description(&self) -> &'static str {
        "set scoreboard style"
    }
}
