use serde::{Deserialize, Serialize};

use crate::actions::error::ActionError;
use crate::actions::StoreAction;
use crate::id::CombinedId;
use crate::store::event::StoreEvent;
use crate::store::match_store::MatchStatus;
use crate::store::tournament::TournamentStore;

/// Transitions a match between statuses, keeping category tallies and
/// scheduling-group status caches current. No-op when a concurrent redraw
/// has replaced the match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetMatchStatus {
    combined: CombinedId,
    status: MatchStatus,
    #[serde(skip)]
    old_status: Option<MatchStatus>,
}

impl SetMatchStatus {
    pub fn new(combined: CombinedId, status: MatchStatus) -> Self {
        Self {
            combined,
            status,
            old_status: None,
        }
    }

    fn apply(&self, store: &mut TournamentStore, status: MatchStatus) -> Option<MatchStatus> {
        let category = store.get_category_mut(self.combined.category)?;
        let m = category.get_match_mut(self.combined.match_id)?;
        let old = m.status();
        if old == status {
            return None;
        }
        let match_type = m.match_type();
        m.set_status(status);
        category.transition_status(match_type, old, status);
        let location = category.location(match_type);

        store.record(StoreEvent::MatchChanged(self.combined));
        if let Some(location) = location {
            store
                .tatamis_mut()
                .update_match_status(location, self.combined, status);
        }
        Some(old)
    }
}

impl StoreAction for SetMatchStatus {
    fn redo(&mut self, store: &mut TournamentStore) -> Result<(), ActionError> {
        self.old_status = self.apply(store, self.status);
        Ok(())
    }

    fn undo(&mut self, store: &mut TournamentStore) {
        if let Some(old) = self.old_status.take() {
            self.apply(store, old);
        }
    }

    fn fresh_clone(&self) -> Self {
        Self::new(self.combined, self.status)
    }

    fn description(&self) -> &'static str {
        "set match status"
    }
}
