use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::id::{CategoryId, MatchId, PlayerId};
use crate::store::match_store::{MatchStatus, MatchStore, MatchType};
use crate::store::tatami::BlockLocation;

/// Per-phase tally of match statuses, kept incrementally so scheduling
/// queries never scan the match list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStatus {
    pub not_started: usize,
    pub started: usize,
    pub finished: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryStore {
    id: CategoryId,
    name: String,
    players: HashSet<PlayerId>,
    matches: Vec<MatchStore>,
    match_index: HashMap<MatchId, usize>,
    locations: [Option<BlockLocation>; 2],
    statuses: [CategoryStatus; 2],
    draw_disabled: bool,
}

impl CategoryStore {
    pub fn new(id: CategoryId, name: String) -> Self {
        Self {
            id,
            name,
            players: HashSet::new(),
            matches: Vec::new(),
            match_index: HashMap::new(),
            locations: [None, None],
            statuses: [CategoryStatus::default(), CategoryStatus::default()],
            draw_disabled: false,
        }
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn players(&self) -> &HashSet<PlayerId> {
        &self.players
    }

    pub fn contains_player(&self, id: PlayerId) -> bool {
        self.players.contains(&id)
    }

    pub fn add_player(&mut self, id: PlayerId) {
        self.players.insert(id);
    }

    pub fn erase_player(&mut self, id: PlayerId) {
        self.players.remove(&id);
    }

    pub fn matches(&self) -> &[MatchStore] {
        &self.matches
    }

    pub fn get_match(&self, id: MatchId) -> Option<&MatchStore> {
        self.match_index.get(&id).map(|index| &self.matches[*index])
    }

    pub fn get_match_mut(&mut self, id: MatchId) -> Option<&mut MatchStore> {
        let index = *self.match_index.get(&id)?;
        self.matches.get_mut(index)
    }

    /// Number of matches belonging to the given phase.
    pub fn match_count(&self, match_type: MatchType) -> usize {
        self.matches
            .iter()
            .filter(|m| m.match_type() == match_type)
            .count()
    }

    /// Replaces the whole match list, rebuilding the index and status
    /// tallies. Returns the previous list so a draw can be undone.
    pub fn replace_matches(&mut self, matches: Vec<MatchStore>) -> Vec<MatchStore> {
        let old = std::mem::replace(&mut self.matches, matches);
        self.match_index = self
            .matches
            .iter()
            .enumerate()
            .map(|(index, m)| (m.id(), index))
            .collect();
        self.recompute_statuses();
        old
    }

    fn recompute_statuses(&mut self) {
        self.statuses = [CategoryStatus::default(), CategoryStatus::default()];
        for m in &self.matches {
            let status = &mut self.statuses[m.match_type().index()];
            match m.status() {
                MatchStatus::NotStarted => status.not_started += 1,
                MatchStatus::Started => status.started += 1,
                MatchStatus::Finished => status.finished += 1,
            }
        }
    }

    /// Moves one match between status tallies.
    pub fn transition_status(
        &mut self,
        match_type: MatchType,
        from: MatchStatus,
        to: MatchStatus,
    ) {
        let status = &mut self.statuses[match_type.index()];
        match from {
            MatchStatus::NotStarted => status.not_started = status.not_started.saturating_sub(1),
            MatchStatus::Started => status.started = status.started.saturating_sub(1),
            MatchStatus::Finished => status.finished = status.finished.saturating_sub(1),
        }
        match to {
            MatchStatus::NotStarted => status.not_started += 1,
            MatchStatus::Started => status.started += 1,
            MatchStatus::Finished => status.finished += 1,
        }
    }

    pub fn status(&self, match_type: MatchType) -> CategoryStatus {
        self.statuses[match_type.index()]
    }

    /// A phase counts as started once any of its matches left NotStarted.
    pub fn is_started(&self, match_type: MatchType) -> bool {
        let status = self.status(match_type);
        status.started > 0 || status.finished > 0
    }

    pub fn location(&self, match_type: MatchType) -> Option<BlockLocation> {
        self.locations[match_type.index()]
    }

    pub fn set_location(&mut self, match_type: MatchType, location: Option<BlockLocation>) {
        self.locations[match_type.index()] = location;
    }

    pub fn draw_disabled(&self) -> bool {
        self.draw_disabled
    }

    pub fn set_draw_disabled(&mut self, disabled: bool) {
        self.draw_disabled = disabled;
    }
}
