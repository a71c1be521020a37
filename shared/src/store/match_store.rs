use serde::{Deserialize, Serialize};

use crate::id::{MatchId, PlayerId};

/// Phase a match belongs to. Categories keep separate schedules, statuses
/// and tatami locations per phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchType {
    Elimination,
    Final,
}

impl MatchType {
    pub const ALL: [MatchType; 2] = [MatchType::Elimination, MatchType::Final];

    /// Index into per-phase arrays.
    pub fn index(self) -> usize {
        match self {
            MatchType::Elimination => 0,
            MatchType::Final => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    #[default]
    NotStarted,
    Started,
    Finished,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchStore {
    id: MatchId,
    match_type: MatchType,
    status: MatchStatus,
    white: Option<PlayerId>,
    blue: Option<PlayerId>,
}

impl MatchStore {
    pub fn new(
        id: MatchId,
        match_type: MatchType,
        white: Option<PlayerId>,
        blue: Option<PlayerId>,
    ) -> Self {
        Self {
            id,
            match_type,
            status: MatchStatus::NotStarted,
            white,
            blue,
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn set_status(&mut self, status: MatchStatus) {
        self.status = status;
    }

    pub fn white(&self) -> Option<PlayerId> {
        self.white
    }

    pub fn blue(&self) -> Option<PlayerId> {
        self.blue
    }
}
