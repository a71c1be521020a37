use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::id::{CategoryId, CombinedId};
use crate::position_manager::PositionManager;
use crate::store::category::CategoryStore;
use crate::store::match_store::MatchStatus;
use crate::store::tatami::sequential_group::SequentialBlockGroup;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupStatus {
    #[default]
    NotStarted,
    Started,
    Finished,
}

/// Sequential groups fought in parallel on one tatami, with their matches
/// interleaved round-robin into a single fight order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcurrentBlockGroup {
    groups: PositionManager<SequentialBlockGroup>,
    matches: Vec<CombinedId>,
    status: GroupStatus,
    started: HashSet<CombinedId>,
    finished: HashSet<CombinedId>,
}

impl ConcurrentBlockGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &PositionManager<SequentialBlockGroup> {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut PositionManager<SequentialBlockGroup> {
        &mut self.groups
    }

    pub fn matches(&self) -> &[CombinedId] {
        &self.matches
    }

    pub fn status(&self) -> GroupStatus {
        self.status
    }

    /// Rebuilds the interleaved match list and status sets from the current
    /// category state.
    pub fn recompute(&mut self, categories: &HashMap<CategoryId, CategoryStore>) {
        let mut queues: Vec<VecDeque<CombinedId>> = self
            .groups
            .values()
            .map(|group| group.match_runs(categories).into_iter().flatten().collect())
            .collect();

        // Round-robin merge: one match from each sequential group in turn.
        self.matches.clear();
        loop {
            let mut progressed = false;
            for queue in &mut queues {
                if let Some(combined) = queue.pop_front() {
                    self.matches.push(combined);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        self.started.clear();
        self.finished.clear();
        for combined in &self.matches {
            let status = categories
                .get(&combined.category)
                .and_then(|category| category.get_match(combined.match_id))
                .map(|m| m.status());
            match status {
                Some(MatchStatus::Started) => {
                    self.started.insert(*combined);
                }
                Some(MatchStatus::Finished) => {
                    self.finished.insert(*combined);
                }
                _ => {}
            }
        }
        self.recompute_status();
    }

    /// Incremental status maintenance for a single match transition.
    pub fn update_status(&mut self, combined: CombinedId, status: MatchStatus) {
        self.started.remove(&combined);
        self.finished.remove(&combined);
        match status {
            MatchStatus::NotStarted => {}
            MatchStatus::Started => {
                self.started.insert(combined);
            }
            MatchStatus::Finished => {
                self.finished.insert(combined);
            }
        }
        self.recompute_status();
    }

    fn recompute_status(&mut self) {
        self.status = if !self.matches.is_empty() && self.finished.len() == self.matches.len() {
            GroupStatus::Finished
        } else if !self.started.is_empty() || !self.finished.is_empty() {
            GroupStatus::Started
        } else {
            GroupStatus::NotStarted
        };
    }
}
