use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::{CategoryId, CombinedId};
use crate::store::category::CategoryStore;
use crate::store::match_store::MatchType;

/// A schedulable unit: one phase of one category.
pub type Block = (CategoryId, MatchType);

/// Flat estimate used for duration recomputation; rulesets, which would
/// refine this per match, are out of scope.
pub const EXPECTED_MATCH_DURATION_MS: u64 = 5 * 60 * 1000;

/// Ordered run of blocks fought back-to-back on one tatami.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SequentialBlockGroup {
    blocks: Vec<Block>,
    expected_duration_ms: u64,
}

impl SequentialBlockGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains_block(&self, block: Block) -> bool {
        self.blocks.contains(&block)
    }

    /// Inserts at `index`, clamped to the current length.
    pub fn add_block(&mut self, index: usize, block: Block) {
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, block);
    }

    /// No-op if the block is not present.
    pub fn erase_block(&mut self, block: Block) {
        self.blocks.retain(|b| *b != block);
    }

    pub fn expected_duration_ms(&self) -> u64 {
        self.expected_duration_ms
    }

    pub fn recompute(&mut self, categories: &HashMap<CategoryId, CategoryStore>) {
        self.expected_duration_ms = self
            .blocks
            .iter()
            .filter_map(|(category_id, match_type)| {
                categories
                    .get(category_id)
                    .map(|category| category.match_count(*match_type) as u64)
            })
            .sum::<u64>()
            * EXPECTED_MATCH_DURATION_MS;
    }

    /// Match ids of this group's blocks in fight order, one run per block.
    pub fn match_runs(
        &self,
        categories: &HashMap<CategoryId, CategoryStore>,
    ) -> Vec<Vec<CombinedId>> {
        self.blocks
            .iter()
            .map(|(category_id, match_type)| {
                categories
                    .get(category_id)
                    .map(|category| {
                        category
                            .matches()
                            .iter()
                            .filter(|m| m.match_type() == *match_type)
                            .map(|m| CombinedId::new(*category_id, m.id()))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect()
    }
}
