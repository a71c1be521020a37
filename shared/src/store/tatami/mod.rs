//! The scheduling hierarchy: tatamis hold concurrent block groups, which
//! hold sequential block groups, which hold ordered category-phase blocks.
//! Every level is a position-managed container so locations stay valid
//! across concurrent edits.

mod concurrent_group;
mod location;
mod sequential_group;
mod tatami;
mod tatami_list;

pub use concurrent_group::{ConcurrentBlockGroup, GroupStatus};
pub use location::{
    BlockLocation, ConcurrentGroupLocation, SequentialGroupLocation, TatamiLocation,
};
pub use sequential_group::{Block, SequentialBlockGroup, EXPECTED_MATCH_DURATION_MS};
pub use tatami::TatamiStore;
pub use tatami_list::TatamiList;
