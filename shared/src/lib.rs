//! # Shiai Shared
//! Common functionality shared between the shiai-server & shiai-client
//! crates: tournament state, invertible actions, the optimistic action log,
//! and the wire protocol.

pub mod actions;
pub mod id;
pub mod position_manager;
pub mod protocol;
pub mod store;
pub mod store_manager;

pub use actions::{Action, ActionError, StoreAction};
pub use id::{
    ActionId, CategoryId, ClientActionId, ClientId, CombinedId, IdGenerator, MatchId, PlayerId,
    PositionId, TournamentId,
};
pub use position_manager::{PositionHandle, PositionManager};
pub use protocol::{Message, ProtocolError, ProtocolVersion, SyncPayload};
pub use store::TournamentStore;
pub use store_manager::{StoreManager, StoreManagerError};
