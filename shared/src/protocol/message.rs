use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::id::ClientActionId;
use crate::protocol::version::ProtocolVersion;
use crate::store::tournament::TournamentStore;

/// Kind bytes carried in the frame header, cross-checked against the
/// decoded body.
pub mod kind {
    pub const HANDSHAKE: u8 = 0;
    pub const SYNC: u8 = 1;
    pub const SYNC_ACK: u8 = 2;
    pub const ACTION: u8 = 3;
    pub const ACTION_ACK: u8 = 4;
    pub const UNDO: u8 = 5;
    pub const UNDO_ACK: u8 = 6;
    pub const CLOCK_SYNC_REQUEST: u8 = 7;
    pub const CLOCK_SYNC: u8 = 8;
    pub const QUIT: u8 = 9;
}

/// Full state transfer: the authority's baseline tournament plus its
/// retained window of confirmed actions, replayed by the receiver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncPayload {
    pub tournament: TournamentStore,
    pub confirmed: Vec<(ClientActionId, Action)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Message {
    Handshake(ProtocolVersion),
    Sync(Box<SyncPayload>),
    SyncAck,
    Action {
        id: ClientActionId,
        action: Action,
    },
    ActionAck {
        id: ClientActionId,
    },
    Undo {
        id: ClientActionId,
    },
    UndoAck {
        id: ClientActionId,
    },
    ClockSyncRequest,
    ClockSync {
        timestamp_ms: i64,
    },
    Quit,
}

impl Message {
    pub fn kind(&self) -> u8 {
        match self {
            Message::Handshake(_) => kind::HANDSHAKE,
            Message::Sync(_) => kind::SYNC,
            Message::SyncAck => kind::SYNC_ACK,
            Message::Action { .. } => kind::ACTION,
            Message::ActionAck { .. } => kind::ACTION_ACK,
            Message::Undo { .. } => kind::UNDO,
            Message::UndoAck { .. } => kind::UNDO_ACK,
            Message::ClockSyncRequest => kind::CLOCK_SYNC_REQUEST,
            Message::ClockSync { .. } => kind::CLOCK_SYNC,
            Message::Quit => kind::QUIT,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Message::Handshake(_) => "handshake",
            Message::Sync(_) => "sync",
            Message::SyncAck => "sync-ack",
            Message::Action { .. } => "action",
            Message::ActionAck { .. } => "action-ack",
            Message::Undo { .. } => "undo",
            Message::UndoAck { .. } => "undo-ack",
            Message::ClockSyncRequest => "clock-sync-request",
            Message::ClockSync { .. } => "clock-sync",
            Message::Quit => "quit",
        }
    }
}

pub(crate) fn is_known_kind(kind_byte: u8) -> bool {
    kind_byte <= kind::QUIT
}
