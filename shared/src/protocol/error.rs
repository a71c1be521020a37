use thiserror::Error;

use crate::protocol::version::ProtocolVersion;

/// Transport-level failure. Every variant is fatal to the connection; the
/// peer must reconnect and resync.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Header kind byte names no known message.
    #[error("unknown message kind {0:#04x}")]
    UnknownKind(u8),

    /// Declared body length exceeds the framing limit.
    #[error("message body of {0} bytes exceeds the limit")]
    BodyTooLarge(u32),

    #[error("failed to encode message")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode message body")]
    Decode(#[source] bincode::Error),

    /// Body decoded to a different message than the header promised.
    #[error("header kind {header:#04x} does not match body kind {body:#04x}")]
    KindMismatch { header: u8, body: u8 },

    #[error("peer protocol version {theirs} is incompatible with {ours}")]
    IncompatibleVersion {
        ours: ProtocolVersion,
        theirs: ProtocolVersion,
    },
}
