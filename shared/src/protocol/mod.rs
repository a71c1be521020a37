//! Wire protocol: message set, framing codec, version negotiation, and
//! clock-offset estimation.

pub mod clock;
pub mod codec;
pub mod error;
pub mod message;
pub mod version;

pub use codec::{read_message, write_message, HEADER_LEN, MAX_BODY_LEN};
pub use error::ProtocolError;
pub use message::{Message, SyncPayload};
pub use version::{ProtocolVersion, PROTOCOL_VERSION};
