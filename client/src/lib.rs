//! # Shiai Client
//! The satellite side of tournament synchronization: a transport-free
//! session state machine plus a tokio driver that pumps it against a TCP
//! connection to the hub.

pub mod client;
pub mod config;
pub mod error;
pub mod session;

pub use client::{run, Command};
pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{Session, SessionError, SessionEvent, SessionState};
