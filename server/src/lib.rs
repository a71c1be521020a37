//! # Shiai Server
//!
//! The tournament hub: accepts client connections, validates and confirms
//! their actions in a total order, and fans every confirmation out to all
//! participants. State transfer for joining (or desynchronized) clients is
//! a baseline snapshot plus the retained window of confirmed actions.

pub mod authority;
pub mod config;
pub mod error;
mod participant;
pub mod server;

pub use authority::{Authority, Directive, ParticipantId};
pub use config::ServerConfig;
pub use error::ServerError;
pub use server::{run, Server, ServerCommand};
