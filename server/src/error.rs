use thiserror::Error;

use shiai_shared::protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The participant broke the session flow; the connection is dropped.
    #[error("unexpected {0} message from participant")]
    UnexpectedMessage(&'static str),
}
