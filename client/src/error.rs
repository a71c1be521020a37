use thiserror::Error;

use shiai_shared::protocol::ProtocolError;

use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("timed out connecting to the server")]
    ConnectTimeout,
}
