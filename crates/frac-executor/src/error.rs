//! Trading client error types.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Client is not authenticated")]
    NotAuthenticated,

    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Client already closed")]
    Closed,
}

pub type ClientResult<T> = Result<T, ClientError>;
