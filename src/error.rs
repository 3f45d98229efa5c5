//! Error types for the mailbox service

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status this error maps to on the wire.
    pub fn status(&self) -> u16 {
        match self {
            Error::Unauthorized(_) | Error::Forbidden(_) => 403,
            Error::NotFound(_) => 404,
            Error::Validation(_) | Error::Protocol(_) => 400,
            Error::Io(_) | Error::Serialize(_) | Error::Internal(_) => 500,
        }
    }
}
