//! Crate-level error type

use thiserror::Error;

use crate::domain::{NotFoundError, Role, ValidationError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("A {role} may not {operation}")]
    Forbidden { role: Role, operation: &'static str },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable token, suitable for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(e) => e.code(),
            Error::NotFound(e) => e.code(),
            Error::Forbidden { .. } => "forbidden",
            Error::Storage(_) => "storage",
            Error::Serialization(_) => "serialization",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
