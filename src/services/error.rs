use std::collections::HashMap;
use thiserror::Error;

use crate::auth::{JwtError, PasswordError};
use crate::authz::AuthzError;
use crate::database::DatabaseError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl ServiceError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{} not found", what))
    }

    /// Maps a store-level unique violation to a conflict with `message`;
    /// other errors pass through.
    pub fn conflict_on_duplicate(message: &'static str) -> impl Fn(DatabaseError) -> ServiceError {
        move |err| match err {
            DatabaseError::UniqueViolation(key) => {
                tracing::warn!("Write rejected by unique key {}", key);
                ServiceError::Conflict(message.to_string())
            }
            other => ServiceError::Database(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
