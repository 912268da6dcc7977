use thiserror::Error;

use super::decision::DenyReason;
use super::hierarchy::ResourceKind;

/// Failures raised by the authorization engine.
///
/// `ParentNotFound` and `TenantMismatch` are kept apart for callers and tests,
/// but the HTTP layer renders both as the same not-found response.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("forbidden: {0}")]
    Forbidden(DenyReason),

    #[error("{kind} not found")]
    ParentNotFound { kind: ResourceKind },

    #[error("{kind} belongs to a different school")]
    TenantMismatch { kind: ResourceKind },

    #[error("invalid resource hierarchy: {0}")]
    Configuration(String),

    #[error("{0}")]
    InvalidTenantTarget(String),

    #[error("principal with role {role} must carry a school id")]
    MissingPrincipalTenant { role: String },

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("parent lookup failed: {0}")]
    Lookup(#[source] anyhow::Error),
}

impl AuthzError {
    pub fn configuration(message: impl Into<String>) -> Self {
        AuthzError::Configuration(message.into())
    }

    /// True for the integrity failures a caller must not be able to tell apart.
    pub fn is_unresolved_reference(&self) -> bool {
        matches!(self, AuthzError::ParentNotFound { .. } | AuthzError::TenantMismatch { .. })
    }
}
