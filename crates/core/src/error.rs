//! Domain error model.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every service in the workspace reports failures through this enum; the HTTP
/// layer maps each variant onto exactly one status code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A single value failed validation (first failure wins).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Several fields failed validation; keyed by field name.
    #[error("validation failed for {} field(s)", .0.len())]
    InvalidFields(BTreeMap<String, String>),

    /// Requested medication names that are not in the catalog.
    #[error("some medications are no longer available: {0:?}")]
    MissingMedications(BTreeSet<String>),

    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation, illegal state transition or stale version.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authenticated, but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Not authenticated (bad credentials, missing or invalid token).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Unexpected failure. The message is for logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Build an [`DomainError::InvalidFields`] from collected `(field, message)` pairs.
    ///
    /// Returns `Ok(())` when nothing was collected. The first message recorded for
    /// a field is kept.
    pub fn check_fields(errors: Vec<(&str, String)>) -> DomainResult<()> {
        if errors.is_empty() {
            return Ok(());
        }
        let mut fields = BTreeMap::new();
        for (field, message) in errors {
            fields.entry(field.to_string()).or_insert(message);
        }
        Err(Self::InvalidFields(fields))
    }
}
