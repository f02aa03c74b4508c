//! Error types for the authorization engine
//!
//! Denials are not errors: they are returned as [`crate::Denial`] values.
//! These variants cover collaborator failures and misconfiguration, which
//! surface as a generic 500 at the HTTP boundary.

use crate::types::{ResourceKind, Verb};
use thiserror::Error;

/// Authorization engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The write would duplicate a unique row
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The rule table has no row for this kind and verb
    #[error("No authorization rule for {verb} on {kind}")]
    NoRule { kind: ResourceKind, verb: Verb },

    /// A collaborator returned inconsistent data
    #[error("Store error: {0}")]
    Store(String),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
