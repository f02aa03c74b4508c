//! Collaborators the engine reads from
//!
//! The engine never writes. Implementations decide how records and shares
//! are persisted; "no row" is always `Ok(None)`, never an error.

use crate::error::Result;
use crate::types::{Family, ResourceKind, ResourceRecord, Share, UserId};
use async_trait::async_trait;

mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{InMemorySessions, InMemoryStore};
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

/// Ownership and parent lookups
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Get the policy-relevant fields of a record
    async fn find(&self, kind: ResourceKind, id: &str) -> Result<Option<ResourceRecord>>;
}

/// Record-level share lookups
#[async_trait]
pub trait ShareRegistry: Send + Sync {
    /// Share granting `user_id` access to one root, if any
    async fn find_share(&self, family: Family, resource_id: &str, user_id: &str)
        -> Result<Option<Share>>;

    /// Every share on one root
    async fn shares_of(&self, family: Family, resource_id: &str) -> Result<Vec<Share>>;

    /// Every share held by one user within a family
    async fn shared_with(&self, family: Family, user_id: &str) -> Result<Vec<Share>>;
}

/// Session lookup
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    /// Resolve a bearer token to the acting user; `None` when the token is
    /// unknown or revoked
    async fn resolve(&self, token: &str) -> Result<Option<UserId>>;
}
