//! # Pantry Authorization Engine
//!
//! Ownership and share based authorization for shopping lists, recipes and
//! meal plans.
//!
//! ## Features
//!
//! - **Single rule table** keyed by resource kind and HTTP verb
//! - **One dispatcher** that resolves targets, parents and referenced recipes
//!   before any share lookup, so `NotFound` always precedes `Forbidden`
//! - **Typed grants** carrying the resolved records to downstream handlers
//! - **Pluggable collaborators** for resource, share and principal lookups
//!   (in-memory and PostgreSQL implementations)
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pantry_authz::{AuthRequest, InMemoryStore, PolicyEngine, ResourceKind, Target, Verb};
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(InMemoryStore::new());
//! let list = store.insert_root(ResourceKind::List, "alice");
//!
//! let engine = PolicyEngine::new(store.clone(), store.clone());
//! let request = AuthRequest::new(
//!     Some("alice".to_string()),
//!     Verb::Put,
//!     Target::record(ResourceKind::List, &list.id),
//! );
//!
//! let decision = engine.authorize(&request).await.unwrap();
//! assert!(decision.is_allowed());
//! # });
//! ```

pub mod types;
pub mod policy;
pub mod engine;
pub mod store;
pub mod error;

// Re-export commonly used types
pub use types::{Family, Permissions, ResourceId, ResourceKind, ResourceRecord, Share, UserId, Verb};
pub use policy::{messages, Requirement, Rule};
pub use engine::{
    AuthRequest, Decision, Denial, EngineConfig, EngineMetrics, Grant, MetricsCollector,
    PolicyEngine, Target,
};
pub use store::{InMemorySessions, InMemoryStore, PrincipalResolver, ResourceRepository, ShareRegistry};
#[cfg(feature = "postgres")]
pub use store::PostgresStore;
pub use error::{AuthzError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
