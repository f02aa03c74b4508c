//! HTTP front end for the pantry authorization engine
//!
//! Every `/api/v1` route builds an [`pantry_authz::AuthRequest`], asks the
//! policy engine for a decision and only then touches record payloads.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod records;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, Result};
pub use routes::create_router;
pub use server::Server;
pub use state::AppState;

/// API version
pub const API_VERSION: &str = "v1";
