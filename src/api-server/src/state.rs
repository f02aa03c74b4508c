use pantry_authz::{
    AuthRequest, EngineConfig, Grant, InMemoryStore, PolicyEngine, PrincipalResolver,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::records::RecordStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Authorization policy engine
    pub engine: Arc<PolicyEngine>,

    /// Record payloads and the authorization index behind them
    pub records: Arc<RecordStore>,

    /// Bearer token to user resolution
    pub sessions: Arc<dyn PrincipalResolver>,

    /// Server start time for uptime calculation
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

impl AppState {
    /// In-memory state; `sessions` resolves bearer tokens
    pub fn new(config: &ServerConfig, sessions: Arc<dyn PrincipalResolver>) -> Self {
        let index = Arc::new(InMemoryStore::new());
        let engine = PolicyEngine::with_config(
            EngineConfig {
                enable_metrics: config.enable_metrics,
            },
            index.clone(),
            index.clone(),
        );

        Self {
            engine: Arc::new(engine),
            records: Arc::new(RecordStore::new(index)),
            sessions,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Run the policy engine; a denial becomes an [`crate::ApiError::Denied`]
    pub async fn authorize(&self, request: AuthRequest) -> Result<Grant> {
        let decision = self.engine.authorize(&request).await?;
        let grant = decision.into_result()?;
        debug!(principal = %grant.principal, verb = %request.verb, "Request authorized");
        Ok(grant)
    }
}
