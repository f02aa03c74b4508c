//! Decision counters and latency for engine observability

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::decision::{Decision, Denial};

/// Engine counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineMetrics {
    /// Total number of authorization requests
    pub total_requests: u64,

    pub allowed: u64,
    pub unauthenticated: u64,
    pub not_found: u64,
    pub forbidden: u64,

    /// Collaborator failures (surface as 500)
    pub error_count: u64,

    /// Average latency
    pub avg_latency_ms: f64,
}

impl EngineMetrics {
    pub fn denied(&self) -> u64 {
        self.unauthenticated + self.not_found + self.forbidden
    }

    /// Calculate allow rate
    pub fn allow_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.allowed as f64 / self.total_requests as f64
        }
    }

    /// Render in Prometheus text exposition format
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP pantry_authz_decisions_total Authorization decisions by outcome\n\
             # TYPE pantry_authz_decisions_total counter\n\
             pantry_authz_decisions_total{{outcome=\"allow\"}} {}\n\
             pantry_authz_decisions_total{{outcome=\"unauthenticated\"}} {}\n\
             pantry_authz_decisions_total{{outcome=\"not_found\"}} {}\n\
             pantry_authz_decisions_total{{outcome=\"forbidden\"}} {}\n\
             # HELP pantry_authz_errors_total Collaborator failures during authorization\n\
             # TYPE pantry_authz_errors_total counter\n\
             pantry_authz_errors_total {}\n\
             # HELP pantry_authz_latency_avg_ms Average decision latency in milliseconds\n\
             # TYPE pantry_authz_latency_avg_ms gauge\n\
             pantry_authz_latency_avg_ms {:.3}\n",
            self.allowed,
            self.unauthenticated,
            self.not_found,
            self.forbidden,
            self.error_count,
            self.avg_latency_ms,
        )
    }
}

/// Metrics collector shared by concurrent requests
pub struct MetricsCollector {
    metrics: Arc<RwLock<EngineMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(EngineMetrics::default())),
        }
    }

    /// Record an authorization decision and its latency
    pub async fn record_decision(&self, decision: &Decision, latency: Duration) {
        let mut metrics = self.metrics.write().await;
        metrics.total_requests += 1;

        match decision {
            Decision::Allow(_) => metrics.allowed += 1,
            Decision::Deny(Denial::Unauthenticated) => metrics.unauthenticated += 1,
            Decision::Deny(Denial::NotFound { .. }) => metrics.not_found += 1,
            Decision::Deny(Denial::Forbidden { .. }) => metrics.forbidden += 1,
        }

        // Running average over all decisions
        let latency_ms = latency.as_secs_f64() * 1000.0;
        let n = metrics.total_requests as f64;
        metrics.avg_latency_ms += (latency_ms - metrics.avg_latency_ms) / n;
    }

    /// Record an error
    pub async fn record_error(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.error_count += 1;
    }

    /// Get current metrics snapshot
    pub async fn get_metrics(&self) -> EngineMetrics {
        self.metrics.read().await.clone()
    }

    /// Reset all metrics
    pub async fn reset(&self) {
        *self.metrics.write().await = EngineMetrics::default();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
