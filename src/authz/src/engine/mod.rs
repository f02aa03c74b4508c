//! Policy engine
//!
//! Resolves the request target, its anchoring root and any referenced root,
//! then checks ownership and share grants against the rule table.

pub mod decision;
pub mod metrics;

pub use decision::{AuthRequest, Decision, Denial, Grant, Target};
pub use metrics::{EngineMetrics, MetricsCollector};

use crate::error::{AuthzError, Result};
use crate::policy::{self, messages, Requirement, Rule};
use crate::store::{ResourceRepository, ShareRegistry};
use crate::types::{Permissions, ResourceKind, ResourceRecord, Verb};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Policy Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { enable_metrics: true }
    }
}

/// Main Policy Engine
///
/// # Pipeline
///
/// ```text
/// principal? ─no─→ Unauthenticated
///     │
/// resolve target → root → referenced root     (absent → NotFound)
///     │
/// owner? ─yes─→ Allow
///     │
/// share lookup → rule requirement              (unmet → Forbidden)
/// ```
///
/// The engine holds no per-request state and is safe to share across tasks.
pub struct PolicyEngine {
    /// Ownership and parent lookups
    resources: Arc<dyn ResourceRepository>,

    /// Share lookups
    shares: Arc<dyn ShareRegistry>,

    metrics: Option<Arc<MetricsCollector>>,
}

impl PolicyEngine {
    pub fn new(resources: Arc<dyn ResourceRepository>, shares: Arc<dyn ShareRegistry>) -> Self {
        Self::with_config(EngineConfig::default(), resources, shares)
    }

    pub fn with_config(
        config: EngineConfig,
        resources: Arc<dyn ResourceRepository>,
        shares: Arc<dyn ShareRegistry>,
    ) -> Self {
        let metrics = config
            .enable_metrics
            .then(|| Arc::new(MetricsCollector::new()));

        info!("PolicyEngine initialized with metrics={}", config.enable_metrics);

        Self {
            resources,
            shares,
            metrics,
        }
    }

    /// Authorize a request
    ///
    /// Returns `Err` only when a collaborator fails; every refusal is a
    /// [`Decision::Deny`].
    pub async fn authorize(&self, request: &AuthRequest) -> Result<Decision> {
        let start = Instant::now();

        debug!(
            "Authorization request: principal={:?}, verb={}, target={:?}",
            request.principal, request.verb, request.target
        );

        let result = self.evaluate(request).await;

        match &result {
            Ok(decision) => {
                match decision {
                    Decision::Allow(_) => debug!("Decision: ALLOW"),
                    Decision::Deny(denial) => info!(
                        "Decision: DENY ({}) for principal={:?}, verb={}",
                        denial, request.principal, request.verb
                    ),
                }
                if let Some(metrics) = &self.metrics {
                    metrics.record_decision(decision, start.elapsed()).await;
                }
            }
            Err(e) => {
                warn!("Authorization failed: {}", e);
                if let Some(metrics) = &self.metrics {
                    metrics.record_error().await;
                }
            }
        }

        result
    }

    /// Get engine metrics
    pub async fn get_metrics(&self) -> Option<EngineMetrics> {
        match &self.metrics {
            Some(metrics) => Some(metrics.get_metrics().await),
            None => None,
        }
    }

    async fn evaluate(&self, request: &AuthRequest) -> Result<Decision> {
        let Some(principal) = request.principal.as_deref() else {
            return Ok(Decision::Deny(Denial::Unauthenticated));
        };

        match &request.target {
            Target::Membership { user_id, .. } => {
                if user_id == principal {
                    Ok(Decision::Allow(Grant::unanchored(principal)))
                } else {
                    Ok(Decision::Deny(Denial::forbidden(messages::ACCESS_INFO)))
                }
            }

            Target::Collection { kind, parent_id: None } => {
                self.evaluate_own_collection(principal, *kind, request.verb)
            }

            Target::Collection {
                kind,
                parent_id: Some(parent_id),
            } => {
                if kind.is_root() {
                    return Err(AuthzError::InvalidInput(format!(
                        "{} collections have no parent",
                        kind
                    )));
                }
                self.evaluate_anchored(principal, request, *kind, None, parent_id)
                    .await
            }

            Target::Record { kind, id } => {
                let Some(record) = self.resources.find(*kind, id).await? else {
                    return Ok(Decision::Deny(Denial::not_found(*kind)));
                };

                let root_id = if kind.is_root() {
                    record.id.clone()
                } else {
                    record.parent_id.clone().ok_or_else(|| {
                        AuthzError::Store(format!("{} {} has no parent", kind, id))
                    })?
                };

                self.evaluate_anchored(principal, request, *kind, Some(record), &root_id)
                    .await
            }
        }
    }

    /// Creating a root or listing one's own roots needs only a session
    fn evaluate_own_collection(
        &self,
        principal: &str,
        kind: ResourceKind,
        verb: Verb,
    ) -> Result<Decision> {
        if !kind.is_root() {
            return Err(AuthzError::InvalidInput(format!(
                "{} collections require a parent id",
                kind
            )));
        }

        let rule = rule(kind, verb)?;
        if rule.requirement == Requirement::Authenticated || verb.is_read() {
            Ok(Decision::Allow(Grant::unanchored(principal)))
        } else {
            Err(AuthzError::InvalidInput(format!(
                "{} is not supported on the {} collection",
                verb, kind
            )))
        }
    }

    async fn evaluate_anchored(
        &self,
        principal: &str,
        request: &AuthRequest,
        kind: ResourceKind,
        target: Option<ResourceRecord>,
        root_id: &str,
    ) -> Result<Decision> {
        let rule = rule(kind, request.verb)?;

        let root = match &target {
            Some(record) if kind.is_root() => record.clone(),
            _ => {
                let root_kind = kind.family().root();
                match self.resources.find(root_kind, root_id).await? {
                    Some(root) => root,
                    None => return Ok(Decision::Deny(Denial::not_found(root_kind))),
                }
            }
        };

        let referenced = match (rule.references, request.references.as_deref()) {
            (Some(_), Some(ref_id)) if is_current_reference(target.as_ref(), ref_id) => None,
            (Some(ref_kind), Some(ref_id)) => match self.resources.find(ref_kind, ref_id).await? {
                Some(record) => Some(record),
                None => return Ok(Decision::Deny(Denial::not_found(ref_kind))),
            },
            _ => None,
        };

        // Existence is settled; only grants remain.
        let is_owner = root.is_owned_by(principal);
        let permissions = if is_owner {
            Permissions::FULL
        } else if rule.requirement.needs_share() {
            self.permissions_on(&root, principal).await?
        } else {
            Permissions::NONE
        };

        if !rule.requirement.is_satisfied(is_owner, permissions) {
            return Ok(Decision::Deny(Denial::forbidden(rule.forbidden)));
        }

        if let Some(referenced) = &referenced {
            if !self.can_view(referenced, principal).await? {
                let view_rule = self::rule(referenced.kind, Verb::Get)?;
                return Ok(Decision::Deny(Denial::forbidden(view_rule.forbidden)));
            }
        }

        Ok(Decision::Allow(Grant {
            principal: principal.to_string(),
            permissions,
            is_owner,
            target,
            root: Some(root),
            referenced,
        }))
    }

    async fn permissions_on(&self, root: &ResourceRecord, principal: &str) -> Result<Permissions> {
        let share = self
            .shares
            .find_share(root.kind.family(), &root.id, principal)
            .await?;
        Ok(Permissions::from_share(share.as_ref()))
    }

    async fn can_view(&self, root: &ResourceRecord, principal: &str) -> Result<bool> {
        if root.is_owned_by(principal) {
            return Ok(true);
        }
        Ok(self.permissions_on(root, principal).await?.can_view())
    }
}

/// Re-sending the recipe a plan slot already points at changes nothing
fn is_current_reference(target: Option<&ResourceRecord>, ref_id: &str) -> bool {
    target.and_then(|record| record.recipe_id.as_deref()) == Some(ref_id)
}

fn rule(kind: ResourceKind, verb: Verb) -> Result<&'static Rule> {
    policy::rule_for(kind, verb).ok_or(AuthzError::NoRule { kind, verb })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn engine(store: &Arc<InMemoryStore>) -> PolicyEngine {
        PolicyEngine::new(store.clone(), store.clone())
    }

    fn request(principal: &str, verb: Verb, target: Target) -> AuthRequest {
        AuthRequest::new(Some(principal.to_string()), verb, target)
    }

    #[tokio::test]
    async fn test_engine_creation() {
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(&store);
        assert!(engine.metrics.is_some());

        let quiet = PolicyEngine::with_config(
            EngineConfig { enable_metrics: false },
            store.clone(),
            store.clone(),
        );
        assert!(quiet.get_metrics().await.is_none());
    }

    #[tokio::test]
    async fn test_grant_carries_resolved_parent() {
        let store = Arc::new(InMemoryStore::new());
        let list = store.insert_root(ResourceKind::List, "alice");
        let category = store.insert_child(ResourceKind::Category, &list.id);

        let decision = engine(&store)
            .authorize(&request("alice", Verb::Put, Target::record(ResourceKind::Category, &category.id)))
            .await
            .unwrap();

        let grant = decision.into_result().unwrap();
        assert!(grant.is_owner);
        assert_eq!(grant.target, Some(category));
        assert_eq!(grant.root, Some(list));
        assert!(grant.permissions.can_edit());
    }

    #[tokio::test]
    async fn test_owner_needs_no_share_lookup() {
        let store = Arc::new(InMemoryStore::new());
        let recipe = store.insert_root(ResourceKind::Recipe, "alice");

        let decision = engine(&store)
            .authorize(&request("alice", Verb::Delete, Target::record(ResourceKind::Recipe, &recipe.id)))
            .await
            .unwrap();

        assert!(decision.is_allowed());
        assert_eq!(store.share_lookups(), 0);
    }

    #[tokio::test]
    async fn test_own_collection_requires_root_kind() {
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(&store);

        let decision = engine
            .authorize(&request("alice", Verb::Post, Target::own(ResourceKind::MealPlan)))
            .await
            .unwrap();
        assert!(decision.is_allowed());

        let err = engine
            .authorize(&request("alice", Verb::Post, Target::own(ResourceKind::Category)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::InvalidInput(_)));

        let err = engine
            .authorize(&request("alice", Verb::Delete, Target::own(ResourceKind::List)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_metrics_track_outcomes() {
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(&store);

        engine
            .authorize(&AuthRequest::new(None, Verb::Get, Target::own(ResourceKind::List)))
            .await
            .unwrap();
        engine
            .authorize(&request("alice", Verb::Get, Target::record(ResourceKind::List, "missing")))
            .await
            .unwrap();

        let metrics = engine.get_metrics().await.unwrap();
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.unauthenticated, 1);
        assert_eq!(metrics.not_found, 1);
    }
}
