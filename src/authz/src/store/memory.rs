//! In-memory collaborators for tests and single-node deployments

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use super::{PrincipalResolver, ResourceRepository, ShareRegistry};
use crate::error::{AuthzError, Result};
use crate::types::{Family, ResourceId, ResourceKind, ResourceRecord, Share, UserId};

type RecordKey = (ResourceKind, ResourceId);
type ShareKey = (Family, ResourceId, UserId);

fn new_id() -> ResourceId {
    Uuid::new_v4().to_string()
}

/// Records and shares held in concurrent maps
///
/// Share records are stored twice: as a [`ResourceRecord`] of the family's
/// share kind (so they can be addressed by id) and as a [`Share`].
#[derive(Default)]
pub struct InMemoryStore {
    records: DashMap<RecordKey, ResourceRecord>,
    shares: DashMap<ResourceId, Share>,
    /// One share per (root, user); value is the share id
    share_keys: DashMap<ShareKey, ResourceId>,
    share_lookups: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a list, recipe or meal plan owned by `owner_id`
    pub fn insert_root(&self, kind: ResourceKind, owner_id: &str) -> ResourceRecord {
        let record = ResourceRecord::root(kind, new_id(), owner_id);
        self.put(record.clone());
        record
    }

    /// Insert a child under `parent_id`. The caller has checked the parent.
    pub fn insert_child(&self, kind: ResourceKind, parent_id: &str) -> ResourceRecord {
        let record = ResourceRecord::child(kind, new_id(), parent_id);
        self.put(record.clone());
        record
    }

    pub fn insert_plan_recipe(&self, plan_id: &str, recipe_id: &str) -> ResourceRecord {
        let record = ResourceRecord::plan_recipe(new_id(), plan_id, recipe_id);
        self.put(record.clone());
        record
    }

    /// Grant `user_id` access to a root. A second share for the same root
    /// and user is a [`AuthzError::Conflict`].
    pub fn insert_share(
        &self,
        family: Family,
        resource_id: &str,
        user_id: &str,
        editable: bool,
    ) -> Result<Share> {
        let key = (family, resource_id.to_string(), user_id.to_string());
        let Entry::Vacant(slot) = self.share_keys.entry(key) else {
            return Err(AuthzError::Conflict(format!(
                "{} {} is already shared with {}",
                family, resource_id, user_id
            )));
        };

        let share = Share {
            id: new_id(),
            family,
            resource_id: resource_id.to_string(),
            user_id: user_id.to_string(),
            editable,
        };
        self.put(ResourceRecord::child(family.share_kind(), share.id.clone(), resource_id));
        self.shares.insert(share.id.clone(), share.clone());
        slot.insert(share.id.clone());
        Ok(share)
    }

    /// Insert or replace a record as-is
    pub fn put(&self, record: ResourceRecord) {
        self.records.insert((record.kind, record.id.clone()), record);
    }

    pub fn record(&self, kind: ResourceKind, id: &str) -> Option<ResourceRecord> {
        self.records
            .get(&(kind, id.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn share(&self, id: &str) -> Option<Share> {
        self.shares.get(id).map(|entry| entry.value().clone())
    }

    /// Flip the editable flag of a share
    pub fn set_editable(&self, share_id: &str, editable: bool) -> Option<Share> {
        let mut share = self.shares.get_mut(share_id)?;
        share.editable = editable;
        Some(share.clone())
    }

    /// Point a plan slot at another recipe
    pub fn set_plan_recipe(&self, id: &str, recipe_id: &str) -> Option<ResourceRecord> {
        let mut record = self
            .records
            .get_mut(&(ResourceKind::PlanRecipe, id.to_string()))?;
        record.recipe_id = Some(recipe_id.to_string());
        Some(record.clone())
    }

    /// Remove a record. Removing a root removes its children and shares;
    /// removing a recipe also removes the plan slots pointing at it.
    /// Returns every removed record, the addressed one first.
    pub fn remove(&self, kind: ResourceKind, id: &str) -> Vec<ResourceRecord> {
        let Some((_, record)) = self.records.remove(&(kind, id.to_string())) else {
            return Vec::new();
        };
        self.forget_share(id);

        let mut removed = vec![record];
        if kind.is_root() {
            let dependents: Vec<RecordKey> = self
                .records
                .iter()
                .filter(|entry| {
                    let child = entry.value();
                    let is_child = child.kind.family() == kind.family()
                        && !child.kind.is_root()
                        && child.parent_id.as_deref() == Some(id);
                    let is_slot = kind == ResourceKind::Recipe
                        && child.kind == ResourceKind::PlanRecipe
                        && child.recipe_id.as_deref() == Some(id);
                    is_child || is_slot
                })
                .map(|entry| entry.key().clone())
                .collect();

            for key in dependents {
                self.forget_share(&key.1);
                if let Some((_, child)) = self.records.remove(&key) {
                    removed.push(child);
                }
            }
        }
        removed
    }

    fn forget_share(&self, id: &str) {
        if let Some((_, share)) = self.shares.remove(id) {
            self.share_keys
                .remove(&(share.family, share.resource_id, share.user_id));
        }
    }

    /// Roots of `kind` owned by `owner_id`
    pub fn owned_by(&self, kind: ResourceKind, owner_id: &str) -> Vec<ResourceRecord> {
        self.records
            .iter()
            .filter(|entry| entry.key().0 == kind && entry.value().is_owned_by(owner_id))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Children of `kind` under one root
    pub fn children_of(&self, kind: ResourceKind, parent_id: &str) -> Vec<ResourceRecord> {
        self.records
            .iter()
            .filter(|entry| {
                entry.key().0 == kind && entry.value().parent_id.as_deref() == Some(parent_id)
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of share lookups served so far
    pub fn share_lookups(&self) -> usize {
        self.share_lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ResourceRepository for InMemoryStore {
    async fn find(&self, kind: ResourceKind, id: &str) -> Result<Option<ResourceRecord>> {
        Ok(self.record(kind, id))
    }
}

#[async_trait]
impl ShareRegistry for InMemoryStore {
    async fn find_share(
        &self,
        family: Family,
        resource_id: &str,
        user_id: &str,
    ) -> Result<Option<Share>> {
        self.share_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .shares
            .iter()
            .find(|entry| {
                let share = entry.value();
                share.family == family && share.resource_id == resource_id && share.user_id == user_id
            })
            .map(|entry| entry.value().clone()))
    }

    async fn shares_of(&self, family: Family, resource_id: &str) -> Result<Vec<Share>> {
        Ok(self
            .shares
            .iter()
            .filter(|entry| entry.value().family == family && entry.value().resource_id == resource_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn shared_with(&self, family: Family, user_id: &str) -> Result<Vec<Share>> {
        Ok(self
            .shares
            .iter()
            .filter(|entry| entry.value().family == family && entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect())
    }
}

/// Opaque bearer tokens mapped to users
#[derive(Default)]
pub struct InMemorySessions {
    sessions: DashMap<String, UserId>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token for `user_id`
    pub fn issue(&self, user_id: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), user_id.to_string());
        token
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }
}

#[async_trait]
impl PrincipalResolver for InMemorySessions {
    async fn resolve(&self, token: &str) -> Result<Option<UserId>> {
        Ok(self.sessions.get(token).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_share_lookup_and_update() {
        let store = InMemoryStore::new();
        let list = store.insert_root(ResourceKind::List, "alice");
        let share = store.insert_share(Family::List, &list.id, "bob", false).unwrap();

        let found = store.find_share(Family::List, &list.id, "bob").await.unwrap();
        assert_eq!(found, Some(share.clone()));
        assert!(store.find_share(Family::Recipe, &list.id, "bob").await.unwrap().is_none());
        assert!(store.find_share(Family::List, &list.id, "carol").await.unwrap().is_none());
        assert_eq!(store.share_lookups(), 3);

        let share_record = store.find(ResourceKind::ListShare, &share.id).await.unwrap().unwrap();
        assert_eq!(share_record.parent_id.as_deref(), Some(list.id.as_str()));

        let updated = store.set_editable(&share.id, true).unwrap();
        assert!(updated.editable);
        assert_eq!(store.shared_with(Family::List, "bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_root_cascades() {
        let store = InMemoryStore::new();
        let recipe = store.insert_root(ResourceKind::Recipe, "alice");
        let other = store.insert_root(ResourceKind::Recipe, "alice");
        store.insert_child(ResourceKind::Ingredient, &recipe.id);
        store.insert_child(ResourceKind::RecipeStep, &recipe.id);
        store.insert_child(ResourceKind::Ingredient, &other.id);
        store.insert_share(Family::Recipe, &recipe.id, "bob", true).unwrap();
        let plan = store.insert_root(ResourceKind::MealPlan, "alice");
        let slot = store.insert_plan_recipe(&plan.id, &recipe.id);
        let kept = store.insert_plan_recipe(&plan.id, &other.id);

        let removed = store.remove(ResourceKind::Recipe, &recipe.id);
        assert_eq!(removed.len(), 5);
        assert!(store.record(ResourceKind::PlanRecipe, &slot.id).is_none());
        assert_eq!(store.children_of(ResourceKind::PlanRecipe, &plan.id), vec![kept]);
        assert!(store.record(ResourceKind::MealPlan, &plan.id).is_some());
        assert_eq!(removed[0].id, recipe.id);
        assert!(store.shares_of(Family::Recipe, &recipe.id).await.unwrap().is_empty());
        assert_eq!(store.children_of(ResourceKind::Ingredient, &other.id).len(), 1);
        assert_eq!(store.owned_by(ResourceKind::Recipe, "alice"), vec![other]);
    }

    #[tokio::test]
    async fn test_one_share_per_root_and_user() {
        let store = InMemoryStore::new();
        let list = store.insert_root(ResourceKind::List, "alice");
        store.insert_share(Family::List, &list.id, "bob", false).unwrap();

        let duplicate = store.insert_share(Family::List, &list.id, "bob", true);
        assert!(matches!(duplicate, Err(AuthzError::Conflict(_))));
        assert_eq!(store.shares_of(Family::List, &list.id).await.unwrap().len(), 1);
        store.insert_share(Family::List, &list.id, "carol", true).unwrap();
    }

    #[tokio::test]
    async fn test_revoked_share_can_be_granted_again() {
        let store = InMemoryStore::new();
        let recipe = store.insert_root(ResourceKind::Recipe, "alice");
        let share = store.insert_share(Family::Recipe, &recipe.id, "bob", false).unwrap();

        store.remove(ResourceKind::RecipeShare, &share.id);
        assert!(store.insert_share(Family::Recipe, &recipe.id, "bob", true).is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_shares_for_one_user() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let plan = store.insert_root(ResourceKind::MealPlan, "alice");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let plan_id = plan.id.clone();
                tokio::spawn(async move {
                    store.insert_share(Family::MealPlan, &plan_id, "bob", true).is_ok()
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.shares_of(Family::MealPlan, &plan.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sessions() {
        let sessions = InMemorySessions::new();
        let token = sessions.issue("alice");

        assert_eq!(sessions.resolve(&token).await.unwrap().as_deref(), Some("alice"));
        assert!(sessions.revoke(&token));
        assert!(sessions.resolve(&token).await.unwrap().is_none());
    }
}
