//! Record payload storage
//!
//! The authorization index ([`InMemoryStore`]) knows ownership, parents and
//! shares. This store keeps the opaque JSON payload next to it and renders
//! records for responses.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pantry_authz::{
    Family, Grant, InMemoryStore, ResourceId, ResourceKind, ResourceRecord, ShareRegistry,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::models::{bool_field, parent_field, payload_fields, string_field};

#[derive(Debug, Clone)]
struct Document {
    fields: Map<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document {
    fn new(fields: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    fn merge(&mut self, fields: Map<String, Value>) {
        self.fields.extend(fields);
        self.updated_at = Utc::now();
    }
}

pub struct RecordStore {
    index: Arc<InMemoryStore>,
    documents: DashMap<ResourceId, Document>,
}

impl RecordStore {
    pub fn new(index: Arc<InMemoryStore>) -> Self {
        Self {
            index,
            documents: DashMap::new(),
        }
    }

    /// Authorization index backing this store
    pub fn index(&self) -> &Arc<InMemoryStore> {
        &self.index
    }

    /// Create a record of `kind` under the grant's anchor.
    ///
    /// Roots are owned by the grant's principal. Shares need `userId` and
    /// `editable`; plan recipes need the grant's referenced recipe.
    pub async fn create(
        &self,
        kind: ResourceKind,
        grant: &Grant,
        body: Map<String, Value>,
    ) -> Result<Value> {
        let record = if kind.is_root() {
            self.index.insert_root(kind, &grant.principal)
        } else {
            let root = grant.root.as_ref().ok_or_else(|| {
                ApiError::BadRequest(format!("{} requires a parent", kind.noun()))
            })?;

            if kind.is_share() {
                self.create_share(kind.family(), root, &body)?
            } else if kind == ResourceKind::PlanRecipe {
                let recipe = grant.referenced.as_ref().ok_or_else(|| {
                    ApiError::BadRequest("recipeId is required".to_string())
                })?;
                self.index.insert_plan_recipe(&root.id, &recipe.id)
            } else {
                self.index.insert_child(kind, &root.id)
            }
        };

        debug!(kind = %kind, id = %record.id, "Record created");
        self.documents
            .insert(record.id.clone(), Document::new(payload_fields(body)));
        Ok(self.render(&record))
    }

    fn create_share(
        &self,
        family: Family,
        root: &ResourceRecord,
        body: &Map<String, Value>,
    ) -> Result<ResourceRecord> {
        let user_id = string_field(body, "userId")?
            .ok_or_else(|| ApiError::BadRequest("userId is required".to_string()))?;
        let editable = bool_field(body, "editable")?
            .ok_or_else(|| ApiError::BadRequest("editable is required".to_string()))?;

        if root.is_owned_by(user_id) {
            return Err(ApiError::BadRequest(format!(
                "A {} cannot be shared with its owner",
                family
            )));
        }

        let share = self.index.insert_share(family, &root.id, user_id, editable)?;
        Ok(ResourceRecord::child(family.share_kind(), share.id, root.id.clone()))
    }

    /// Merge a payload into the granted record
    pub fn update(&self, grant: &Grant, body: Map<String, Value>) -> Result<Value> {
        let mut record = grant
            .target
            .clone()
            .ok_or_else(|| ApiError::BadRequest("Update requires a record".to_string()))?;

        if record.kind.is_share() {
            if let Some(editable) = bool_field(&body, "editable")? {
                self.index.set_editable(&record.id, editable);
            }
        }
        if record.kind == ResourceKind::PlanRecipe {
            if let Some(recipe) = &grant.referenced {
                if let Some(updated) = self.index.set_plan_recipe(&record.id, &recipe.id) {
                    record = updated;
                }
            }
        }

        let fields = payload_fields(body);
        self.documents
            .entry(record.id.clone())
            .or_insert_with(|| Document::new(Map::new()))
            .merge(fields);

        Ok(self.render(&record))
    }

    /// Delete a record. Deleting a root deletes its children and shares.
    pub fn delete(&self, record: &ResourceRecord) -> usize {
        let removed = self.index.remove(record.kind, &record.id);
        for gone in &removed {
            self.documents.remove(&gone.id);
        }
        debug!(kind = %record.kind, id = %record.id, removed = removed.len(), "Record deleted");
        removed.len()
    }

    pub fn get(&self, record: &ResourceRecord) -> Value {
        self.render(record)
    }

    /// Children of `kind` under one root
    pub fn children(&self, kind: ResourceKind, parent_id: &str) -> Vec<Value> {
        self.index
            .children_of(kind, parent_id)
            .iter()
            .map(|record| self.render(record))
            .collect()
    }

    /// Roots of `kind` owned by `owner_id`
    pub fn owned(&self, kind: ResourceKind, owner_id: &str) -> Vec<Value> {
        self.index
            .owned_by(kind, owner_id)
            .iter()
            .map(|record| self.render(record))
            .collect()
    }

    /// Roots of one family shared with `user_id`, with the share's `editable` flag
    pub async fn shared_with(&self, family: Family, user_id: &str) -> Result<Vec<Value>> {
        let shares = self.index.shared_with(family, user_id).await?;

        let mut out = Vec::with_capacity(shares.len());
        for share in shares {
            let Some(root) = self.index.record(family.root(), &share.resource_id) else {
                continue;
            };
            let mut rendered = self.render(&root);
            if let Value::Object(map) = &mut rendered {
                map.insert("editable".to_string(), Value::Bool(share.editable));
            }
            out.push(rendered);
        }
        Ok(out)
    }

    fn render(&self, record: &ResourceRecord) -> Value {
        let mut out = Map::new();

        if let Some(doc) = self.documents.get(&record.id) {
            out.extend(doc.fields.clone());
            out.insert("createdAt".to_string(), Value::String(doc.created_at.to_rfc3339()));
            out.insert("updatedAt".to_string(), Value::String(doc.updated_at.to_rfc3339()));
        }

        out.insert("id".to_string(), Value::String(record.id.clone()));
        if let Some(owner) = &record.owner_id {
            out.insert("ownerId".to_string(), Value::String(owner.clone()));
        }
        if let Some(parent) = &record.parent_id {
            out.insert(
                parent_field(record.kind.family()).to_string(),
                Value::String(parent.clone()),
            );
        }
        if let Some(recipe) = &record.recipe_id {
            out.insert("recipeId".to_string(), Value::String(recipe.clone()));
        }
        if record.kind.is_share() {
            if let Some(share) = self.index.share(&record.id) {
                out.insert("userId".to_string(), Value::String(share.user_id));
                out.insert("editable".to_string(), Value::Bool(share.editable));
            }
        }

        Value::Object(out)
    }
}
