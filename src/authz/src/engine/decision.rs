//! Authorization request and decision types

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::policy::messages;
use crate::types::{Family, Permissions, ResourceId, ResourceKind, ResourceRecord, UserId, Verb};

/// What a request acts on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    /// An existing record addressed by id
    Record { kind: ResourceKind, id: ResourceId },

    /// Children of one root (create or enumerate). Root kinds have no
    /// parent: the collection is the principal's own records.
    Collection {
        kind: ResourceKind,
        parent_id: Option<ResourceId>,
    },

    /// Roots of one family shared with `user_id`
    Membership { family: Family, user_id: UserId },
}

impl Target {
    pub fn record(kind: ResourceKind, id: impl Into<ResourceId>) -> Self {
        Target::Record { kind, id: id.into() }
    }

    pub fn children(kind: ResourceKind, parent_id: impl Into<ResourceId>) -> Self {
        Target::Collection {
            kind,
            parent_id: Some(parent_id.into()),
        }
    }

    pub fn own(kind: ResourceKind) -> Self {
        Target::Collection { kind, parent_id: None }
    }

    pub fn membership(family: Family, user_id: impl Into<UserId>) -> Self {
        Target::Membership {
            family,
            user_id: user_id.into(),
        }
    }
}

/// Authorization request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    /// Authenticated principal, `None` when no valid session was presented
    pub principal: Option<UserId>,

    pub verb: Verb,

    pub target: Target,

    /// Id of a referenced root named in the payload (the recipe attached to
    /// a plan slot)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ResourceId>,
}

impl AuthRequest {
    pub fn new(principal: Option<UserId>, verb: Verb, target: Target) -> Self {
        Self {
            principal,
            verb,
            target,
            references: None,
        }
    }

    pub fn with_reference(mut self, id: impl Into<ResourceId>) -> Self {
        self.references = Some(id.into());
        self
    }
}

/// Why a request was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Denial {
    Unauthenticated,
    NotFound { kind: ResourceKind },
    Forbidden { message: &'static str },
}

impl Denial {
    pub fn not_found(kind: ResourceKind) -> Self {
        Denial::NotFound { kind }
    }

    pub fn forbidden(message: &'static str) -> Self {
        Denial::Forbidden { message }
    }

    /// HTTP status code for this denial
    pub fn status(&self) -> u16 {
        match self {
            Denial::Unauthenticated => 401,
            Denial::NotFound { .. } => 404,
            Denial::Forbidden { .. } => 403,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Denial::Unauthenticated => messages::UNAUTHENTICATED.to_string(),
            Denial::NotFound { kind } => format!("{} not found", kind.noun()),
            Denial::Forbidden { message } => (*message).to_string(),
        }
    }

    /// JSON error body: `{status, message}`
    pub fn body(&self) -> serde_json::Value {
        json!({
            "status": self.status(),
            "message": self.message(),
        })
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Context produced by a successful authorization
///
/// Handlers reuse the records resolved here instead of reading them again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub principal: UserId,

    /// Effective permissions on `root`
    pub permissions: Permissions,

    /// Whether the principal owns `root`
    pub is_owner: bool,

    /// Record addressed by a `Target::Record`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<ResourceRecord>,

    /// Root the decision was anchored on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<ResourceRecord>,

    /// Referenced root named in the payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced: Option<ResourceRecord>,
}

impl Grant {
    /// Grant that is not anchored on any record
    pub fn unanchored(principal: impl Into<UserId>) -> Self {
        Self {
            principal: principal.into(),
            permissions: Permissions::NONE,
            is_owner: false,
            target: None,
            root: None,
            referenced: None,
        }
    }
}

/// Authorization decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow(Grant),
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Decision::Allow(_) => None,
            Decision::Deny(denial) => Some(denial),
        }
    }

    pub fn into_result(self) -> std::result::Result<Grant, Denial> {
        match self {
            Decision::Allow(grant) => Ok(grant),
            Decision::Deny(denial) => Err(denial),
        }
    }
}
