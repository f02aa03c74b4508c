//! Core authorization types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique user identifier
pub type UserId = String;

/// Unique resource identifier
pub type ResourceId = String;

/// Resource family: a root kind together with its dependent kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    List,
    Recipe,
    MealPlan,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::List, Family::Recipe, Family::MealPlan];

    /// Kind that carries the owner for this family
    pub fn root(self) -> ResourceKind {
        match self {
            Family::List => ResourceKind::List,
            Family::Recipe => ResourceKind::Recipe,
            Family::MealPlan => ResourceKind::MealPlan,
        }
    }

    /// Kind of the share records granting access to this family's roots
    pub fn share_kind(self) -> ResourceKind {
        match self {
            Family::List => ResourceKind::ListShare,
            Family::Recipe => ResourceKind::RecipeShare,
            Family::MealPlan => ResourceKind::PlanShare,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Family::List => "list",
            Family::Recipe => "recipe",
            Family::MealPlan => "meal_plan",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every persisted resource kind the engine knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    List,
    Category,
    ListItem,
    ListShare,
    Recipe,
    Ingredient,
    RecipeStep,
    RecipeShare,
    MealPlan,
    PlanShare,
    PlanRecipe,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::List,
        ResourceKind::Category,
        ResourceKind::ListItem,
        ResourceKind::ListShare,
        ResourceKind::Recipe,
        ResourceKind::Ingredient,
        ResourceKind::RecipeStep,
        ResourceKind::RecipeShare,
        ResourceKind::MealPlan,
        ResourceKind::PlanShare,
        ResourceKind::PlanRecipe,
    ];

    pub fn family(self) -> Family {
        match self {
            ResourceKind::List
            | ResourceKind::Category
            | ResourceKind::ListItem
            | ResourceKind::ListShare => Family::List,
            ResourceKind::Recipe
            | ResourceKind::Ingredient
            | ResourceKind::RecipeStep
            | ResourceKind::RecipeShare => Family::Recipe,
            ResourceKind::MealPlan | ResourceKind::PlanShare | ResourceKind::PlanRecipe => {
                Family::MealPlan
            }
        }
    }

    /// Roots carry an owner; every other kind has exactly one root parent
    pub fn is_root(self) -> bool {
        self.family().root() == self
    }

    pub fn is_share(self) -> bool {
        self.family().share_kind() == self
    }

    /// Noun used in "<Resource> not found" messages
    pub fn noun(self) -> &'static str {
        match self {
            ResourceKind::List => "List",
            ResourceKind::Category => "Category",
            ResourceKind::ListItem => "Item",
            ResourceKind::ListShare => "List share",
            ResourceKind::Recipe => "Recipe",
            ResourceKind::Ingredient => "Ingredient",
            ResourceKind::RecipeStep => "Step",
            ResourceKind::RecipeShare => "Recipe share",
            ResourceKind::MealPlan => "Meal plan",
            ResourceKind::PlanShare => "Plan share",
            ResourceKind::PlanRecipe => "Plan recipe",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::List => "list",
            ResourceKind::Category => "category",
            ResourceKind::ListItem => "list_item",
            ResourceKind::ListShare => "list_share",
            ResourceKind::Recipe => "recipe",
            ResourceKind::Ingredient => "ingredient",
            ResourceKind::RecipeStep => "recipe_step",
            ResourceKind::RecipeShare => "recipe_share",
            ResourceKind::MealPlan => "meal_plan",
            ResourceKind::PlanShare => "plan_share",
            ResourceKind::PlanRecipe => "plan_recipe",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP verb of the request being authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 4] = [Verb::Get, Verb::Post, Verb::Put, Verb::Delete];

    /// Parse an HTTP method name. PATCH is treated as PUT.
    pub fn from_method(method: &str) -> Option<Self> {
        match method.to_ascii_uppercase().as_str() {
            "GET" | "HEAD" => Some(Verb::Get),
            "POST" => Some(Verb::Post),
            "PUT" | "PATCH" => Some(Verb::Put),
            "DELETE" => Some(Verb::Delete),
            _ => None,
        }
    }

    pub fn is_read(self) -> bool {
        self == Verb::Get
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability record derived from ownership or a share row
///
/// An editable share implies view; a missing share grants nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    view: bool,
    edit: bool,
}

impl Permissions {
    /// No share row
    pub const NONE: Permissions = Permissions { view: false, edit: false };

    /// Owners and editable shares
    pub const FULL: Permissions = Permissions { view: true, edit: true };

    /// View-only share
    pub const VIEW_ONLY: Permissions = Permissions { view: true, edit: false };

    pub fn from_share(share: Option<&Share>) -> Self {
        match share {
            Some(share) if share.editable => Self::FULL,
            Some(_) => Self::VIEW_ONLY,
            None => Self::NONE,
        }
    }

    pub fn can_view(&self) -> bool {
        self.view
    }

    pub fn can_edit(&self) -> bool {
        self.edit
    }
}

/// Record-level share granting a non-owner access to one root resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Share record identifier
    pub id: ResourceId,

    /// Family of the shared root
    pub family: Family,

    /// Shared list, recipe or meal plan
    pub resource_id: ResourceId,

    /// Grantee
    pub user_id: UserId,

    /// Whether the grantee may edit as well as view
    pub editable: bool,
}

impl Share {
    pub fn permissions(&self) -> Permissions {
        Permissions::from_share(Some(self))
    }
}

/// Policy-relevant projection of a persisted resource
///
/// Roots carry `owner_id`; children carry `parent_id` (always a root of the
/// same family). Plan recipes additionally carry the attached `recipe_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub id: ResourceId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ResourceId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<ResourceId>,
}

impl ResourceRecord {
    /// Create a root record (list, recipe, meal plan)
    pub fn root(kind: ResourceKind, id: impl Into<ResourceId>, owner_id: impl Into<UserId>) -> Self {
        Self {
            kind,
            id: id.into(),
            owner_id: Some(owner_id.into()),
            parent_id: None,
            recipe_id: None,
        }
    }

    /// Create a child record pointing at its root
    pub fn child(kind: ResourceKind, id: impl Into<ResourceId>, parent_id: impl Into<ResourceId>) -> Self {
        Self {
            kind,
            id: id.into(),
            owner_id: None,
            parent_id: Some(parent_id.into()),
            recipe_id: None,
        }
    }

    /// Create a plan-recipe join record
    pub fn plan_recipe(
        id: impl Into<ResourceId>,
        plan_id: impl Into<ResourceId>,
        recipe_id: impl Into<ResourceId>,
    ) -> Self {
        Self {
            recipe_id: Some(recipe_id.into()),
            ..Self::child(ResourceKind::PlanRecipe, id, plan_id)
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }
}
