//! Authorization rule table
//!
//! One row per (resource kind, verb set). The dispatcher in
//! [`crate::engine`] looks up the row for the request and checks the
//! principal's access to the anchoring root against its [`Requirement`].

use crate::types::{Permissions, ResourceKind, Verb};

/// Forbidden messages returned to clients verbatim
pub mod messages {
    pub const UNAUTHENTICATED: &str = "You must be signed in to continue";

    pub const ACCESS_LIST: &str = "You are not authorized to access this list";
    pub const EDIT_LIST: &str = "You are not authorized to edit this list";
    pub const SHARE_LIST: &str = "You are not authorized to share this list";
    pub const ACCESS_ITEM: &str = "You are not authorized to access this item";

    pub const ACCESS_RECIPE: &str = "You do not have access to this recipe";
    pub const EDIT_RECIPE: &str = "You are not authorized to edit this recipe";
    pub const SHARE_RECIPE: &str = "You are not authorized to share this recipe";

    pub const ACCESS_PLAN: &str = "You are not authorized to access this meal plan";
    pub const EDIT_PLAN: &str = "You are not authorized to edit this meal plan";
    pub const SHARE_PLAN: &str = "You are not authorized to share this meal plan";

    pub const CHANGE_SHARE: &str = "You are not authorized to make changes to this information";
    pub const ACCESS_INFO: &str = "You are not authorized to access this information";
}

/// Access level a rule demands on the anchoring root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any signed-in principal (creating a new root)
    Authenticated,
    /// Root owner only; shares never satisfy it
    Owner,
    /// Owner or any share
    View,
    /// Owner or an editable share
    Edit,
}

impl Requirement {
    pub fn is_satisfied(self, is_owner: bool, permissions: Permissions) -> bool {
        match self {
            Requirement::Authenticated => true,
            Requirement::Owner => is_owner,
            Requirement::View => is_owner || permissions.can_view(),
            Requirement::Edit => is_owner || permissions.can_edit(),
        }
    }

    /// Whether evaluating this requirement for a non-owner needs a share row
    pub fn needs_share(self) -> bool {
        matches!(self, Requirement::View | Requirement::Edit)
    }
}

/// A row of the rule table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub kind: ResourceKind,
    pub verbs: &'static [Verb],
    pub requirement: Requirement,

    /// Message for `Forbidden` denials
    pub forbidden: &'static str,

    /// Another root the request names (by id) that must be viewable
    pub references: Option<ResourceKind>,
}

impl Rule {
    const fn new(
        kind: ResourceKind,
        verbs: &'static [Verb],
        requirement: Requirement,
        forbidden: &'static str,
    ) -> Self {
        Self {
            kind,
            verbs,
            requirement,
            forbidden,
            references: None,
        }
    }

    const fn referencing(self, kind: ResourceKind) -> Self {
        Self {
            references: Some(kind),
            ..self
        }
    }

    pub fn applies_to(&self, kind: ResourceKind, verb: Verb) -> bool {
        self.kind == kind && self.verbs.contains(&verb)
    }
}

const GET: &[Verb] = &[Verb::Get];
const POST: &[Verb] = &[Verb::Post];
const GET_POST: &[Verb] = &[Verb::Get, Verb::Post];
const PUT_DELETE: &[Verb] = &[Verb::Put, Verb::Delete];
const POST_PUT: &[Verb] = &[Verb::Post, Verb::Put];
const DELETE: &[Verb] = &[Verb::Delete];
const MUTATE: &[Verb] = &[Verb::Post, Verb::Put, Verb::Delete];

use messages::*;
use Requirement::{Authenticated, Edit, Owner, View};
use ResourceKind as K;

/// The complete rule table
pub static RULES: &[Rule] = &[
    // Lists
    Rule::new(K::List, GET, View, ACCESS_LIST),
    Rule::new(K::List, POST, Authenticated, ACCESS_LIST),
    Rule::new(K::List, PUT_DELETE, Edit, EDIT_LIST),
    Rule::new(K::Category, GET, View, ACCESS_LIST),
    Rule::new(K::Category, MUTATE, Edit, EDIT_LIST),
    Rule::new(K::ListItem, GET, View, ACCESS_ITEM),
    Rule::new(K::ListItem, MUTATE, Edit, ACCESS_ITEM),
    Rule::new(K::ListShare, GET_POST, Owner, SHARE_LIST),
    Rule::new(K::ListShare, PUT_DELETE, Owner, CHANGE_SHARE),
    // Recipes
    Rule::new(K::Recipe, GET, View, ACCESS_RECIPE),
    Rule::new(K::Recipe, POST, Authenticated, ACCESS_RECIPE),
    Rule::new(K::Recipe, PUT_DELETE, Edit, EDIT_RECIPE),
    Rule::new(K::Ingredient, GET, View, ACCESS_RECIPE),
    Rule::new(K::Ingredient, MUTATE, Edit, EDIT_RECIPE),
    Rule::new(K::RecipeStep, GET, View, ACCESS_RECIPE),
    Rule::new(K::RecipeStep, MUTATE, Edit, EDIT_RECIPE),
    Rule::new(K::RecipeShare, GET_POST, Owner, SHARE_RECIPE),
    Rule::new(K::RecipeShare, PUT_DELETE, Owner, CHANGE_SHARE),
    // Meal plans: no direct sharing of the plan record itself
    Rule::new(K::MealPlan, GET, Owner, ACCESS_PLAN),
    Rule::new(K::MealPlan, POST, Authenticated, ACCESS_PLAN),
    Rule::new(K::MealPlan, PUT_DELETE, Owner, EDIT_PLAN),
    Rule::new(K::PlanShare, GET_POST, Owner, SHARE_PLAN),
    Rule::new(K::PlanShare, PUT_DELETE, Owner, CHANGE_SHARE),
    Rule::new(K::PlanRecipe, GET, View, ACCESS_PLAN),
    Rule::new(K::PlanRecipe, POST_PUT, Edit, EDIT_PLAN).referencing(K::Recipe),
    Rule::new(K::PlanRecipe, DELETE, Edit, EDIT_PLAN),
];

/// Find the rule for a kind and verb
pub fn rule_for(kind: ResourceKind, verb: Verb) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.applies_to(kind, verb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_kind_and_verb_once() {
        for kind in ResourceKind::ALL {
            for verb in Verb::ALL {
                let matching = RULES.iter().filter(|r| r.applies_to(kind, verb)).count();
                assert_eq!(matching, 1, "{verb} on {kind} should have exactly one rule");
            }
        }
    }

    #[test]
    fn test_only_roots_can_be_created_without_a_parent_check() {
        for rule in RULES {
            if rule.requirement == Requirement::Authenticated {
                assert!(rule.kind.is_root());
                assert_eq!(rule.verbs, POST);
            }
        }
    }

    #[test]
    fn test_share_management_is_owner_only() {
        for kind in ResourceKind::ALL.into_iter().filter(|k| k.is_share()) {
            for verb in Verb::ALL {
                assert_eq!(rule_for(kind, verb).unwrap().requirement, Requirement::Owner);
            }
        }
    }

    #[test]
    fn test_requirement_satisfaction() {
        let view = Permissions::VIEW_ONLY;
        let full = Permissions::FULL;
        let none = Permissions::NONE;

        assert!(Requirement::View.is_satisfied(false, view));
        assert!(!Requirement::Edit.is_satisfied(false, view));
        assert!(Requirement::Edit.is_satisfied(false, full));
        assert!(!Requirement::Owner.is_satisfied(false, full));
        assert!(Requirement::Owner.is_satisfied(true, none));
        assert!(Requirement::Edit.is_satisfied(true, none));
        assert!(!Requirement::View.is_satisfied(false, none));
        assert!(Requirement::Authenticated.is_satisfied(false, none));
    }

    #[test]
    fn test_plan_recipe_writes_reference_a_recipe() {
        assert_eq!(rule_for(ResourceKind::PlanRecipe, Verb::Post).unwrap().references, Some(ResourceKind::Recipe));
        assert_eq!(rule_for(ResourceKind::PlanRecipe, Verb::Put).unwrap().references, Some(ResourceKind::Recipe));
        assert_eq!(rule_for(ResourceKind::PlanRecipe, Verb::Delete).unwrap().references, None);
    }
}
