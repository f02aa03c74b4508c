//! Request and response shapes

use pantry_authz::{Family, ResourceKind};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Resource kind addressed by a URL collection segment
pub fn kind_for_collection(name: &str) -> Option<ResourceKind> {
    let kind = match name {
        "lists" => ResourceKind::List,
        "categories" => ResourceKind::Category,
        "items" => ResourceKind::ListItem,
        "list-shares" => ResourceKind::ListShare,
        "recipes" => ResourceKind::Recipe,
        "ingredients" => ResourceKind::Ingredient,
        "steps" => ResourceKind::RecipeStep,
        "recipe-shares" => ResourceKind::RecipeShare,
        "meal-plans" => ResourceKind::MealPlan,
        "plan-shares" => ResourceKind::PlanShare,
        "plan-recipes" => ResourceKind::PlanRecipe,
        _ => return None,
    };
    Some(kind)
}

pub fn parse_collection(name: &str) -> Result<ResourceKind> {
    kind_for_collection(name).ok_or_else(|| ApiError::NotFound(format!("Unknown collection '{}'", name)))
}

/// JSON field naming a record's root
pub fn parent_field(family: Family) -> &'static str {
    match family {
        Family::List => "listId",
        Family::Recipe => "recipeId",
        Family::MealPlan => "planId",
    }
}

/// Fields owned by the server; clients cannot set them through the payload
pub const RESERVED_FIELDS: &[&str] = &[
    "id",
    "ownerId",
    "listId",
    "recipeId",
    "planId",
    "userId",
    "editable",
    "createdAt",
    "updatedAt",
];

/// Parse a request body as a JSON object. An empty body is an empty object.
pub fn parse_body(bytes: &[u8]) -> Result<Map<String, Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::BadRequest("Request body must be a JSON object".to_string())),
        Err(e) => Err(ApiError::BadRequest(format!("Invalid JSON body: {}", e))),
    }
}

/// Opaque payload with server-owned fields removed
pub fn payload_fields(mut body: Map<String, Value>) -> Map<String, Value> {
    for field in RESERVED_FIELDS {
        body.remove(*field);
    }
    body
}

/// Optional string field; present but not a string is a 400
pub fn string_field<'a>(body: &'a Map<String, Value>, field: &str) -> Result<Option<&'a str>> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ApiError::BadRequest(format!("{} must be a string", field))),
    }
}

/// Optional boolean field; present but not a boolean is a 400
pub fn bool_field(body: &Map<String, Value>, field: &str) -> Result<Option<bool>> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ApiError::BadRequest(format!("{} must be a boolean", field))),
    }
}
