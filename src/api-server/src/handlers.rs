use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use pantry_authz::{AuthRequest, ResourceKind, Target, Verb};
use serde_json::{json, Map, Value};

use crate::{
    auth::Principal,
    error::{ApiError, Result},
    models::{parent_field, parse_body, parse_collection, HealthResponse},
    state::AppState,
};

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Decision metrics in Prometheus text format
pub async fn metrics(State(state): State<AppState>) -> Result<Response> {
    let metrics = state
        .engine
        .get_metrics()
        .await
        .ok_or_else(|| ApiError::NotFound("Metrics are disabled".to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics.to_prometheus(),
    )
        .into_response())
}

/// Value of `field` from the body, falling back to the query string
fn lookup(body: Option<&Map<String, Value>>, query: &HashMap<String, String>, field: &str) -> Option<String> {
    body.and_then(|b| b.get(field))
        .and_then(Value::as_str)
        .map(String::from)
        .or_else(|| query.get(field).cloned())
}

fn referenced_recipe(
    kind: ResourceKind,
    body: Option<&Map<String, Value>>,
    query: &HashMap<String, String>,
) -> Option<String> {
    if kind != ResourceKind::PlanRecipe {
        return None;
    }
    lookup(body, query, "recipeId")
}

fn with_reference(request: AuthRequest, reference: Option<String>) -> AuthRequest {
    match reference {
        Some(id) => request.with_reference(id),
        None => request,
    }
}

/// `POST /api/v1/:collection`
///
/// The body is decoded before authorization only to find the parent and any
/// referenced recipe; a malformed body is reported after the decision.
pub async fn create_record(
    State(state): State<AppState>,
    Principal(principal): Principal,
    Path(collection): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    bytes: Bytes,
) -> Result<Json<Value>> {
    let kind = parse_collection(&collection)?;
    let parsed = parse_body(&bytes);
    let fields = parsed.as_ref().ok();

    let parent_id = if kind.is_root() {
        None
    } else {
        lookup(fields, &query, parent_field(kind.family()))
    };
    let request = with_reference(
        AuthRequest::new(principal, Verb::Post, Target::Collection { kind, parent_id }),
        referenced_recipe(kind, fields, &query),
    );

    let grant = state.authorize(request).await?;
    let body = parsed?;

    let created = state.records.create(kind, &grant, body).await?;
    Ok(Json(created))
}

/// `GET /api/v1/:collection`
///
/// Roots list the caller's own records; children need the parent id in the
/// query string.
pub async fn list_records(
    State(state): State<AppState>,
    Principal(principal): Principal,
    Path(collection): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Value>>> {
    let kind = parse_collection(&collection)?;
    let parent_id = if kind.is_root() {
        None
    } else {
        query.get(parent_field(kind.family())).cloned()
    };

    let grant = state
        .authorize(AuthRequest::new(
            principal,
            Verb::Get,
            Target::Collection { kind, parent_id },
        ))
        .await?;

    let records = match &grant.root {
        Some(root) => state.records.children(kind, &root.id),
        None => state.records.owned(kind, &grant.principal),
    };
    Ok(Json(records))
}

/// `GET /api/v1/:collection/:id`
pub async fn get_record(
    State(state): State<AppState>,
    Principal(principal): Principal,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let kind = parse_collection(&collection)?;
    let grant = state
        .authorize(AuthRequest::new(principal, Verb::Get, Target::record(kind, id)))
        .await?;

    let record = grant
        .target
        .as_ref()
        .ok_or_else(|| ApiError::NotFound(kind.noun().to_string()))?;
    Ok(Json(state.records.get(record)))
}

/// `PUT /api/v1/:collection/:id`
pub async fn update_record(
    State(state): State<AppState>,
    Principal(principal): Principal,
    Path((collection, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    bytes: Bytes,
) -> Result<Json<Value>> {
    let kind = parse_collection(&collection)?;
    let parsed = parse_body(&bytes);

    let request = with_reference(
        AuthRequest::new(principal, Verb::Put, Target::record(kind, id)),
        referenced_recipe(kind, parsed.as_ref().ok(), &query),
    );
    let grant = state.authorize(request).await?;

    let updated = state.records.update(&grant, parsed?)?;
    Ok(Json(updated))
}

/// `DELETE /api/v1/:collection/:id`
pub async fn delete_record(
    State(state): State<AppState>,
    Principal(principal): Principal,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let kind = parse_collection(&collection)?;
    let grant = state
        .authorize(AuthRequest::new(principal, Verb::Delete, Target::record(kind, id)))
        .await?;

    let record = grant
        .target
        .as_ref()
        .ok_or_else(|| ApiError::NotFound(kind.noun().to_string()))?;
    let removed = state.records.delete(record);

    Ok(Json(json!({
        "id": record.id,
        "deleted": removed,
    })))
}

/// `GET /api/v1/users/:user_id/shared/:collection`
pub async fn shared_with_user(
    State(state): State<AppState>,
    Principal(principal): Principal,
    Path((user_id, collection)): Path<(String, String)>,
) -> Result<Json<Vec<Value>>> {
    let kind = parse_collection(&collection)?;
    if !kind.is_root() {
        return Err(ApiError::NotFound(format!(
            "Nothing is shared as '{}'",
            collection
        )));
    }

    let family = kind.family();
    state
        .authorize(AuthRequest::new(
            principal,
            Verb::Get,
            Target::membership(family, &user_id),
        ))
        .await?;

    let shared = state.records.shared_with(family, &user_id).await?;
    Ok(Json(shared))
}
