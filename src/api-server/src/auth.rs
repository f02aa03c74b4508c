//! Bearer token authentication

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use pantry_authz::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Caller resolved from `Authorization: Bearer <token>`
///
/// Missing or unknown tokens yield `Principal(None)`; the policy engine turns
/// that into a 401 so every route reports it the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub Option<UserId>);

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Principal(None));
        };

        let user = state.sessions.resolve(token).await?;
        if user.is_none() {
            tracing::debug!("Unknown session token");
        }
        Ok(Principal(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
