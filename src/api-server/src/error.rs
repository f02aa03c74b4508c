use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pantry_authz::{AuthzError, Denial};
use serde_json::json;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Refused by the policy engine
    #[error("{0}")]
    Denied(Denial),

    #[error("Authorization error: {0}")]
    Authz(#[from] AuthzError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Denied(denial) => (
                StatusCode::from_u16(denial.status()).unwrap_or(StatusCode::FORBIDDEN),
                denial.message(),
            ),
            ApiError::Authz(AuthzError::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Authz(AuthzError::Conflict(msg)) => (StatusCode::CONFLICT, msg),
            ApiError::Authz(e) => {
                tracing::error!("Authorization backend failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        ApiError::Denied(denial)
    }
}
