//! Route definitions for the API server
//!
//! - `/health` and `/metrics` are public
//! - everything under `/api/v1` is authorized by the policy engine

use crate::{handlers, middleware, state::AppState};
use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/users/:user_id/shared/:collection",
            get(handlers::shared_with_user),
        )
        .route(
            "/:collection",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route(
            "/:collection/:id",
            get(handlers::get_record)
                .put(handlers::update_record)
                .patch(handlers::update_record)
                .delete(handlers::delete_record),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api_routes)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
}
