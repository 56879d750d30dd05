//! API routes and handlers

mod classify;
mod health;
mod model;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState, cors_enabled: bool) -> Router {
    let ml_routes = Router::new()
        .route("/food", post(classify::classify_food))
        .route("/health", get(health::health_check))
        .route("/model", get(model::model_info));

    let mut router = Router::new()
        .nest("/ml", ml_routes)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}
