//! Router assembly for the chatgraph HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS and tracing middleware layers.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax. CORS is permissive (the
/// platform relay and operator tooling call from various origins).
/// TraceLayer provides request-level logging via tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        // Platform event webhook
        .route("/events", post(handlers::events::handle_event))
        // Bulk reconciliation
        .route("/team/sync", post(handlers::sync::team_sync))
        .route("/graph/load", post(handlers::sync::load_graph))
        // Suggestions
        .route(
            "/users/{user_id}/suggestions",
            get(handlers::suggestions::channel_suggestions),
        )
        // Scheduler status
        .route("/jobs", get(handlers::jobs::list_jobs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
