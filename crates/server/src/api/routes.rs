use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{agent, handlers, middleware::metrics_middleware, records, tracker, triage};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Agent
        .route("/agent", post(agent::handle_request))
        // Records
        .route("/records", get(records::list_records))
        .route("/records/{id}", get(records::get_record))
        // Triage
        .route("/triage/{key}", post(triage::run_triage))
        // Tracker
        .route("/tracker/check", get(tracker::check))
        .with_state(state);

    // The chat front end is served from a different origin.
    Router::new().nest("/api/v1", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(middleware::from_fn(metrics_middleware)),
    )
}
