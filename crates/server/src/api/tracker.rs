//! Tracker connectivity check.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// Connectivity report for the configured tracker project.
#[derive(Debug, Serialize)]
pub struct TrackerCheckResponse {
    pub project: String,
    pub connected: bool,
    /// Open tickets in the project; absent when the search failed.
    pub open_tickets: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Verify credentials, then count the project's open tickets.
///
/// Returns 503 when the tracker cannot be reached or rejects the credentials.
pub async fn check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<TrackerCheckResponse>) {
    let tickets = state.orchestrator().tickets();
    let project = tickets.project_key().to_string();

    if let Err(e) = tickets.check_connection().await {
        warn!(project = %project, error = %e, "Tracker connection check failed");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(TrackerCheckResponse {
                project,
                connected: false,
                open_tickets: None,
                error: Some(e.to_string()),
            }),
        );
    }

    let (open_tickets, error) = match tickets.search_open_tickets(&project).await {
        Ok(corpus) => (Some(corpus.len()), None),
        Err(e) => {
            warn!(project = %project, error = %e, "Tracker project search failed");
            (None, Some(e.to_string()))
        }
    };

    (
        StatusCode::OK,
        Json(TrackerCheckResponse {
            project,
            connected: true,
            open_tickets,
            error,
        }),
    )
}
