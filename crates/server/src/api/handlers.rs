use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use triage_core::SanitizedConfig;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

/// Service name reported by the health probe.
pub const SERVICE_NAME: &str = "jira-triage-agent";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub database: &'static str,
    pub agent: &'static str,
}

/// Liveness plus a database probe. Returns 503 when the record store is
/// unreachable.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database_ok = match state.records().count() {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "Health check database probe failed");
            false
        }
    };
    let agent_ok = !state.agent().name().is_empty();
    let healthy = database_ok && agent_ok;

    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        database: if database_ok { "connected" } else { "disconnected" },
        agent: if agent_ok { "available" } else { "unavailable" },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
