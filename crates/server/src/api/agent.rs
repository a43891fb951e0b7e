//! Agent API handler: the HTTP bridge in front of the agent runtime.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use triage_core::AgentError;

use super::error::ErrorResponse;
use crate::metrics::AGENT_REQUESTS;
use crate::state::AppState;

/// Longest accepted request, in characters.
pub const MAX_REQUEST_CHARS: usize = 10_000;

const INVALID_REQUEST: &str = "Invalid request data";

/// Request body for the agent endpoint
#[derive(Debug, Deserialize)]
pub struct AgentRequestBody {
    pub request: Option<String>,
}

/// Response for a handled agent request
#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub output: String,
    pub request_id: String,
    pub status: &'static str,
}

/// Validate and normalise the raw request text.
pub fn validate_request(request: Option<&str>) -> Result<String, ErrorResponse> {
    let Some(request) = request else {
        return Err(ErrorResponse::new(INVALID_REQUEST)
            .with_field_error("request", "This field is required."));
    };
    let trimmed = request.trim();
    if trimmed.is_empty() {
        return Err(ErrorResponse::new(INVALID_REQUEST)
            .with_field_error("request", "Request cannot be empty"));
    }
    if trimmed.chars().count() > MAX_REQUEST_CHARS {
        return Err(ErrorResponse::new(INVALID_REQUEST)
            .with_field_error("request", "Request is too long (max 10KB)"));
    }
    Ok(trimmed.to_string())
}

/// Hand a natural-language request to the agent and persist the exchange.
pub async fn handle_request(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AgentRequestBody>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            AGENT_REQUESTS.with_label_values(&["invalid"]).inc();
            return ErrorResponse::new(INVALID_REQUEST)
                .with_field_error("request", rejection.body_text())
                .into_response_with(StatusCode::BAD_REQUEST);
        }
    };

    let request = match validate_request(body.request.as_deref()) {
        Ok(request) => request,
        Err(e) => {
            AGENT_REQUESTS.with_label_values(&["invalid"]).inc();
            return e.into_response_with(StatusCode::BAD_REQUEST);
        }
    };

    info!(agent = state.agent().name(), chars = request.len(), "Processing agent request");

    let output = match state.agent().invoke(&request).await {
        Ok(output) => output,
        Err(e @ (AgentError::EmptyRequest | AgentError::Unsupported(_))) => {
            warn!(error = %e, "Agent could not interpret request");
            AGENT_REQUESTS.with_label_values(&["unsupported"]).inc();
            return ErrorResponse::new(INVALID_REQUEST)
                .with_field_error("request", e.to_string())
                .into_response_with(StatusCode::BAD_REQUEST);
        }
        Err(e) => {
            error!(error = %e, "Agent request failed");
            AGENT_REQUESTS.with_label_values(&["error"]).inc();
            return ErrorResponse::internal().into_response_with(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let record = match state.records().create(&request, &output.output) {
        Ok(record) => record,
        Err(e) => {
            error!(error = %e, "Failed to store agent record");
            AGENT_REQUESTS.with_label_values(&["error"]).inc();
            return ErrorResponse::internal().into_response_with(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    AGENT_REQUESTS.with_label_values(&["success"]).inc();
    info!(request_id = %record.id, steps = output.steps.len(), "Agent request completed");

    (
        StatusCode::OK,
        Json(AgentResponse {
            output: output.output,
            request_id: record.id,
            status: "success",
        }),
    )
        .into_response()
}
