//! JSON error bodies shared by the API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Per-field validation messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            details: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field_error(mut self, field: &str, detail: impl Into<String>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .entry(field.to_string())
            .or_default()
            .push(detail.into());
        self
    }

    /// Generic 500 body. Internal details are logged, never returned.
    pub fn internal() -> Self {
        Self::new("Internal server error")
            .with_message("An error occurred while processing your request")
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
