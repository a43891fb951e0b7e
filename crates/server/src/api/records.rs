//! Record API handlers (audit trail of agent exchanges).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use triage_core::RecordSummary;

use super::error::ErrorResponse;
use crate::state::AppState;

/// Default page size for record listings
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum allowed page size for record listings
const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters for listing records
#[derive(Debug, Deserialize)]
pub struct ListRecordsParams {
    /// 1-based page number
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListRecordsParams {
    /// Clamped `(page, page_size)`.
    pub fn resolve(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }
}

/// Response for listing records
#[derive(Debug, Serialize)]
pub struct ListRecordsResponse {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<RecordSummary>,
}

/// List stored records, newest first
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRecordsParams>,
) -> Response {
    let (page, page_size) = params.resolve();
    let offset = (page - 1).saturating_mul(page_size);

    let listed = state
        .records()
        .count()
        .and_then(|count| Ok((count, state.records().list(page_size, offset)?)));

    match listed {
        Ok((count, records)) => Json(ListRecordsResponse {
            count,
            page,
            page_size,
            results: records.iter().map(RecordSummary::from).collect(),
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list records");
            ErrorResponse::internal().into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a single record with full request and response text
pub async fn get_record(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.records().get(&id) {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => {
            ErrorResponse::new("Record not found").into_response_with(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            error!(record_id = %id, error = %e, "Failed to load record");
            ErrorResponse::internal().into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
