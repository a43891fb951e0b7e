//! Direct triage trigger for operators, bypassing the agent.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::info;
use triage_core::{TriageReport, TriageTool};

use crate::state::AppState;

/// Run triage for one ticket and return the full report.
///
/// The run is cancelled if the server begins shutting down.
pub async fn run_triage(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Json<TriageReport> {
    let key = TriageTool::normalize_key(&key);
    let cancel = state.shutdown_token().child_token();

    let report = state.orchestrator().run(&key, cancel).await;
    info!(
        ticket = %key,
        run_id = %report.run_id,
        state = report.final_state.as_str(),
        "Triage triggered over HTTP finished"
    );
    Json(report)
}
