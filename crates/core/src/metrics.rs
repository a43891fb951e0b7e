//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Triage runs (outcome, duration)
//! - Relatedness checks, links and comments
//! - LLM and tracker requests

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Triage Metrics
// =============================================================================

/// Triage runs by final state.
pub static TRIAGE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("triage_runs_total", "Total triage runs"),
        &["state"], // "done", "aborted", "cancelled"
    )
    .unwrap()
});

/// Triage run duration in seconds.
pub static TRIAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("triage_run_duration_seconds", "Duration of triage runs")
            .buckets(vec![1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["state"],
    )
    .unwrap()
});

/// Relatedness checks by verdict.
pub static RELATEDNESS_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "triage_relatedness_checks_total",
            "Pairwise relatedness checks performed",
        ),
        &["verdict"], // "related", "unrelated", "cancelled"
    )
    .unwrap()
});

/// Link attempts by result.
pub static LINKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("triage_links_total", "Ticket link attempts"),
        &["result"], // "created", "rejected", "error"
    )
    .unwrap()
});

/// Metadata comment attempts by result.
pub static COMMENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("triage_comments_total", "Metadata comment attempts"),
        &["result"], // "posted", "rejected", "error", "skipped"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// LLM task requests by task and result.
pub static LLM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("triage_llm_requests_total", "LLM task requests"),
        &["task", "result"],
    )
    .unwrap()
});

/// LLM task latency in seconds.
pub static LLM_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "triage_llm_request_duration_seconds",
            "Latency of LLM task requests",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["task"],
    )
    .unwrap()
});

/// Tracker requests by operation and result.
pub static TRACKER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("triage_tracker_requests_total", "Issue tracker requests"),
        &["operation", "result"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TRIAGE_RUNS.clone()),
        Box::new(TRIAGE_DURATION.clone()),
        Box::new(RELATEDNESS_CHECKS.clone()),
        Box::new(LINKS.clone()),
        Box::new(COMMENTS.clone()),
        Box::new(LLM_REQUESTS.clone()),
        Box::new(LLM_REQUEST_DURATION.clone()),
        Box::new(TRACKER_REQUESTS.clone()),
    ]
}
