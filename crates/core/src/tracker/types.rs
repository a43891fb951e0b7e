//! Types shared by tracker clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Snapshot of a tracker issue, as seen by the triage pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Tracker-assigned key, e.g. `PROJ-123`.
    pub key: String,
    /// Summary and description joined by a space.
    pub text: String,
}

impl Ticket {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }

    /// Build the text the way every client must: `"{summary} {description}"`, trimmed.
    pub fn from_fields(
        key: impl Into<String>,
        summary: Option<&str>,
        description: Option<&str>,
    ) -> Self {
        let text = format!(
            "{} {}",
            summary.unwrap_or_default(),
            description.unwrap_or_default()
        );
        Self::new(key, text.trim())
    }
}

/// Open tickets of a project keyed by ticket key.
pub type TicketCorpus = HashMap<String, String>;

/// Errors from tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Tracker API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse tracker response: {0}")]
    Parse(String),

    #[error("Tracker request timed out")]
    Timeout,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl TrackerError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TrackerError::Http(_) | TrackerError::Timeout => true,
            TrackerError::Api { status, .. } => *status == 429 || *status >= 500,
            TrackerError::Parse(_) | TrackerError::NotFound(_) => false,
        }
    }
}

/// Operations the triage pipeline needs from an issue tracker.
#[async_trait]
pub trait TicketClient: Send + Sync {
    /// Project whose open tickets make up the corpus.
    fn project_key(&self) -> &str;

    /// All unresolved tickets of `project`.
    async fn search_open_tickets(&self, project: &str) -> Result<TicketCorpus, TrackerError>;

    /// Fetch a single ticket. A ticket that does not exist is `Ok(None)`.
    async fn get_ticket(&self, key: &str) -> Result<Option<Ticket>, TrackerError>;

    /// Create a link of type `relation` between two tickets.
    /// Returns whether the tracker acknowledged creation.
    async fn link(
        &self,
        primary: &str,
        secondary: &str,
        relation: &str,
    ) -> Result<bool, TrackerError>;

    /// Post a comment. Returns whether the tracker acknowledged creation.
    async fn add_comment(&self, key: &str, text: &str) -> Result<bool, TrackerError>;

    /// Verify credentials and reachability.
    async fn check_connection(&self) -> Result<(), TrackerError>;
}
