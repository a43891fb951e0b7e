//! Record types and the storage trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters kept in list previews.
pub const PREVIEW_CHARS: usize = 100;

/// Error type for record storage.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for RecordError {
    fn from(e: rusqlite::Error) -> Self {
        RecordError::Database(e.to_string())
    }
}

/// One agent exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub request: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Condensed form of a record used in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: String,
    pub request_preview: String,
    pub response_preview: String,
    pub created_at: DateTime<Utc>,
}

impl From<&AgentRecord> for RecordSummary {
    fn from(record: &AgentRecord) -> Self {
        Self {
            id: record.id.clone(),
            request_preview: preview(&record.request),
            response_preview: preview(&record.response),
            created_at: record.created_at,
        }
    }
}

/// First [`PREVIEW_CHARS`] characters, with `...` appended when cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Storage for agent records. Listings are newest first.
pub trait RecordStore: Send + Sync {
    fn create(&self, request: &str, response: &str) -> Result<AgentRecord, RecordError>;

    fn get(&self, id: &str) -> Result<Option<AgentRecord>, RecordError>;

    fn list(&self, limit: u32, offset: u32) -> Result<Vec<AgentRecord>, RecordError>;

    fn count(&self) -> Result<u64, RecordError>;
}
