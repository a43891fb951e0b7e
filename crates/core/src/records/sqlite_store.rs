//! SQLite-backed record store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::warn;

use super::{AgentRecord, RecordError, RecordStore};

/// SQLite-backed record store.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, RecordError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, RecordError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RecordError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS agent_records (
                id TEXT PRIMARY KEY,
                request TEXT NOT NULL,
                response TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_agent_records_created_at ON agent_records(created_at DESC);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RecordError> {
        self.conn
            .lock()
            .map_err(|_| RecordError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<AgentRecord> {
        let created_at: String = row.get(3)?;
        let updated_at: String = row.get(4)?;
        let id: String = row.get(0)?;

        Ok(AgentRecord {
            created_at: parse_timestamp(&id, "created_at", &created_at),
            updated_at: parse_timestamp(&id, "updated_at", &updated_at),
            id,
            request: row.get(1)?,
            response: row.get(2)?,
        })
    }
}

/// Unparseable timestamps load as the Unix epoch.
fn parse_timestamp(id: &str, column: &str, value: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            warn!(record_id = %id, column, value, error = %e, "Corrupt timestamp in agent record");
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

impl RecordStore for SqliteRecordStore {
    fn create(&self, request: &str, response: &str) -> Result<AgentRecord, RecordError> {
        let conn = self.conn()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO agent_records (id, request, response, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            params![id, request, response, now.to_rfc3339(), now.to_rfc3339()],
        )?;

        Ok(AgentRecord {
            id,
            request: request.to_string(),
            response: response.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<AgentRecord>, RecordError> {
        let conn = self.conn()?;

        let result = conn.query_row(
            "SELECT id, request, response, created_at, updated_at FROM agent_records WHERE id = ?",
            params![id],
            Self::row_to_record,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, limit: u32, offset: u32) -> Result<Vec<AgentRecord>, RecordError> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, request, response, created_at, updated_at FROM agent_records ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
        )?;
        let rows = stmt.query_map(params![limit, offset], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn count(&self) -> Result<u64, RecordError> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM agent_records", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}
