//! `SQLite`-backed event store.
//!
//! WAL mode for crash safety and concurrent reads; the schema is
//! embedded at compile time. Appends run in a single transaction:
//! idempotency check, version check, inserts, all or nothing.

// SQLite returns i64 for versions and counts; values are non-negative
// by construction. Mutex poisoning indicates a panic in another thread,
// which is unrecoverable.
#![allow(clippy::cast_sign_loss, clippy::missing_panics_doc)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OpenFlags, Row, params};
use thiserror::Error;

use crate::event::{Event, EventPayload, StreamType};
use crate::ids::EventId;

use super::backend::{AppendOutcome, EventStore};

/// Schema SQL embedded at compile time.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Errors from the event log.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The stream head did not match the expected version.
    #[error("stream {stream_id} version mismatch: expected {expected}, got {actual}")]
    VersionConflict {
        /// The contested stream.
        stream_id: String,
        /// Version the caller expected.
        expected: u64,
        /// Actual head version.
        actual: u64,
    },

    /// The idempotency key was already used on a different stream; the
    /// caller reused a command id for an unrelated command.
    #[error("command {command_id} was already applied to another stream")]
    CommandAlreadyApplied {
        /// The reused idempotency key.
        command_id: String,
    },

    /// Stored data violates the log's invariants.
    #[error("corrupt stream: {details}")]
    Corrupt {
        /// What was found.
        details: String,
    },

    /// Payload serialization failed on write.
    #[error("payload encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Database error from `SQLite`.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error during database operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The append-only event log backed by `SQLite`.
pub struct SqliteEventStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEventStore {
    /// Opens or creates a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be opened or the
    /// schema cannot be initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory store for tests.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be initialized.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Total number of stored events.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub fn count_events(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Number of distinct streams.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub fn count_streams(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 =
            conn.query_row("SELECT COUNT(DISTINCT stream_id) FROM events", [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    fn head(conn: &Connection, stream_id: &str) -> Result<u64, StoreError> {
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(version) FROM events WHERE stream_id = ?1",
            params![stream_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0) as u64)
    }

    fn events_for_command(
        conn: &Connection,
        stream_id: &str,
        command_ids: &[&str],
    ) -> Result<Vec<Event>, StoreError> {
        let mut found = Vec::new();
        for command_id in command_ids {
            let mut stmt = conn.prepare(
                "SELECT event_id, stream_id, stream_type, version, command_id, event_type,
                        occurred_at, actor_id, payload
                 FROM events
                 WHERE command_id = ?1 AND stream_id = ?2
                 ORDER BY version ASC",
            )?;
            let events = stmt
                .query_map(params![command_id, stream_id], row_to_raw)?
                .collect::<Result<Vec<_>, _>>()?;
            for raw in events {
                found.push(decode_row(raw)?);
            }
        }
        found.sort_by_key(|e| e.version);
        Ok(found)
    }

    fn command_known_elsewhere(
        conn: &Connection,
        stream_id: &str,
        command_id: &str,
    ) -> Result<bool, StoreError> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE command_id = ?1 AND stream_id != ?2",
            params![command_id, stream_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl EventStore for SqliteEventStore {
    fn append(
        &self,
        stream_id: &str,
        expected_version: u64,
        events: &[Event],
    ) -> Result<AppendOutcome, StoreError> {
        if events.is_empty() {
            return Ok(AppendOutcome::Appended);
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let command_ids: Vec<&str> = events.iter().map(|e| e.command_id.as_str()).collect();

        // Exactly-once: a batch whose command was already applied to
        // this stream is skipped and the stored events returned.
        let existing = Self::events_for_command(&tx, stream_id, &command_ids)?;
        if !existing.is_empty() {
            tracing::debug!(
                stream_id,
                command_id = command_ids[0],
                "append skipped, command already applied"
            );
            return Ok(AppendOutcome::AlreadyApplied(existing));
        }

        // Reusing an idempotency key across streams is a caller bug,
        // not idempotent success.
        for command_id in &command_ids {
            if Self::command_known_elsewhere(&tx, stream_id, command_id)? {
                return Err(StoreError::CommandAlreadyApplied {
                    command_id: (*command_id).to_string(),
                });
            }
        }

        let actual = Self::head(&tx, stream_id)?;
        if actual != expected_version {
            return Err(StoreError::VersionConflict {
                stream_id: stream_id.to_string(),
                expected: expected_version,
                actual,
            });
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO events (event_id, stream_id, stream_type, version, command_id,
                                     event_type, occurred_at, actor_id, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for event in events {
                stmt.execute(params![
                    event.event_id.to_string(),
                    event.stream_id,
                    event.stream_type.as_str(),
                    i64::try_from(event.version).unwrap_or(i64::MAX),
                    event.command_id,
                    event.event_type(),
                    event
                        .occurred_at
                        .to_rfc3339_opts(SecondsFormat::Micros, true),
                    event.actor_id,
                    event.canonical_payload()?,
                ])?;
            }
        }

        tx.commit()?;
        Ok(AppendOutcome::Appended)
    }

    fn load_stream(&self, stream_id: &str) -> Result<Vec<Event>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT event_id, stream_id, stream_type, version, command_id, event_type,
                    occurred_at, actor_id, payload
             FROM events
             WHERE stream_id = ?1
             ORDER BY version ASC",
        )?;
        let rows = stmt
            .query_map(params![stream_id], row_to_raw)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut events = Vec::with_capacity(rows.len());
        for (i, raw) in rows.into_iter().enumerate() {
            let event = decode_row(raw)?;
            let expected = i as u64 + 1;
            if event.version != expected {
                return Err(StoreError::Corrupt {
                    details: format!(
                        "stream {stream_id} has version {} where {expected} was expected",
                        event.version
                    ),
                });
            }
            events.push(event);
        }
        Ok(events)
    }

    fn load_all(&self) -> Result<Vec<Event>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT event_id, stream_id, stream_type, version, command_id, event_type,
                    occurred_at, actor_id, payload
             FROM events
             ORDER BY rowid ASC",
        )?;
        let rows = stmt
            .query_map([], row_to_raw)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut heads: std::collections::HashMap<String, u64> = std::collections::HashMap::new();
        let mut events = Vec::with_capacity(rows.len());
        for raw in rows {
            let event = decode_row(raw)?;
            let head = heads.entry(event.stream_id.clone()).or_insert(0);
            if event.version != *head + 1 {
                return Err(StoreError::Corrupt {
                    details: format!(
                        "stream {} jumps from version {} to {}",
                        event.stream_id, head, event.version
                    ),
                });
            }
            *head = event.version;
            events.push(event);
        }
        Ok(events)
    }

    fn stream_version(&self, stream_id: &str) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::head(&conn, stream_id)
    }

    fn load_command(&self, command_id: &str) -> Result<Vec<Event>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT event_id, stream_id, stream_type, version, command_id, event_type,
                    occurred_at, actor_id, payload
             FROM events
             WHERE command_id = ?1 OR command_id LIKE ?1 || ':%'
             ORDER BY rowid ASC",
        )?;
        let rows = stmt
            .query_map(params![command_id], row_to_raw)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(decode_row).collect()
    }
}

/// Raw row values before decoding into an [`Event`].
struct RawEvent {
    event_id: String,
    stream_id: String,
    stream_type: String,
    version: i64,
    command_id: String,
    event_type: String,
    occurred_at: String,
    actor_id: Option<String>,
    payload: String,
}

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawEvent> {
    Ok(RawEvent {
        event_id: row.get(0)?,
        stream_id: row.get(1)?,
        stream_type: row.get(2)?,
        version: row.get(3)?,
        command_id: row.get(4)?,
        event_type: row.get(5)?,
        occurred_at: row.get(6)?,
        actor_id: row.get(7)?,
        payload: row.get(8)?,
    })
}

fn decode_row(raw: RawEvent) -> Result<Event, StoreError> {
    let event_id = EventId::parse(&raw.event_id).map_err(|e| StoreError::Corrupt {
        details: format!("bad event id {}: {e}", raw.event_id),
    })?;
    let stream_type = StreamType::parse(&raw.stream_type).ok_or_else(|| StoreError::Corrupt {
        details: format!("unknown stream type {}", raw.stream_type),
    })?;
    let occurred_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&raw.occurred_at)
        .map_err(|e| StoreError::Corrupt {
            details: format!("bad timestamp {}: {e}", raw.occurred_at),
        })?
        .with_timezone(&Utc);
    let payload =
        EventPayload::decode(&raw.event_type, &raw.payload).map_err(|e| StoreError::Corrupt {
            details: e.to_string(),
        })?;

    Ok(Event {
        event_id,
        stream_id: raw.stream_id,
        stream_type,
        version: raw.version as u64,
        command_id: raw.command_id,
        occurred_at,
        actor_id: raw.actor_id,
        payload,
    })
}
