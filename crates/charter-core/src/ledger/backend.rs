//! Event store trait abstraction.
//!
//! The storage engine behind the log is a seam: the kernel talks to
//! this trait only, so a different engine can sit behind it as long as
//! it preserves the append/replay semantics.

use crate::event::Event;

use super::store::StoreError;

/// Result of an append attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// Every event in the batch persisted.
    Appended,
    /// The command was already applied to this stream. Carries the
    /// previously stored events; to the caller this is success, not an
    /// error (exactly-once via the idempotency key).
    AlreadyApplied(Vec<Event>),
}

/// An append-only, versioned event log.
///
/// Contracts:
/// - `append` is atomic: all events persist with versions
///   `expected_version + 1 ..= expected_version + n`, or nothing is
///   written.
/// - `load_stream` returns a stream's events in version order.
/// - `load_all` returns every event in insertion order; replay uses the
///   same order.
pub trait EventStore: Send + Sync {
    /// Appends a batch to a stream under optimistic locking.
    ///
    /// # Errors
    ///
    /// [`StoreError::VersionConflict`] when the stream head is not
    /// `expected_version`; [`StoreError::CommandAlreadyApplied`] when
    /// the idempotency key was used on a *different* stream; storage
    /// errors otherwise.
    fn append(
        &self,
        stream_id: &str,
        expected_version: u64,
        events: &[Event],
    ) -> Result<AppendOutcome, StoreError>;

    /// Loads one stream in version order.
    ///
    /// # Errors
    ///
    /// [`StoreError::Corrupt`] when versions are not contiguous from 1,
    /// or a row fails to decode.
    fn load_stream(&self, stream_id: &str) -> Result<Vec<Event>, StoreError>;

    /// Loads every event in insertion order (the replay order).
    ///
    /// # Errors
    ///
    /// [`StoreError::Corrupt`] when per-stream ordering is violated or
    /// a row fails to decode.
    fn load_all(&self) -> Result<Vec<Event>, StoreError>;

    /// Current head version of a stream; 0 when the stream is empty.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    fn stream_version(&self, stream_id: &str) -> Result<u64, StoreError>;

    /// Loads the events a command produced, including follow-on events
    /// carrying a `{command_id}:suffix` derived key. Empty when the
    /// command was never applied. This is how the façade makes replays
    /// of an already-applied command return the original result even
    /// when the aggregate has since moved on.
    ///
    /// # Errors
    ///
    /// [`StoreError::Corrupt`] when a row fails to decode.
    fn load_command(&self, command_id: &str) -> Result<Vec<Event>, StoreError>;
}
