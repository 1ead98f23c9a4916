//! Identifier generation.
//!
//! Event ids are 128-bit and time-sortable: the high-order bits carry a
//! millisecond timestamp taken from the injected [`Clock`], the remainder
//! is random (UUIDv7 layout). Command and correlation ids are opaque
//! UUIDv4 values drawn from the operating system's CSPRNG; weak PRNGs are
//! deliberately absent because procurement predictability is an attack.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::{NoContext, Timestamp, Uuid};

use crate::clock::Clock;

/// A time-sortable 128-bit event identifier.
///
/// Persisted and exchanged in the canonical hyphenated form via
/// [`std::fmt::Display`] and [`EventId::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(Uuid);

impl EventId {
    /// Mints an event id whose timestamp bits come from `occurred_at`.
    ///
    /// Ids minted within the same millisecond differ in their random
    /// suffix and still sort within that millisecond bucket.
    #[must_use]
    pub fn at(occurred_at: DateTime<Utc>) -> Self {
        let seconds = u64::try_from(occurred_at.timestamp()).unwrap_or(0);
        let ts = Timestamp::from_unix(NoContext, seconds, occurred_at.timestamp_subsec_nanos());
        Self(Uuid::new_v7(ts))
    }

    /// Parses an event id from its canonical hyphenated form.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error for malformed input.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Generates ids that embed timestamps from an injected clock.
///
/// The generator is the only id source handlers see, which keeps the
/// clock the single seam for time in replay tests.
#[derive(Clone)]
pub struct IdGenerator {
    clock: Arc<dyn Clock>,
}

impl IdGenerator {
    /// Creates a generator over the given clock.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Mints a time-sortable event id at the clock's current instant.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        EventId::at(self.clock.now())
    }

    /// Mints a prefixed aggregate id, e.g. `law-0193…`.
    #[must_use]
    pub fn aggregate_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.event_id())
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator").finish_non_exhaustive()
    }
}

/// Generates a fresh command id (idempotency key) from the OS CSPRNG.
#[must_use]
pub fn command_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates an opaque correlation id for cross-referencing logs.
#[must_use]
pub fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::clock::VirtualClock;

    #[test]
    fn event_ids_sort_by_time() {
        let clock = Arc::new(VirtualClock::new());
        let ids = IdGenerator::new(clock.clone());

        let earlier = ids.event_id();
        clock.advance_seconds(1);
        let later = ids.event_id();

        assert!(earlier < later);
    }

    #[test]
    fn event_ids_are_unique_within_a_millisecond() {
        let clock = Arc::new(VirtualClock::new());
        let ids = IdGenerator::new(clock);

        let a = ids.event_id();
        let b = ids.event_id();
        assert_ne!(a, b);
    }

    #[test]
    fn event_id_round_trips_through_display() {
        let id = EventId::at(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        let parsed = EventId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn aggregate_ids_carry_their_prefix() {
        let ids = IdGenerator::new(Arc::new(VirtualClock::new()));
        assert!(ids.aggregate_id("ws").starts_with("ws-"));
    }

    #[test]
    fn command_ids_differ() {
        assert_ne!(command_id(), command_id());
    }
}
