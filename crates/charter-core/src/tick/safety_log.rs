//! Safety event log projection.
//!
//! Records every reflex event the tick engine emits, keeps the halt
//! latch for the delegation gate, and answers the dedup query that makes
//! the tick idempotent at a fixed `now`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// One recorded reflex event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyEvent {
    /// Event type discriminant.
    pub event_type: &'static str,
    /// The synthetic or domain stream it was appended to.
    pub stream_id: String,
    /// The aggregate or scope the observation is about.
    pub subject: String,
    /// Observation instant carried in the payload.
    pub triggered_at: DateTime<Utc>,
}

/// Capacity of the in-memory recent-events ring.
const RECENT_CAP: usize = 1000;

/// Materialized view over reflex events.
#[derive(Debug, Default, Clone)]
pub struct SafetyEventLog {
    recent: Vec<SafetyEvent>,
    last_seen: BTreeMap<(String, String), DateTime<Utc>>,
    delegation_halt_latched: bool,
}

impl SafetyEventLog {
    /// Most recent reflex events, oldest first, up to the ring capacity.
    #[must_use]
    pub fn recent(&self) -> &[SafetyEvent] {
        &self.recent
    }

    /// Whether a delegation concentration halt has ever been observed.
    ///
    /// The latch arms the handler-side concentration gate; the gate
    /// itself re-derives the live condition from the graph.
    #[must_use]
    pub const fn delegation_halt_latched(&self) -> bool {
        self.delegation_halt_latched
    }

    /// Whether an identical observation (same type and subject) was
    /// already recorded for this instant. The tick engine consults this
    /// so a re-run at the same `now` emits nothing new.
    #[must_use]
    pub fn already_emitted(
        &self,
        event_type: &str,
        subject: &str,
        now: DateTime<Utc>,
    ) -> bool {
        self.last_seen
            .get(&(event_type.to_string(), subject.to_string()))
            .is_some_and(|&at| at == now)
    }

    pub(crate) fn record(
        &mut self,
        event_type: &'static str,
        stream_id: &str,
        subject: &str,
        triggered_at: DateTime<Utc>,
    ) {
        if event_type == "DelegationConcentrationHalt" {
            self.delegation_halt_latched = true;
        }
        self.last_seen.insert(
            (event_type.to_string(), subject.to_string()),
            triggered_at,
        );
        if self.recent.len() == RECENT_CAP {
            self.recent.remove(0);
        }
        self.recent.push(SafetyEvent {
            event_type,
            stream_id: stream_id.to_string(),
            subject: subject.to_string(),
            triggered_at,
        });
    }
}
