//! Handler execution context.
//!
//! Handlers are pure functions of `(command, context, projections)`.
//! The context carries everything a handler may read beyond the
//! projections: the idempotency key, the acting identity, the current
//! instant, the safety policy, and the id generator.

use chrono::{DateTime, Utc};

use crate::event::{Event, EventPayload, StreamType};
use crate::ids::IdGenerator;
use crate::policy::SafetyPolicy;

/// Read-only inputs shared by every command handler invocation.
pub struct HandlerContext<'a> {
    /// Idempotency key of the command being handled.
    pub command_id: &'a str,
    /// The acting identity, if any.
    pub actor_id: Option<&'a str>,
    /// The instant the command executes at.
    pub now: DateTime<Utc>,
    /// Safety policy in force.
    pub policy: &'a SafetyPolicy,
    /// Id generator bound to the kernel clock.
    pub ids: &'a IdGenerator,
}

impl HandlerContext<'_> {
    /// Builds an event envelope for this command.
    #[must_use]
    pub fn event(
        &self,
        stream_id: impl Into<String>,
        stream_type: StreamType,
        version: u64,
        payload: EventPayload,
    ) -> Event {
        Event {
            event_id: self.ids.event_id(),
            stream_id: stream_id.into(),
            stream_type,
            version,
            command_id: self.command_id.to_string(),
            occurred_at: self.now,
            actor_id: self.actor_id.map(str::to_string),
            payload,
        }
    }

    /// Builds a follow-on event whose idempotency key derives from the
    /// command's: `{command_id}:{suffix}`. Used when one command emits
    /// more than one event so each persisted row keeps a unique key.
    #[must_use]
    pub fn derived_event(
        &self,
        suffix: &str,
        stream_id: impl Into<String>,
        stream_type: StreamType,
        version: u64,
        payload: EventPayload,
    ) -> Event {
        Event {
            event_id: self.ids.event_id(),
            stream_id: stream_id.into(),
            stream_type,
            version,
            command_id: format!("{}:{suffix}", self.command_id),
            occurred_at: self.now,
            actor_id: self.actor_id.map(str::to_string),
            payload,
        }
    }
}
