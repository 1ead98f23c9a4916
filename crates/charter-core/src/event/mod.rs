//! The event envelope and the exhaustive payload union.
//!
//! Every change in the system is one of the payload variants below.
//! Projections dispatch on the variant exhaustively; an event type the
//! build does not know is a replay-stopping corruption, never a no-op;
//! that is what catches schema drift.

pub(crate) mod canonical;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::budget::{
    AllocationAdjusted, BudgetActivated, BudgetClosed, BudgetCreated, ExpenditureApproved,
    ExpenditureRejected,
};
use crate::delegation::{
    DecisionRightDelegated, DelegationExpired, DelegationRenewed, DelegationRevoked,
};
use crate::ids::EventId;
use crate::law::{
    LawActivated, LawArchived, LawCreated, LawReviewCompleted, LawReviewTriggered,
};
use crate::procurement::{
    ContractAwarded, SupplierRegistered, TenderAwarded, TenderClosed, TenderCreated,
    TenderEvaluated, TenderOpened,
};
use crate::tick::{
    BudgetBalanceViolationDetected, BudgetOverspendDetected, DelegationConcentrationHalt,
    DelegationConcentrationWarning, SupplierConcentrationHalt, SupplierConcentrationWarning,
    SystemTick, TransparencyEscalated,
};
use crate::workspace::{WorkspaceArchived, WorkspaceCreated};

pub use canonical::to_canonical_string;

/// The aggregate family a stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    /// Workspace aggregates.
    Workspace,
    /// Law aggregates.
    Law,
    /// Delegation aggregates.
    Delegation,
    /// Budget aggregates.
    Budget,
    /// Tender aggregates.
    Tender,
    /// Supplier aggregates.
    Supplier,
    /// Synthetic streams owned by the tick engine.
    System,
}

impl StreamType {
    /// Stable name stored in the log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Law => "law",
            Self::Delegation => "delegation",
            Self::Budget => "budget",
            Self::Tender => "tender",
            Self::Supplier => "supplier",
            Self::System => "system",
        }
    }

    /// Parses a stored stream type.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "workspace" => Some(Self::Workspace),
            "law" => Some(Self::Law),
            "delegation" => Some(Self::Delegation),
            "budget" => Some(Self::Budget),
            "tender" => Some(Self::Tender),
            "supplier" => Some(Self::Supplier),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// Failure decoding a stored payload back into a typed event.
#[derive(Debug, Error)]
pub enum PayloadDecodeError {
    /// The stored event type has no corresponding variant.
    #[error("unknown event type {0}")]
    UnknownEventType(String),

    /// The payload bytes do not deserialize into the variant's shape.
    #[error("malformed payload for {event_type}: {source}")]
    Malformed {
        /// The event type whose payload failed.
        event_type: String,
        /// The underlying serde error.
        source: serde_json::Error,
    },
}

macro_rules! event_payloads {
    ($( $variant:ident ),+ $(,)?) => {
        /// Union of every domain and reflex event payload.
        ///
        /// Deliberately not `non_exhaustive`: consumers must handle
        /// every variant, so a new event type is a compile error at
        /// each dispatch site instead of a silently skipped arm.
        #[derive(Debug, Clone, PartialEq)]
        pub enum EventPayload {
            $(
                #[doc = concat!("`", stringify!($variant), "` payload.")]
                $variant($variant),
            )+
        }

        impl EventPayload {
            /// The event type discriminant stored alongside the payload.
            #[must_use]
            pub const fn event_type(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => stringify!($variant), )+
                }
            }

            /// Serializes the payload to a JSON value.
            ///
            /// # Errors
            ///
            /// Propagates the underlying serde error.
            pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
                match self {
                    $( Self::$variant(payload) => serde_json::to_value(payload), )+
                }
            }

            /// Decodes a stored `(event_type, payload)` pair.
            ///
            /// # Errors
            ///
            /// [`PayloadDecodeError::UnknownEventType`] for a
            /// discriminant this build does not know, or
            /// [`PayloadDecodeError::Malformed`] when the payload does
            /// not match the variant's shape.
            pub fn decode(
                event_type: &str,
                payload: &str,
            ) -> Result<Self, PayloadDecodeError> {
                match event_type {
                    $(
                        stringify!($variant) => serde_json::from_str(payload)
                            .map(Self::$variant)
                            .map_err(|source| PayloadDecodeError::Malformed {
                                event_type: event_type.to_string(),
                                source,
                            }),
                    )+
                    other => Err(PayloadDecodeError::UnknownEventType(other.to_string())),
                }
            }
        }
    };
}

event_payloads!(
    // Workspace
    WorkspaceCreated,
    WorkspaceArchived,
    // Delegation
    DecisionRightDelegated,
    DelegationRenewed,
    DelegationRevoked,
    DelegationExpired,
    // Law
    LawCreated,
    LawActivated,
    LawReviewTriggered,
    LawReviewCompleted,
    LawArchived,
    // Budget
    BudgetCreated,
    BudgetActivated,
    AllocationAdjusted,
    ExpenditureApproved,
    ExpenditureRejected,
    BudgetClosed,
    // Procurement
    SupplierRegistered,
    TenderCreated,
    TenderOpened,
    TenderEvaluated,
    TenderAwarded,
    ContractAwarded,
    TenderClosed,
    // Reflex
    SystemTick,
    DelegationConcentrationWarning,
    DelegationConcentrationHalt,
    TransparencyEscalated,
    BudgetBalanceViolationDetected,
    BudgetOverspendDetected,
    SupplierConcentrationWarning,
    SupplierConcentrationHalt,
);

/// An immutable record of something that happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Time-sortable 128-bit identifier.
    pub event_id: EventId,
    /// The stream (aggregate) this event belongs to.
    pub stream_id: String,
    /// The stream's aggregate family.
    pub stream_type: StreamType,
    /// Stream-local version; the first event of a stream is 1.
    pub version: u64,
    /// Idempotency key of the command that caused this event.
    pub command_id: String,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
    /// The acting identity, if any.
    pub actor_id: Option<String>,
    /// Typed payload.
    pub payload: EventPayload,
}

impl Event {
    /// The payload's event type discriminant.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    /// Canonical payload bytes as persisted (sorted keys, minimal
    /// escaping, fixed decimal rendering).
    ///
    /// # Errors
    ///
    /// Propagates the serde error when the payload cannot serialize.
    pub fn canonical_payload(&self) -> Result<String, serde_json::Error> {
        Ok(canonical::to_canonical_string(&self.payload.to_json()?))
    }
}
