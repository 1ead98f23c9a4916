//! Delegations: revocable, time-bound transfers of decision authority.
//!
//! Delegations are edges in a directed graph that must stay acyclic;
//! cycles would let authority circulate with no accountable source. Every
//! edge expires; the tick engine emits the expiry events.

mod commands;
mod events;
mod graph;
pub(crate) mod handlers;
pub(crate) mod invariants;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use commands::{DelegateDecisionRight, RenewDelegation, RevokeDelegation};
pub use events::{
    DecisionRightDelegated, DelegationExpired, DelegationRenewed, DelegationRevoked,
};
pub use graph::{DelegationEdge, DelegationGraph};

use crate::policy::Visibility;

/// Current state of a delegation aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationState {
    /// Aggregate identifier.
    pub delegation_id: String,
    /// Workspace the delegation applies in.
    pub workspace_id: String,
    /// Actor granting authority.
    pub from_actor: String,
    /// Actor receiving authority.
    pub to_actor: String,
    /// Creation instant.
    pub delegated_at: DateTime<Utc>,
    /// Time-to-live in days.
    pub ttl_days: u32,
    /// Expiry instant (`delegated_at + ttl_days`, or later after renewal).
    pub expires_at: DateTime<Utc>,
    /// Who may see the edge.
    pub visibility: Visibility,
    /// Optional categorization label.
    pub purpose_tag: Option<String>,
    /// Set when explicitly revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Set when the tick engine observed expiry.
    pub expired_at: Option<DateTime<Utc>>,
    /// Stream version of the last applied event.
    pub version: u64,
}

impl DelegationState {
    /// Active iff never revoked, never marked expired, and not past its
    /// expiry instant.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expired_at.is_none() && now <= self.expires_at
    }
}
