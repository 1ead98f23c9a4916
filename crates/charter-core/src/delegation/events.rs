//! Delegation events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::Visibility;

/// Authority was delegated from one actor to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRightDelegated {
    /// The new delegation's id.
    pub delegation_id: String,
    /// Workspace the delegation applies in.
    pub workspace_id: String,
    /// Granting actor.
    pub from_actor: String,
    /// Receiving actor.
    pub to_actor: String,
    /// Creation instant.
    pub delegated_at: DateTime<Utc>,
    /// TTL in days.
    pub ttl_days: u32,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Edge visibility.
    pub visibility: Visibility,
    /// Optional categorization label.
    pub purpose_tag: Option<String>,
}

/// An active delegation's expiry was extended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRenewed {
    /// The renewed delegation.
    pub delegation_id: String,
    /// Renewal instant.
    pub renewed_at: DateTime<Utc>,
    /// New TTL in days, counted from renewal.
    pub ttl_days: u32,
    /// New expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// A delegation was explicitly cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRevoked {
    /// The revoked delegation.
    pub delegation_id: String,
    /// Revocation instant.
    pub revoked_at: DateTime<Utc>,
    /// Actor that revoked it ("system" when absent).
    pub revoked_by: String,
    /// Optional stated reason.
    pub reason: Option<String>,
}

/// A delegation passed its expiry without renewal (reflex event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationExpired {
    /// The expired delegation.
    pub delegation_id: String,
    /// When the tick engine observed the expiry.
    pub expired_at: DateTime<Utc>,
}
