//! Delegation commands.

use serde::{Deserialize, Serialize};

use crate::policy::Visibility;

/// Delegates decision authority to another actor within a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateDecisionRight {
    /// Workspace the delegation applies in.
    pub workspace_id: String,
    /// Actor granting authority.
    pub from_actor: String,
    /// Actor receiving authority.
    pub to_actor: String,
    /// Requested time-to-live in days.
    pub ttl_days: u32,
    /// Edge visibility; defaults to the policy default when absent.
    #[serde(default)]
    pub visibility: Option<Visibility>,
    /// Optional categorization label.
    #[serde(default)]
    pub purpose_tag: Option<String>,
}

/// Extends an active delegation's expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewDelegation {
    /// Delegation to renew.
    pub delegation_id: String,
    /// New TTL in days, counted from the renewal instant.
    pub ttl_days: u32,
}

/// Cancels a delegation immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeDelegation {
    /// Delegation to revoke.
    pub delegation_id: String,
    /// Optional stated reason.
    #[serde(default)]
    pub reason: Option<String>,
}
