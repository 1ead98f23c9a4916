//! Delegation graph projection.
//!
//! Holds every delegation aggregate plus graph-shaped queries over the
//! active edges: cycle probes, in-degrees, per-workspace edge lists. Maps
//! are ordered so replay and iteration are deterministic.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use super::DelegationState;
use super::events::{
    DecisionRightDelegated, DelegationExpired, DelegationRenewed, DelegationRevoked,
};

/// A single active edge in the delegation graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationEdge {
    /// Owning delegation aggregate.
    pub delegation_id: String,
    /// Granting actor.
    pub from_actor: String,
    /// Receiving actor.
    pub to_actor: String,
    /// Workspace the edge belongs to.
    pub workspace_id: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// Materialized view of all delegations and the derived graph.
#[derive(Debug, Default, Clone)]
pub struct DelegationGraph {
    delegations: BTreeMap<String, DelegationState>,
}

impl DelegationGraph {
    /// Looks up a delegation by id.
    #[must_use]
    pub fn get(&self, delegation_id: &str) -> Option<&DelegationState> {
        self.delegations.get(delegation_id)
    }

    /// All delegations, active or not.
    pub fn iter(&self) -> impl Iterator<Item = &DelegationState> {
        self.delegations.values()
    }

    /// Edges active at `now`.
    #[must_use]
    pub fn active_edges(&self, now: DateTime<Utc>) -> Vec<DelegationEdge> {
        self.delegations
            .values()
            .filter(|d| d.is_active(now))
            .map(|d| DelegationEdge {
                delegation_id: d.delegation_id.clone(),
                from_actor: d.from_actor.clone(),
                to_actor: d.to_actor.clone(),
                workspace_id: d.workspace_id.clone(),
                expires_at: d.expires_at,
            })
            .collect()
    }

    /// Active edges within one workspace.
    #[must_use]
    pub fn edges_in_workspace(&self, workspace_id: &str, now: DateTime<Utc>) -> Vec<DelegationEdge> {
        self.active_edges(now)
            .into_iter()
            .filter(|e| e.workspace_id == workspace_id)
            .collect()
    }

    /// In-degree per receiving actor over the active edges.
    #[must_use]
    pub fn in_degrees(&self, now: DateTime<Utc>) -> BTreeMap<String, u64> {
        let mut degrees: BTreeMap<String, u64> = BTreeMap::new();
        for delegation in self.delegations.values() {
            if delegation.is_active(now) {
                *degrees.entry(delegation.to_actor.clone()).or_default() += 1;
            }
        }
        degrees
    }

    /// Whether adding `from_actor → to_actor` would close a cycle.
    ///
    /// DFS from `to_actor` over the active adjacency: a path back to
    /// `from_actor` means the new edge closes a loop. `O(|V| + |E|)`.
    #[must_use]
    pub fn would_create_cycle(
        &self,
        from_actor: &str,
        to_actor: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for delegation in self.delegations.values() {
            if delegation.is_active(now) {
                adjacency
                    .entry(delegation.from_actor.as_str())
                    .or_default()
                    .push(delegation.to_actor.as_str());
            }
        }

        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut stack = vec![to_actor];
        while let Some(current) = stack.pop() {
            if current == from_actor {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(next) = adjacency.get(current) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }

    pub(crate) fn apply_delegated(&mut self, payload: &DecisionRightDelegated, version: u64) {
        self.delegations.insert(
            payload.delegation_id.clone(),
            DelegationState {
                delegation_id: payload.delegation_id.clone(),
                workspace_id: payload.workspace_id.clone(),
                from_actor: payload.from_actor.clone(),
                to_actor: payload.to_actor.clone(),
                delegated_at: payload.delegated_at,
                ttl_days: payload.ttl_days,
                expires_at: payload.expires_at,
                visibility: payload.visibility,
                purpose_tag: payload.purpose_tag.clone(),
                revoked_at: None,
                expired_at: None,
                version,
            },
        );
    }

    pub(crate) fn apply_renewed(&mut self, payload: &DelegationRenewed, version: u64) {
        if let Some(delegation) = self.delegations.get_mut(&payload.delegation_id) {
            delegation.ttl_days = payload.ttl_days;
            delegation.expires_at = payload.expires_at;
            delegation.version = version;
        }
    }

    pub(crate) fn apply_revoked(&mut self, payload: &DelegationRevoked, version: u64) {
        if let Some(delegation) = self.delegations.get_mut(&payload.delegation_id) {
            delegation.revoked_at = Some(payload.revoked_at);
            delegation.version = version;
        }
    }

    pub(crate) fn apply_expired(&mut self, payload: &DelegationExpired, version: u64) {
        if let Some(delegation) = self.delegations.get_mut(&payload.delegation_id) {
            delegation.expired_at = Some(payload.expired_at);
            delegation.version = version;
        }
    }
}
