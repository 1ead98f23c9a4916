//! Delegation invariants.
//!
//! Pure checks against the current delegation graph. Handlers call these
//! before emitting events; the tick engine reuses the concentration math
//! through [`crate::metrics`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::KernelError;
use crate::metrics::gini_coefficient;
use crate::policy::SafetyPolicy;

use super::graph::DelegationGraph;

/// Enforces `1 <= ttl_days <= max_delegation_ttl_days`.
///
/// # Errors
///
/// Returns [`KernelError::InvalidArgument`] for a zero TTL and
/// [`KernelError::TtlExceedsMaximum`] past the policy ceiling.
pub fn validate_ttl(ttl_days: u32, policy: &SafetyPolicy) -> Result<(), KernelError> {
    if ttl_days == 0 {
        return Err(KernelError::InvalidArgument {
            field: "ttl_days",
            reason: "ttl must be at least one day".to_string(),
        });
    }
    if ttl_days > policy.max_delegation_ttl_days {
        return Err(KernelError::TtlExceedsMaximum {
            ttl_days,
            max_ttl_days: policy.max_delegation_ttl_days,
        });
    }
    Ok(())
}

/// Rejects an edge that would close a cycle in the active graph.
///
/// # Errors
///
/// Returns [`KernelError::DelegationCycleDetected`] when a path
/// `to_actor ⇝ from_actor` already exists.
pub fn validate_acyclic(
    graph: &DelegationGraph,
    from_actor: &str,
    to_actor: &str,
    now: DateTime<Utc>,
) -> Result<(), KernelError> {
    if graph.would_create_cycle(from_actor, to_actor, now) {
        return Err(KernelError::DelegationCycleDetected {
            from_actor: from_actor.to_string(),
            to_actor: to_actor.to_string(),
        });
    }
    Ok(())
}

/// Refuses concentrating edges while a halt is in force.
///
/// A halt event emitted by the tick engine latches the gate; from then
/// on, an edge is refused when its target's active in-degree is already
/// at or above `delegation_in_degree_halt`, or when the distribution
/// including the proposed edge would put the Gini coefficient at or above
/// `delegation_gini_halt`. The live condition is re-derived from the
/// graph on every call, so the gate reopens when concentration recedes.
///
/// # Errors
///
/// Returns [`KernelError::DelegationConcentrationLimit`] when the gate
/// is latched and either bound holds.
pub fn validate_concentration_gate(
    graph: &DelegationGraph,
    to_actor: &str,
    now: DateTime<Utc>,
    policy: &SafetyPolicy,
    halt_latched: bool,
) -> Result<(), KernelError> {
    if !halt_latched {
        return Ok(());
    }

    let mut degrees: BTreeMap<String, u64> = graph.in_degrees(now);
    let current = degrees.get(to_actor).copied().unwrap_or(0);

    *degrees.entry(to_actor.to_string()).or_default() += 1;
    let would_be: Vec<f64> = degrees.values().map(|&d| d as f64).collect();
    let would_be_gini = gini_coefficient(&would_be);

    if current >= policy.delegation_in_degree_halt || would_be_gini >= policy.delegation_gini_halt
    {
        return Err(KernelError::DelegationConcentrationLimit {
            to_actor: to_actor.to_string(),
            in_degree: current + 1,
            gini: would_be_gini,
        });
    }
    Ok(())
}
