//! Delegation command handlers.

use chrono::Duration;

use crate::context::HandlerContext;
use crate::error::KernelError;
use crate::event::{Event, EventPayload, StreamType};
use crate::projections::Projections;

use super::commands::{DelegateDecisionRight, RenewDelegation, RevokeDelegation};
use super::events::{DecisionRightDelegated, DelegationRenewed, DelegationRevoked};
use super::invariants;

/// Handles `DelegateDecisionRight`.
///
/// Guards, in order: self-delegation, TTL bound, workspace existence and
/// activity, acyclicity, and the concentration halt gate.
///
/// # Errors
///
/// Surfaces the corresponding [`KernelError`] validation variant for each
/// failed guard.
pub fn delegate_decision_right(
    command: &DelegateDecisionRight,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    if command.from_actor == command.to_actor {
        return Err(KernelError::SelfDelegation {
            actor: command.from_actor.clone(),
        });
    }

    invariants::validate_ttl(command.ttl_days, ctx.policy)?;

    let workspace = projections
        .workspaces
        .get(&command.workspace_id)
        .ok_or_else(|| KernelError::UnknownAggregate {
            kind: "workspace",
            id: command.workspace_id.clone(),
        })?;
    if !workspace.is_active() {
        return Err(KernelError::WorkspaceNotActive {
            workspace_id: command.workspace_id.clone(),
        });
    }

    invariants::validate_acyclic(
        &projections.delegations,
        &command.from_actor,
        &command.to_actor,
        ctx.now,
    )?;

    invariants::validate_concentration_gate(
        &projections.delegations,
        &command.to_actor,
        ctx.now,
        ctx.policy,
        projections.safety_log.delegation_halt_latched(),
    )?;

    let delegation_id = ctx.ids.aggregate_id("del");
    let expires_at = ctx.now + Duration::days(i64::from(command.ttl_days));
    let visibility = command
        .visibility
        .unwrap_or(ctx.policy.delegation_visibility_default);

    let payload = EventPayload::DecisionRightDelegated(DecisionRightDelegated {
        delegation_id: delegation_id.clone(),
        workspace_id: command.workspace_id.clone(),
        from_actor: command.from_actor.clone(),
        to_actor: command.to_actor.clone(),
        delegated_at: ctx.now,
        ttl_days: command.ttl_days,
        expires_at,
        visibility,
        purpose_tag: command.purpose_tag.clone(),
    });

    Ok(vec![ctx.event(delegation_id, StreamType::Delegation, 1, payload)])
}

/// Handles `RenewDelegation`.
///
/// # Errors
///
/// Returns [`KernelError::UnknownAggregate`] for a missing delegation,
/// [`KernelError::IllegalStatusTransition`] for an inactive one, and the
/// TTL errors from [`invariants::validate_ttl`].
pub fn renew_delegation(
    command: &RenewDelegation,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    invariants::validate_ttl(command.ttl_days, ctx.policy)?;

    let delegation = projections
        .delegations
        .get(&command.delegation_id)
        .ok_or_else(|| KernelError::UnknownAggregate {
            kind: "delegation",
            id: command.delegation_id.clone(),
        })?;

    if !delegation.is_active(ctx.now) {
        return Err(KernelError::IllegalStatusTransition {
            kind: "delegation",
            from: delegation_status(delegation, ctx).to_string(),
            operation: "renew",
        });
    }

    let expires_at = ctx.now + Duration::days(i64::from(command.ttl_days));
    let payload = EventPayload::DelegationRenewed(DelegationRenewed {
        delegation_id: command.delegation_id.clone(),
        renewed_at: ctx.now,
        ttl_days: command.ttl_days,
        expires_at,
    });

    Ok(vec![ctx.event(
        command.delegation_id.clone(),
        StreamType::Delegation,
        delegation.version + 1,
        payload,
    )])
}

/// Handles `RevokeDelegation`.
///
/// # Errors
///
/// Returns [`KernelError::UnknownAggregate`] for a missing delegation and
/// [`KernelError::IllegalStatusTransition`] for an inactive one.
pub fn revoke_delegation(
    command: &RevokeDelegation,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let delegation = projections
        .delegations
        .get(&command.delegation_id)
        .ok_or_else(|| KernelError::UnknownAggregate {
            kind: "delegation",
            id: command.delegation_id.clone(),
        })?;

    if !delegation.is_active(ctx.now) {
        return Err(KernelError::IllegalStatusTransition {
            kind: "delegation",
            from: delegation_status(delegation, ctx).to_string(),
            operation: "revoke",
        });
    }

    let payload = EventPayload::DelegationRevoked(DelegationRevoked {
        delegation_id: command.delegation_id.clone(),
        revoked_at: ctx.now,
        revoked_by: ctx.actor_id.unwrap_or("system").to_string(),
        reason: command.reason.clone(),
    });

    Ok(vec![ctx.event(
        command.delegation_id.clone(),
        StreamType::Delegation,
        delegation.version + 1,
        payload,
    )])
}

fn delegation_status(
    delegation: &super::DelegationState,
    ctx: &HandlerContext<'_>,
) -> &'static str {
    if delegation.revoked_at.is_some() {
        "revoked"
    } else if delegation.expired_at.is_some() || ctx.now > delegation.expires_at {
        "expired"
    } else {
        "active"
    }
}
