//! Law command handlers.

use chrono::Duration;

use crate::context::HandlerContext;
use crate::error::KernelError;
use crate::event::{Event, EventPayload, StreamType};
use crate::projections::Projections;

use super::commands::{ActivateLaw, ArchiveLaw, CompleteReview, CreateLaw, TriggerLawReview};
use super::events::{
    LawActivated, LawArchived, LawCreated, LawReviewCompleted, LawReviewTriggered, ReviewOutcome,
};
use super::invariants;
use super::{LawState, LawStatus};

/// Handles `CreateLaw`.
///
/// # Errors
///
/// Validation errors for a missing/archived workspace, empty title, or
/// an invalid checkpoint schedule.
pub fn create_law(
    command: &CreateLaw,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    if command.title.trim().is_empty() {
        return Err(KernelError::InvalidArgument {
            field: "title",
            reason: "law title must be non-empty".to_string(),
        });
    }

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

    invariants::validate_checkpoint_schedule(
        &command.checkpoints,
        command.reversibility,
        ctx.policy,
    )?;

    let law_id = ctx.ids.aggregate_id("law");
    let payload = EventPayload::LawCreated(LawCreated {
        law_id: law_id.clone(),
        workspace_id: command.workspace_id.clone(),
        title: command.title.clone(),
        scope: command.scope.clone(),
        reversibility: command.reversibility,
        checkpoints: command.checkpoints.clone(),
        params: command.params.clone(),
        created_at: ctx.now,
        created_by: ctx.actor_id.map(str::to_string),
    });

    Ok(vec![ctx.event(law_id, StreamType::Law, 1, payload)])
}

/// Handles `ActivateLaw`: DRAFT → ACTIVE, scheduling the first
/// checkpoint at `now + checkpoints[0]` days.
///
/// # Errors
///
/// [`KernelError::UnknownAggregate`] or
/// [`KernelError::IllegalStatusTransition`].
pub fn activate_law(
    command: &ActivateLaw,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let law = lookup(projections, &command.law_id)?;
    invariants::require_status(law.status, LawStatus::Draft, "activate")?;

    let next_checkpoint_at = ctx.now + Duration::days(i64::from(law.checkpoints[0]));
    let payload = EventPayload::LawActivated(LawActivated {
        law_id: command.law_id.clone(),
        activated_at: ctx.now,
        next_checkpoint_at,
        checkpoint_index: 0,
    });

    Ok(vec![ctx.event(
        command.law_id.clone(),
        StreamType::Law,
        law.version + 1,
        payload,
    )])
}

/// Handles the manual `TriggerLawReview`: ACTIVE → REVIEW.
///
/// # Errors
///
/// [`KernelError::UnknownAggregate`] or
/// [`KernelError::IllegalStatusTransition`].
pub fn trigger_law_review(
    command: &TriggerLawReview,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let law = lookup(projections, &command.law_id)?;
    invariants::require_status(law.status, LawStatus::Active, "trigger_review")?;

    let payload = EventPayload::LawReviewTriggered(LawReviewTriggered {
        law_id: command.law_id.clone(),
        triggered_at: ctx.now,
        triggered_by: ctx.actor_id.map(str::to_string),
        reason: command.reason.clone(),
        checkpoint_index: law.checkpoint_index,
    });

    Ok(vec![ctx.event(
        command.law_id.clone(),
        StreamType::Law,
        law.version + 1,
        payload,
    )])
}

/// Handles `CompleteReview`: REVIEW → ACTIVE (continue/adjust) or
/// REVIEW → SUNSET.
///
/// `continue` advances the checkpoint index and schedules the next
/// review `checkpoints[index]` days from now; past the end of the
/// schedule the law stays ACTIVE with no further checkpoint. `adjust`
/// resets the index to 0 and reapplies the first interval.
///
/// # Errors
///
/// [`KernelError::UnknownAggregate`] or
/// [`KernelError::IllegalStatusTransition`].
pub fn complete_review(
    command: &CompleteReview,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let law = lookup(projections, &command.law_id)?;
    invariants::require_status(law.status, LawStatus::Review, "complete_review")?;

    let (checkpoint_index, next_checkpoint_at) = match command.outcome {
        ReviewOutcome::Continue => {
            let next_index = law.checkpoint_index + 1;
            let next_at = law
                .checkpoints
                .get(next_index as usize)
                .map(|&days| ctx.now + Duration::days(i64::from(days)));
            (next_index, next_at)
        },
        ReviewOutcome::Adjust => (
            0,
            Some(ctx.now + Duration::days(i64::from(law.checkpoints[0]))),
        ),
        ReviewOutcome::Sunset => (law.checkpoint_index, None),
    };

    let payload = EventPayload::LawReviewCompleted(LawReviewCompleted {
        law_id: command.law_id.clone(),
        completed_at: ctx.now,
        completed_by: ctx.actor_id.unwrap_or("system").to_string(),
        outcome: command.outcome,
        notes: command.notes.clone(),
        next_checkpoint_at,
        checkpoint_index,
    });

    Ok(vec![ctx.event(
        command.law_id.clone(),
        StreamType::Law,
        law.version + 1,
        payload,
    )])
}

/// Handles `ArchiveLaw`: SUNSET → ARCHIVED.
///
/// # Errors
///
/// [`KernelError::UnknownAggregate`] or
/// [`KernelError::IllegalStatusTransition`].
pub fn archive_law(
    command: &ArchiveLaw,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let law = lookup(projections, &command.law_id)?;
    invariants::require_status(law.status, LawStatus::Sunset, "archive")?;

    let payload = EventPayload::LawArchived(LawArchived {
        law_id: command.law_id.clone(),
        archived_at: ctx.now,
        reason: command.reason.clone(),
    });

    Ok(vec![ctx.event(
        command.law_id.clone(),
        StreamType::Law,
        law.version + 1,
        payload,
    )])
}

fn lookup<'a>(projections: &'a Projections, law_id: &str) -> Result<&'a LawState, KernelError> {
    projections
        .laws
        .get(law_id)
        .ok_or_else(|| KernelError::UnknownAggregate {
            kind: "law",
            id: law_id.to_string(),
        })
}
