//! Workspace command handlers.

use crate::context::HandlerContext;
use crate::error::KernelError;
use crate::event::{Event, EventPayload, StreamType};
use crate::projections::Projections;

use super::commands::{ArchiveWorkspace, CreateWorkspace};
use super::events::{WorkspaceArchived, WorkspaceCreated};

/// Handles `CreateWorkspace`.
///
/// # Errors
///
/// Returns [`KernelError::InvalidArgument`] for an empty name and
/// [`KernelError::UnknownAggregate`] / [`KernelError::WorkspaceNotActive`]
/// when the named parent is missing or archived.
pub fn create_workspace(
    command: &CreateWorkspace,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    if command.name.trim().is_empty() {
        return Err(KernelError::InvalidArgument {
            field: "name",
            reason: "workspace name must be non-empty".to_string(),
        });
    }

    if let Some(parent_id) = &command.parent_workspace_id {
        let parent = projections.workspaces.get(parent_id).ok_or_else(|| {
            KernelError::UnknownAggregate {
                kind: "workspace",
                id: parent_id.clone(),
            }
        })?;
        if !parent.is_active() {
            return Err(KernelError::WorkspaceNotActive {
                workspace_id: parent_id.clone(),
            });
        }
    }

    let workspace_id = ctx.ids.aggregate_id("ws");
    let payload = EventPayload::WorkspaceCreated(WorkspaceCreated {
        workspace_id: workspace_id.clone(),
        name: command.name.clone(),
        parent_workspace_id: command.parent_workspace_id.clone(),
        scope: command.scope.clone(),
        created_at: ctx.now,
    });

    Ok(vec![ctx.event(workspace_id, StreamType::Workspace, 1, payload)])
}

/// Handles `ArchiveWorkspace`.
///
/// # Errors
///
/// Returns [`KernelError::UnknownAggregate`] for a missing workspace and
/// [`KernelError::WorkspaceNotActive`] when it is already archived.
pub fn archive_workspace(
    command: &ArchiveWorkspace,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
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

    let payload = EventPayload::WorkspaceArchived(WorkspaceArchived {
        workspace_id: command.workspace_id.clone(),
        archived_at: ctx.now,
        reason: command.reason.clone(),
    });

    Ok(vec![ctx.event(
        command.workspace_id.clone(),
        StreamType::Workspace,
        workspace.version + 1,
        payload,
    )])
}
