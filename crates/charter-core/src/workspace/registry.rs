//! Workspace registry projection.

use std::collections::BTreeMap;

use super::WorkspaceState;
use super::events::{WorkspaceArchived, WorkspaceCreated};

/// Materialized view of all workspaces, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct WorkspaceRegistry {
    workspaces: BTreeMap<String, WorkspaceState>,
}

impl WorkspaceRegistry {
    /// Looks up a workspace by id.
    #[must_use]
    pub fn get(&self, workspace_id: &str) -> Option<&WorkspaceState> {
        self.workspaces.get(workspace_id)
    }

    /// All workspaces that have not been archived.
    pub fn list_active(&self) -> impl Iterator<Item = &WorkspaceState> {
        self.workspaces.values().filter(|w| w.is_active())
    }

    /// Total number of workspaces, archived included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    /// Whether no workspace exists yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    pub(crate) fn apply_created(&mut self, payload: &WorkspaceCreated, version: u64) {
        self.workspaces.insert(
            payload.workspace_id.clone(),
            WorkspaceState {
                workspace_id: payload.workspace_id.clone(),
                name: payload.name.clone(),
                parent_workspace_id: payload.parent_workspace_id.clone(),
                scope: payload.scope.clone(),
                created_at: payload.created_at,
                archived_at: None,
                version,
            },
        );
    }

    pub(crate) fn apply_archived(&mut self, payload: &WorkspaceArchived, version: u64) {
        if let Some(workspace) = self.workspaces.get_mut(&payload.workspace_id) {
            workspace.archived_at = Some(payload.archived_at);
            workspace.version = version;
        }
    }
}
