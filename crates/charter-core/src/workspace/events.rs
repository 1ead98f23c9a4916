//! Workspace events.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A new workspace was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceCreated {
    /// The new workspace's id.
    pub workspace_id: String,
    /// Workspace name.
    pub name: String,
    /// Parent workspace, if nested.
    pub parent_workspace_id: Option<String>,
    /// Free-form scope metadata.
    pub scope: BTreeMap<String, String>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// A workspace was archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceArchived {
    /// The archived workspace.
    pub workspace_id: String,
    /// Archival instant.
    pub archived_at: DateTime<Utc>,
    /// Stated reason.
    pub reason: String,
}
