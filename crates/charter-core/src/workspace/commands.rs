//! Workspace commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Creates a new workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWorkspace {
    /// Workspace name; must be non-empty.
    pub name: String,
    /// Optional parent workspace.
    #[serde(default)]
    pub parent_workspace_id: Option<String>,
    /// Free-form scope metadata.
    #[serde(default)]
    pub scope: BTreeMap<String, String>,
}

/// Archives a workspace. Terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveWorkspace {
    /// Workspace to archive.
    pub workspace_id: String,
    /// Why it is being archived.
    pub reason: String,
}
