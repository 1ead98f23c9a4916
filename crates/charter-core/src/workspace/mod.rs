//! Workspaces: hierarchical scopes of decision authority.
//!
//! A workspace bounds where delegations and laws apply. Archival is
//! terminal; archived workspaces accept no new delegations or laws.

mod commands;
mod events;
pub(crate) mod handlers;
mod registry;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use commands::{ArchiveWorkspace, CreateWorkspace};
pub use events::{WorkspaceArchived, WorkspaceCreated};
pub use registry::WorkspaceRegistry;

/// Current state of a workspace aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceState {
    /// Aggregate identifier.
    pub workspace_id: String,
    /// Human-readable name.
    pub name: String,
    /// Parent in the workspace hierarchy, if any.
    pub parent_workspace_id: Option<String>,
    /// Free-form scope metadata (territory, domain, ...).
    pub scope: BTreeMap<String, String>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Archival instant; archival is terminal.
    pub archived_at: Option<DateTime<Utc>>,
    /// Stream version of the last applied event.
    pub version: u64,
}

impl WorkspaceState {
    /// Whether the workspace accepts new delegations and laws.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.archived_at.is_none()
    }
}
