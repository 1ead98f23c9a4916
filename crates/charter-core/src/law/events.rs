//! Law lifecycle events.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Reversibility;

/// Outcome of a completed law review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// Law resumes ACTIVE; checkpoint index advances.
    Continue,
    /// Law resumes ACTIVE; checkpoint index resets to the start.
    Adjust,
    /// Law moves to SUNSET.
    Sunset,
}

/// A law was created in DRAFT status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawCreated {
    /// The new law's id.
    pub law_id: String,
    /// Workspace the law applies in.
    pub workspace_id: String,
    /// Law title.
    pub title: String,
    /// Free-form scope metadata.
    pub scope: BTreeMap<String, String>,
    /// Reversibility classification.
    pub reversibility: Reversibility,
    /// Checkpoint schedule in days after activation.
    pub checkpoints: Vec<u32>,
    /// Law-specific parameters.
    pub params: BTreeMap<String, String>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Actor that created the law.
    pub created_by: Option<String>,
}

/// A law moved from DRAFT to ACTIVE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawActivated {
    /// The activated law.
    pub law_id: String,
    /// Activation instant.
    pub activated_at: DateTime<Utc>,
    /// First mandatory review instant.
    pub next_checkpoint_at: DateTime<Utc>,
    /// Index of the scheduled checkpoint (0 on activation).
    pub checkpoint_index: u32,
}

/// A law review started, manually or because a checkpoint lapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawReviewTriggered {
    /// The law under review.
    pub law_id: String,
    /// Trigger instant.
    pub triggered_at: DateTime<Utc>,
    /// Triggering actor; `None` for the tick engine.
    pub triggered_by: Option<String>,
    /// "checkpoint_overdue" for tick triggers, otherwise caller-supplied.
    pub reason: String,
    /// The checkpoint index that was due.
    pub checkpoint_index: u32,
}

/// A law review finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawReviewCompleted {
    /// The reviewed law.
    pub law_id: String,
    /// Completion instant.
    pub completed_at: DateTime<Utc>,
    /// Reviewing actor ("system" when absent).
    pub completed_by: String,
    /// Outcome of the review.
    pub outcome: ReviewOutcome,
    /// Optional reviewer notes.
    pub notes: Option<String>,
    /// Next mandatory review instant; `None` once the schedule is
    /// exhausted or the law is sunsetting.
    pub next_checkpoint_at: Option<DateTime<Utc>>,
    /// Checkpoint index now scheduled.
    pub checkpoint_index: u32,
}

/// A SUNSET law was archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawArchived {
    /// The archived law.
    pub law_id: String,
    /// Archival instant.
    pub archived_at: DateTime<Utc>,
    /// Stated reason.
    pub reason: String,
}
