//! Laws: time-bound policies with mandatory review checkpoints.
//!
//! A law is a hypothesis, not a permanent command. Activation starts a
//! checkpoint clock; when a checkpoint passes without review the tick
//! engine forces the law into REVIEW. The lifecycle is
//! `DRAFT → ACTIVE → REVIEW → (ACTIVE | SUNSET)`, with `SUNSET →
//! ARCHIVED` terminal.

mod commands;
mod events;
pub(crate) mod handlers;
pub(crate) mod invariants;
mod registry;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use commands::{ActivateLaw, ArchiveLaw, CompleteReview, CreateLaw, TriggerLawReview};
pub use events::{
    LawActivated, LawArchived, LawCreated, LawReviewCompleted, LawReviewTriggered, ReviewOutcome,
};
pub use registry::LawRegistry;

/// How difficult a law is to undo. Irreversible laws carry a tighter
/// first-checkpoint requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reversibility {
    /// Easy to change or remove.
    Reversible,
    /// Moderate difficulty.
    SemiReversible,
    /// Hard to undo; first checkpoint must come early.
    Irreversible,
}

/// Law lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LawStatus {
    /// Being prepared; not yet in effect.
    Draft,
    /// In effect; the checkpoint clock is running.
    Active,
    /// Undergoing mandatory review.
    Review,
    /// Scheduled for termination.
    Sunset,
    /// Terminal; preserved for the record.
    Archived,
}

impl LawStatus {
    /// Stable name used in payloads and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Review => "REVIEW",
            Self::Sunset => "SUNSET",
            Self::Archived => "ARCHIVED",
        }
    }
}

/// Current state of a law aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawState {
    /// Aggregate identifier.
    pub law_id: String,
    /// Workspace the law applies in.
    pub workspace_id: String,
    /// Human-readable title.
    pub title: String,
    /// Free-form scope metadata.
    pub scope: BTreeMap<String, String>,
    /// Reversibility classification.
    pub reversibility: Reversibility,
    /// Review checkpoints in days after activation; strictly increasing.
    pub checkpoints: Vec<u32>,
    /// Law-specific parameters.
    pub params: BTreeMap<String, String>,
    /// Lifecycle status.
    pub status: LawStatus,
    /// Index of the checkpoint currently scheduled.
    pub checkpoint_index: u32,
    /// When the next mandatory review is due; `None` once the schedule
    /// is exhausted.
    pub next_checkpoint_at: Option<DateTime<Utc>>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Activation instant.
    pub activated_at: Option<DateTime<Utc>>,
    /// Stream version of the last applied event.
    pub version: u64,
}

impl LawState {
    /// Whether the law's review is overdue at `now`.
    #[must_use]
    pub fn is_review_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == LawStatus::Active
            && self.next_checkpoint_at.is_some_and(|at| at < now)
    }
}
