//! Law lifecycle commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Reversibility;
use super::events::ReviewOutcome;

/// Creates a law in DRAFT status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLaw {
    /// Workspace the law applies in.
    pub workspace_id: String,
    /// Law title; must be non-empty.
    pub title: String,
    /// Free-form scope metadata.
    #[serde(default)]
    pub scope: BTreeMap<String, String>,
    /// Reversibility classification.
    pub reversibility: Reversibility,
    /// Checkpoint schedule in days after activation; strictly increasing
    /// and non-empty.
    pub checkpoints: Vec<u32>,
    /// Law-specific parameters.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// Moves a law from DRAFT to ACTIVE and starts the checkpoint clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateLaw {
    /// Law to activate.
    pub law_id: String,
}

/// Manually places an ACTIVE law under review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerLawReview {
    /// Law to review.
    pub law_id: String,
    /// Why the review was requested.
    pub reason: String,
}

/// Completes a review with an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteReview {
    /// Law under review.
    pub law_id: String,
    /// Review outcome.
    pub outcome: ReviewOutcome,
    /// Optional reviewer notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Archives a SUNSET law. Terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveLaw {
    /// Law to archive.
    pub law_id: String,
    /// Why it is being archived.
    pub reason: String,
}
