//! Law registry projection.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use super::events::{
    LawActivated, LawArchived, LawCreated, LawReviewCompleted, LawReviewTriggered, ReviewOutcome,
};
use super::{LawState, LawStatus};

/// Materialized view of all laws, keyed by id, indexed by status and
/// next checkpoint through its query methods.
#[derive(Debug, Default, Clone)]
pub struct LawRegistry {
    laws: BTreeMap<String, LawState>,
}

impl LawRegistry {
    /// Looks up a law by id.
    #[must_use]
    pub fn get(&self, law_id: &str) -> Option<&LawState> {
        self.laws.get(law_id)
    }

    /// Laws in a given status.
    pub fn list_by_status(&self, status: LawStatus) -> impl Iterator<Item = &LawState> {
        self.laws.values().filter(move |law| law.status == status)
    }

    /// Laws currently in effect.
    pub fn list_active(&self) -> impl Iterator<Item = &LawState> {
        self.list_by_status(LawStatus::Active)
    }

    /// ACTIVE laws whose next checkpoint has passed.
    #[must_use]
    pub fn list_overdue(&self, now: DateTime<Utc>) -> Vec<&LawState> {
        self.laws
            .values()
            .filter(|law| law.is_review_overdue(now))
            .collect()
    }

    /// ACTIVE laws whose next checkpoint falls within the coming
    /// `days` days.
    #[must_use]
    pub fn count_upcoming(&self, now: DateTime<Utc>, days: i64) -> u64 {
        let horizon = now + Duration::days(days);
        self.list_active()
            .filter(|law| {
                law.next_checkpoint_at
                    .is_some_and(|at| now < at && at <= horizon)
            })
            .count() as u64
    }

    pub(crate) fn apply_created(&mut self, payload: &LawCreated, version: u64) {
        self.laws.insert(
            payload.law_id.clone(),
            LawState {
                law_id: payload.law_id.clone(),
                workspace_id: payload.workspace_id.clone(),
                title: payload.title.clone(),
                scope: payload.scope.clone(),
                reversibility: payload.reversibility,
                checkpoints: payload.checkpoints.clone(),
                params: payload.params.clone(),
                status: LawStatus::Draft,
                checkpoint_index: 0,
                next_checkpoint_at: None,
                created_at: payload.created_at,
                activated_at: None,
                version,
            },
        );
    }

    pub(crate) fn apply_activated(&mut self, payload: &LawActivated, version: u64) {
        if let Some(law) = self.laws.get_mut(&payload.law_id) {
            law.status = LawStatus::Active;
            law.activated_at = Some(payload.activated_at);
            law.next_checkpoint_at = Some(payload.next_checkpoint_at);
            law.checkpoint_index = payload.checkpoint_index;
            law.version = version;
        }
    }

    pub(crate) fn apply_review_triggered(&mut self, payload: &LawReviewTriggered, version: u64) {
        if let Some(law) = self.laws.get_mut(&payload.law_id) {
            law.status = LawStatus::Review;
            law.version = version;
        }
    }

    pub(crate) fn apply_review_completed(&mut self, payload: &LawReviewCompleted, version: u64) {
        if let Some(law) = self.laws.get_mut(&payload.law_id) {
            law.status = match payload.outcome {
                ReviewOutcome::Continue | ReviewOutcome::Adjust => LawStatus::Active,
                ReviewOutcome::Sunset => LawStatus::Sunset,
            };
            law.checkpoint_index = payload.checkpoint_index;
            law.next_checkpoint_at = payload.next_checkpoint_at;
            law.version = version;
        }
    }

    pub(crate) fn apply_archived(&mut self, payload: &LawArchived, version: u64) {
        if let Some(law) = self.laws.get_mut(&payload.law_id) {
            law.status = LawStatus::Archived;
            law.next_checkpoint_at = None;
            law.version = version;
        }
    }
}
