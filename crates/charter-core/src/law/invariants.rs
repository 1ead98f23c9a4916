//! Law invariants: checkpoint schedules and status transitions.

use crate::error::KernelError;
use crate::policy::SafetyPolicy;

use super::{LawStatus, Reversibility};

/// Validates a checkpoint schedule: non-empty, strictly positive,
/// strictly increasing, and, for irreversible laws, an early first
/// checkpoint.
///
/// # Errors
///
/// Returns [`KernelError::CheckpointScheduleInvalid`] with the violated
/// rule.
pub fn validate_checkpoint_schedule(
    checkpoints: &[u32],
    reversibility: Reversibility,
    policy: &SafetyPolicy,
) -> Result<(), KernelError> {
    if checkpoints.is_empty() {
        return Err(KernelError::CheckpointScheduleInvalid {
            reason: "schedule must contain at least one checkpoint".to_string(),
        });
    }
    if checkpoints.iter().any(|&c| c == 0) {
        return Err(KernelError::CheckpointScheduleInvalid {
            reason: "checkpoints must be positive day counts".to_string(),
        });
    }
    if checkpoints.windows(2).any(|w| w[1] <= w[0]) {
        return Err(KernelError::CheckpointScheduleInvalid {
            reason: "checkpoints must be strictly increasing".to_string(),
        });
    }
    if reversibility == Reversibility::Irreversible
        && checkpoints[0] > policy.irreversible_first_checkpoint_max_days
    {
        return Err(KernelError::CheckpointScheduleInvalid {
            reason: format!(
                "irreversible laws must schedule their first review within {} days, got {}",
                policy.irreversible_first_checkpoint_max_days, checkpoints[0]
            ),
        });
    }
    Ok(())
}

/// Enforces the law state machine for a given operation.
///
/// # Errors
///
/// Returns [`KernelError::IllegalStatusTransition`] when `status` is not
/// the expected source state.
pub fn require_status(
    status: LawStatus,
    expected: LawStatus,
    operation: &'static str,
) -> Result<(), KernelError> {
    if status == expected {
        Ok(())
    } else {
        Err(KernelError::IllegalStatusTransition {
            kind: "law",
            from: status.as_str().to_string(),
            operation,
        })
    }
}
