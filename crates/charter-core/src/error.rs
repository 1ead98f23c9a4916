//! Kernel error taxonomy.
//!
//! Validation errors surface to the caller unchanged; the façade never
//! retries them. Storage and concurrency failures live in
//! [`crate::ledger::StoreError`] and are wrapped here so every fallible
//! kernel operation returns a single error type.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::StoreError;

/// Errors produced by command validation and kernel orchestration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KernelError {
    /// Delegation TTL exceeds the policy maximum.
    #[error("delegation ttl of {ttl_days} days exceeds the maximum of {max_ttl_days} days")]
    TtlExceedsMaximum {
        /// Requested TTL in days.
        ttl_days: u32,
        /// Policy maximum in days.
        max_ttl_days: u32,
    },

    /// Adding the proposed edge would create a cycle in the delegation
    /// graph.
    #[error("delegation from {from_actor} to {to_actor} would create a cycle")]
    DelegationCycleDetected {
        /// Delegating actor.
        from_actor: String,
        /// Receiving actor.
        to_actor: String,
    },

    /// An actor attempted to delegate authority to themselves.
    #[error("actor {actor} cannot delegate to themselves")]
    SelfDelegation {
        /// The actor on both ends of the proposed edge.
        actor: String,
    },

    /// The target actor is at or above the concentration halt threshold,
    /// or the edge would push the system Gini past it.
    #[error(
        "delegation to {to_actor} refused: concentration at halt threshold \
         (in-degree {in_degree}, gini {gini:.3})"
    )]
    DelegationConcentrationLimit {
        /// Receiving actor.
        to_actor: String,
        /// The actor's active in-degree including the proposed edge.
        in_degree: u64,
        /// System Gini coefficient including the proposed edge.
        gini: f64,
    },

    /// An aggregate is not in a state that permits the requested
    /// transition.
    #[error("illegal {kind} transition from {from} via {operation}")]
    IllegalStatusTransition {
        /// Aggregate kind ("law", "budget", "tender", ...).
        kind: &'static str,
        /// Current status.
        from: String,
        /// The operation that was refused.
        operation: &'static str,
    },

    /// The referenced workspace exists but has been archived.
    #[error("workspace {workspace_id} is archived")]
    WorkspaceNotActive {
        /// The archived workspace.
        workspace_id: String,
    },

    /// A single adjustment exceeds the item's flex-class ceiling.
    #[error(
        "adjustment of item {item_id} changes allocation by {change_ratio} \
         which exceeds the {flex_class} ceiling of {max_ratio}"
    )]
    FlexStepSizeViolation {
        /// Adjusted item.
        item_id: String,
        /// Flex class name.
        flex_class: &'static str,
        /// `|change| / allocated` for the proposed adjustment.
        change_ratio: Decimal,
        /// The class ceiling from policy.
        max_ratio: Decimal,
    },

    /// A batch of adjustments does not sum to zero, or would leave the
    /// allocations out of balance with the immutable budget total.
    #[error(
        "adjustments violate budget balance: total {budget_total}, \
         would-be allocations {new_total} (variance {variance})"
    )]
    BudgetBalanceViolation {
        /// The immutable budget total.
        budget_total: Decimal,
        /// Sum of allocations after the proposed adjustments.
        new_total: Decimal,
        /// `new_total - budget_total`.
        variance: Decimal,
    },

    /// An adjustment would cut an item's allocation below what has
    /// already been spent.
    #[error(
        "item {item_id} cannot be cut to {new_allocation}: {spent} already spent"
    )]
    AllocationBelowSpending {
        /// Adjusted item.
        item_id: String,
        /// Allocation after the proposed change.
        new_allocation: Decimal,
        /// Cumulative spend on the item.
        spent: Decimal,
    },

    /// A law's checkpoint schedule is empty, non-positive, or not
    /// strictly increasing (or too lax for its reversibility class).
    #[error("invalid checkpoint schedule: {reason}")]
    CheckpointScheduleInvalid {
        /// Human-readable description of the violation.
        reason: String,
    },

    /// A referenced aggregate does not exist.
    #[error("{kind} {id} not found")]
    UnknownAggregate {
        /// Aggregate kind ("workspace", "law", "budget", ...).
        kind: &'static str,
        /// The missing identifier.
        id: String,
    },

    /// A budget was created with the same item id twice.
    #[error("duplicate budget item {item_id}")]
    DuplicateItem {
        /// The repeated item id.
        item_id: String,
    },

    /// The tender's feasible set is empty; no supplier passes every gate.
    #[error("no feasible supplier for tender {tender_id}")]
    NoFeasibleSupplier {
        /// The tender without feasible suppliers.
        tender_id: String,
    },

    /// A command argument failed basic validation.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Storage or concurrency failure from the event log.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl KernelError {
    /// Whether the error is a validation failure (caller error, never
    /// retried) as opposed to a storage or concurrency failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}
