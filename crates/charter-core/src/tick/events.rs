//! Reflex event payloads emitted by the tick engine.
//!
//! These record that a threshold or deadline was observed; they carry
//! the numeric values and timestamps an auditor needs to re-derive the
//! decision.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tick evaluation pass ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemTick {
    /// Evaluation instant.
    pub tick_at: DateTime<Utc>,
    /// Identifier tying the pass's events together.
    pub tick_id: String,
}

/// Delegation concentration crossed the warning thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationConcentrationWarning {
    /// Observation instant.
    pub triggered_at: DateTime<Utc>,
    /// Observed Gini coefficient.
    pub gini_coefficient: f64,
    /// Observed maximum in-degree.
    pub max_in_degree: u64,
    /// Gini warning threshold in force.
    pub warn_threshold_gini: f64,
    /// In-degree warning threshold in force.
    pub warn_threshold_in_degree: u64,
    /// Which bounds were crossed.
    pub reason: String,
}

/// Delegation concentration crossed the halt thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationConcentrationHalt {
    /// Observation instant.
    pub triggered_at: DateTime<Utc>,
    /// Observed Gini coefficient.
    pub gini_coefficient: f64,
    /// Observed maximum in-degree.
    pub max_in_degree: u64,
    /// Gini halt threshold in force.
    pub halt_threshold_gini: f64,
    /// In-degree halt threshold in force.
    pub halt_threshold_in_degree: u64,
    /// Safeguards engaged automatically alongside the halt.
    pub automatic_responses: Vec<String>,
    /// Which bounds were crossed.
    pub reason: String,
}

/// Aggregate visibility was escalated in response to a halt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransparencyEscalated {
    /// Escalation instant.
    pub escalated_at: DateTime<Utc>,
    /// Escalation scope ("global" today).
    pub scope: String,
    /// Visibility level before.
    pub previous_level: String,
    /// Visibility level after.
    pub new_level: String,
    /// The event type that triggered the escalation.
    pub trigger_event: String,
}

/// An ACTIVE budget's allocations no longer sum to its total.
///
/// The write path guards this invariant; seeing the event means
/// corruption or a handler bug, and it is worth an alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetBalanceViolationDetected {
    /// The unbalanced budget.
    pub budget_id: String,
    /// Observation instant.
    pub detected_at: DateTime<Utc>,
    /// The immutable total.
    pub budget_total: Decimal,
    /// Observed sum of allocations.
    pub total_allocated: Decimal,
    /// `total_allocated - budget_total`.
    pub variance: Decimal,
}

/// A budget item's spend exceeds its allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetOverspendDetected {
    /// The owning budget.
    pub budget_id: String,
    /// The overspent item.
    pub item_id: String,
    /// Observation instant.
    pub detected_at: DateTime<Utc>,
    /// Item allocation.
    pub allocated_amount: Decimal,
    /// Item spend.
    pub spent_amount: Decimal,
    /// `spent_amount - allocated_amount`.
    pub overspend_amount: Decimal,
}

/// Supplier awards concentrated past the warning threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierConcentrationWarning {
    /// Observation instant.
    pub triggered_at: DateTime<Utc>,
    /// Gini over awarded totals.
    pub gini_coefficient: f64,
    /// Threshold in force.
    pub warn_threshold: f64,
    /// Sum of all awarded totals.
    pub total_value_awarded: Decimal,
    /// Number of registered suppliers.
    pub supplier_count: u64,
}

/// Supplier awards concentrated past the halt threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierConcentrationHalt {
    /// Observation instant.
    pub triggered_at: DateTime<Utc>,
    /// Gini over awarded totals.
    pub gini_coefficient: f64,
    /// Threshold in force.
    pub halt_threshold: f64,
    /// Sum of all awarded totals.
    pub total_value_awarded: Decimal,
    /// Number of registered suppliers.
    pub supplier_count: u64,
}
