//! Budget events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::BudgetItem;

/// Which gate refused an expenditure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionGate {
    /// The budget is not ACTIVE.
    BudgetStatus,
    /// The named item does not exist in the budget.
    ItemNotFound,
    /// The amount exceeds the item's remaining allocation.
    InsufficientBudget,
}

impl RejectionGate {
    /// Stable gate name recorded in the audit trail.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BudgetStatus => "budget_status",
            Self::ItemNotFound => "item_not_found",
            Self::InsufficientBudget => "insufficient_budget",
        }
    }
}

/// A budget was created in DRAFT status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCreated {
    /// The new budget's id.
    pub budget_id: String,
    /// The law this budget funds.
    pub law_id: String,
    /// Fiscal year covered.
    pub fiscal_year: i32,
    /// Initial line items (spent amounts start at zero).
    pub items: Vec<BudgetItem>,
    /// The immutable total.
    pub budget_total: Decimal,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Actor that created the budget.
    pub created_by: Option<String>,
}

/// A budget moved from DRAFT to ACTIVE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetActivated {
    /// The activated budget.
    pub budget_id: String,
    /// Activation instant.
    pub activated_at: DateTime<Utc>,
}

/// One applied entry of an adjustment batch, recorded for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAdjustment {
    /// Adjusted item.
    pub item_id: String,
    /// Allocation before this entry.
    pub old_amount: Decimal,
    /// Allocation after this entry.
    pub new_amount: Decimal,
    /// The signed change.
    pub change_amount: Decimal,
}

/// A zero-sum allocation rebalance was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationAdjusted {
    /// The adjusted budget.
    pub budget_id: String,
    /// Adjustment instant.
    pub adjusted_at: DateTime<Utc>,
    /// The applied entries, in command order.
    pub adjustments: Vec<AppliedAdjustment>,
    /// Caller-stated reason.
    pub reason: String,
}

/// An expenditure passed every gate and was approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenditureApproved {
    /// Budget charged.
    pub budget_id: String,
    /// Item charged.
    pub item_id: String,
    /// Generated expenditure id.
    pub expenditure_id: String,
    /// Approved amount.
    pub amount: Decimal,
    /// What the money is for.
    pub purpose: String,
    /// Approval instant.
    pub approved_at: DateTime<Utc>,
    /// The item's remaining allocation after this expenditure.
    pub remaining_after: Decimal,
}

/// An expenditure failed a gate; recorded for audit, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenditureRejected {
    /// Budget that was charged.
    pub budget_id: String,
    /// Item that was charged.
    pub item_id: String,
    /// Requested amount.
    pub amount: Decimal,
    /// What the money was for.
    pub purpose: String,
    /// Rejection instant.
    pub rejected_at: DateTime<Utc>,
    /// The gate that refused.
    pub gate: RejectionGate,
    /// Human-readable detail.
    pub reason: String,
}

/// An active budget was closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetClosed {
    /// The closed budget.
    pub budget_id: String,
    /// Closing instant.
    pub closed_at: DateTime<Utc>,
    /// Final sum of allocations.
    pub final_allocated: Decimal,
    /// Final sum of expenditures.
    pub final_spent: Decimal,
    /// Final unspent remainder.
    pub final_remaining: Decimal,
}
