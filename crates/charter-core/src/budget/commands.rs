//! Budget commands.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FlexClass;

/// One line item in a `CreateBudget` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItemSpec {
    /// Caller-chosen item id, unique within the budget.
    pub item_id: String,
    /// Human-readable name.
    pub name: String,
    /// Initial allocation; non-negative.
    pub allocated_amount: Decimal,
    /// Adjustment constraint class.
    pub flex_class: FlexClass,
    /// Reporting category.
    pub category: String,
}

/// Creates a budget for a law.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBudget {
    /// The law this budget funds.
    pub law_id: String,
    /// Fiscal year covered.
    pub fiscal_year: i32,
    /// Line items; non-empty, unique ids.
    pub items: Vec<BudgetItemSpec>,
    /// The immutable total; must equal the sum of allocations.
    pub budget_total: Decimal,
}

/// Activates a budget (DRAFT → ACTIVE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateBudget {
    /// Budget to activate.
    pub budget_id: String,
}

/// One entry in an `AdjustAllocation` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSpec {
    /// Item to adjust.
    pub item_id: String,
    /// Signed change to the allocation.
    pub change_amount: Decimal,
}

/// Rebalances allocations between items; the batch must sum to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustAllocation {
    /// Budget to adjust.
    pub budget_id: String,
    /// The adjustment batch.
    pub adjustments: Vec<AdjustmentSpec>,
    /// Why the rebalance is happening.
    pub reason: String,
}

/// Approves (or, failing a gate, records the rejection of) an
/// expenditure against a budget item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveExpenditure {
    /// Budget charged.
    pub budget_id: String,
    /// Item charged.
    pub item_id: String,
    /// Expenditure amount; positive.
    pub amount: Decimal,
    /// What the money is for.
    pub purpose: String,
}

/// Closes an active budget. Terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseBudget {
    /// Budget to close.
    pub budget_id: String,
}
