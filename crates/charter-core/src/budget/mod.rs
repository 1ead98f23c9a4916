//! Budgets: law-scoped allocations with multi-gate adjustment.
//!
//! All monetary quantities are exact decimals; binary floats would break
//! the zero-sum invariant. The gates on adjustment are, in order: flex
//! step-size, zero-sum balance, allocation floor. The budget total is
//! immutable after creation.

mod commands;
mod events;
pub(crate) mod handlers;
pub(crate) mod invariants;
mod registry;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use commands::{
    ActivateBudget, AdjustAllocation, AdjustmentSpec, ApproveExpenditure, BudgetItemSpec,
    CloseBudget, CreateBudget,
};
pub use events::{
    AllocationAdjusted, AppliedAdjustment, BudgetActivated, BudgetClosed, BudgetCreated,
    ExpenditureApproved, ExpenditureRejected, RejectionGate,
};
pub use registry::{BudgetRegistry, ExpenditureLog, ExpenditureRecord};

use crate::policy::FlexLimits;

/// Budget item flexibility classification.
///
/// The class bounds how much a single adjustment may move an item's
/// allocation, creating an economic barrier to sudden shifts: large
/// changes take many small, audited steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlexClass {
    /// Essential services; 5% default ceiling.
    Critical,
    /// Significant but adjustable; 15% default ceiling.
    Important,
    /// Flexible; 50% default ceiling.
    Aspirational,
}

impl FlexClass {
    /// The step-size ceiling for this class under the given limits.
    #[must_use]
    pub const fn ceiling(self, limits: &FlexLimits) -> Decimal {
        match self {
            Self::Critical => limits.critical,
            Self::Important => limits.important,
            Self::Aspirational => limits.aspirational,
        }
    }

    /// Stable name used in payloads and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Important => "IMPORTANT",
            Self::Aspirational => "ASPIRATIONAL",
        }
    }
}

/// Budget lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetStatus {
    /// Being prepared.
    Draft,
    /// In effect; can approve expenditures.
    Active,
    /// Fiscal year ended; terminal.
    Closed,
}

impl BudgetStatus {
    /// Stable name used in payloads and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Closed => "CLOSED",
        }
    }
}

/// A single budget line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItem {
    /// Item identifier, unique within the budget.
    pub item_id: String,
    /// Human-readable name.
    pub name: String,
    /// Current allocation.
    pub allocated_amount: Decimal,
    /// Cumulative approved expenditures; never exceeds the allocation.
    pub spent_amount: Decimal,
    /// Adjustment constraint class.
    pub flex_class: FlexClass,
    /// Reporting category.
    pub category: String,
}

impl BudgetItem {
    /// Unspent remainder of the allocation.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.allocated_amount - self.spent_amount
    }
}

/// Current state of a budget aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetState {
    /// Aggregate identifier.
    pub budget_id: String,
    /// The law this budget funds.
    pub law_id: String,
    /// Fiscal year covered.
    pub fiscal_year: i32,
    /// Line items keyed by item id.
    pub items: BTreeMap<String, BudgetItem>,
    /// Immutable total; allocations always sum to this.
    pub budget_total: Decimal,
    /// Lifecycle status.
    pub status: BudgetStatus,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Activation instant.
    pub activated_at: Option<DateTime<Utc>>,
    /// Closing instant.
    pub closed_at: Option<DateTime<Utc>>,
    /// Stream version of the last applied event.
    pub version: u64,
}

impl BudgetState {
    /// Sum of current allocations.
    #[must_use]
    pub fn total_allocated(&self) -> Decimal {
        self.items.values().map(|i| i.allocated_amount).sum()
    }

    /// Sum of approved expenditures.
    #[must_use]
    pub fn total_spent(&self) -> Decimal {
        self.items.values().map(|i| i.spent_amount).sum()
    }

    /// Whether allocations sum exactly to the budget total.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_allocated() == self.budget_total
    }
}
