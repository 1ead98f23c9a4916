//! Budget registry and expenditure log projections.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::events::{
    AllocationAdjusted, BudgetActivated, BudgetClosed, BudgetCreated, ExpenditureApproved,
    ExpenditureRejected, RejectionGate,
};
use super::{BudgetState, BudgetStatus};

/// Materialized view of all budgets, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct BudgetRegistry {
    budgets: BTreeMap<String, BudgetState>,
}

impl BudgetRegistry {
    /// Looks up a budget by id.
    #[must_use]
    pub fn get(&self, budget_id: &str) -> Option<&BudgetState> {
        self.budgets.get(budget_id)
    }

    /// Budgets currently in effect.
    pub fn list_active(&self) -> impl Iterator<Item = &BudgetState> {
        self.budgets
            .values()
            .filter(|b| b.status == BudgetStatus::Active)
    }

    /// Budgets funding a given law.
    pub fn list_for_law<'a>(&'a self, law_id: &'a str) -> impl Iterator<Item = &'a BudgetState> {
        self.budgets.values().filter(move |b| b.law_id == law_id)
    }

    pub(crate) fn apply_created(&mut self, payload: &BudgetCreated, version: u64) {
        self.budgets.insert(
            payload.budget_id.clone(),
            BudgetState {
                budget_id: payload.budget_id.clone(),
                law_id: payload.law_id.clone(),
                fiscal_year: payload.fiscal_year,
                items: payload
                    .items
                    .iter()
                    .map(|item| (item.item_id.clone(), item.clone()))
                    .collect(),
                budget_total: payload.budget_total,
                status: BudgetStatus::Draft,
                created_at: payload.created_at,
                activated_at: None,
                closed_at: None,
                version,
            },
        );
    }

    pub(crate) fn apply_activated(&mut self, payload: &BudgetActivated, version: u64) {
        if let Some(budget) = self.budgets.get_mut(&payload.budget_id) {
            budget.status = BudgetStatus::Active;
            budget.activated_at = Some(payload.activated_at);
            budget.version = version;
        }
    }

    pub(crate) fn apply_adjusted(&mut self, payload: &AllocationAdjusted, version: u64) {
        if let Some(budget) = self.budgets.get_mut(&payload.budget_id) {
            for adjustment in &payload.adjustments {
                if let Some(item) = budget.items.get_mut(&adjustment.item_id) {
                    item.allocated_amount += adjustment.change_amount;
                }
            }
            budget.version = version;
        }
    }

    pub(crate) fn apply_expenditure_approved(
        &mut self,
        payload: &ExpenditureApproved,
        version: u64,
    ) {
        if let Some(budget) = self.budgets.get_mut(&payload.budget_id) {
            if let Some(item) = budget.items.get_mut(&payload.item_id) {
                item.spent_amount += payload.amount;
            }
            budget.version = version;
        }
    }

    pub(crate) fn apply_expenditure_rejected(
        &mut self,
        payload: &ExpenditureRejected,
        version: u64,
    ) {
        // The rejection changes no allocation, but it is a stream event
        // and must advance the aggregate version.
        if let Some(budget) = self.budgets.get_mut(&payload.budget_id) {
            budget.version = version;
        }
    }

    pub(crate) fn apply_closed(&mut self, payload: &BudgetClosed, version: u64) {
        if let Some(budget) = self.budgets.get_mut(&payload.budget_id) {
            budget.status = BudgetStatus::Closed;
            budget.closed_at = Some(payload.closed_at);
            budget.version = version;
        }
    }
}

/// One audited expenditure decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenditureRecord {
    /// Budget charged.
    pub budget_id: String,
    /// Item charged.
    pub item_id: String,
    /// Expenditure id for approvals; `None` for rejections.
    pub expenditure_id: Option<String>,
    /// Requested amount.
    pub amount: Decimal,
    /// Stated purpose.
    pub purpose: String,
    /// Decision instant.
    pub recorded_at: DateTime<Utc>,
    /// Whether the expenditure was approved.
    pub approved: bool,
    /// The refusing gate, for rejections.
    pub gate: Option<RejectionGate>,
}

/// Append-only audit log of every approve/reject decision.
#[derive(Debug, Default, Clone)]
pub struct ExpenditureLog {
    records: Vec<ExpenditureRecord>,
}

impl ExpenditureLog {
    /// All records, in decision order.
    #[must_use]
    pub fn records(&self) -> &[ExpenditureRecord] {
        &self.records
    }

    /// Records for one budget.
    pub fn for_budget<'a>(
        &'a self,
        budget_id: &'a str,
    ) -> impl Iterator<Item = &'a ExpenditureRecord> {
        self.records.iter().filter(move |r| r.budget_id == budget_id)
    }

    /// Rejected expenditures only.
    pub fn rejected(&self) -> impl Iterator<Item = &ExpenditureRecord> {
        self.records.iter().filter(|r| !r.approved)
    }

    pub(crate) fn apply_approved(&mut self, payload: &ExpenditureApproved) {
        self.records.push(ExpenditureRecord {
            budget_id: payload.budget_id.clone(),
            item_id: payload.item_id.clone(),
            expenditure_id: Some(payload.expenditure_id.clone()),
            amount: payload.amount,
            purpose: payload.purpose.clone(),
            recorded_at: payload.approved_at,
            approved: true,
            gate: None,
        });
    }

    pub(crate) fn apply_rejected(&mut self, payload: &ExpenditureRejected) {
        self.records.push(ExpenditureRecord {
            budget_id: payload.budget_id.clone(),
            item_id: payload.item_id.clone(),
            expenditure_id: None,
            amount: payload.amount,
            purpose: payload.purpose.clone(),
            recorded_at: payload.rejected_at,
            approved: false,
            gate: Some(payload.gate),
        });
    }
}
