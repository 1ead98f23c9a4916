//! Budget command handlers.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use crate::context::HandlerContext;
use crate::error::KernelError;
use crate::event::{Event, EventPayload, StreamType};
use crate::projections::Projections;

use super::commands::{
    ActivateBudget, AdjustAllocation, ApproveExpenditure, CloseBudget, CreateBudget,
};
use super::events::{
    AllocationAdjusted, AppliedAdjustment, BudgetActivated, BudgetClosed, BudgetCreated,
    ExpenditureApproved, ExpenditureRejected, RejectionGate,
};
use super::invariants;
use super::{BudgetItem, BudgetState, BudgetStatus};

/// Handles `CreateBudget`.
///
/// Guards: law exists, items non-empty with unique ids and non-negative
/// allocations, `budget_total = Σ allocated`.
///
/// # Errors
///
/// The corresponding [`KernelError`] validation variant per failed guard.
pub fn create_budget(
    command: &CreateBudget,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    if projections.laws.get(&command.law_id).is_none() {
        return Err(KernelError::UnknownAggregate {
            kind: "law",
            id: command.law_id.clone(),
        });
    }
    if command.items.is_empty() {
        return Err(KernelError::InvalidArgument {
            field: "items",
            reason: "a budget needs at least one item".to_string(),
        });
    }
    if !(1900..=2200).contains(&command.fiscal_year) {
        return Err(KernelError::InvalidArgument {
            field: "fiscal_year",
            reason: format!("{} is outside the supported range", command.fiscal_year),
        });
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut allocated_sum = Decimal::ZERO;
    for item in &command.items {
        if !seen.insert(item.item_id.as_str()) {
            return Err(KernelError::DuplicateItem {
                item_id: item.item_id.clone(),
            });
        }
        if item.allocated_amount < Decimal::ZERO {
            return Err(KernelError::InvalidArgument {
                field: "allocated_amount",
                reason: format!("item {} has a negative allocation", item.item_id),
            });
        }
        allocated_sum += item.allocated_amount;
    }

    if allocated_sum != command.budget_total {
        return Err(KernelError::BudgetBalanceViolation {
            budget_total: command.budget_total,
            new_total: allocated_sum,
            variance: allocated_sum - command.budget_total,
        });
    }

    let budget_id = ctx.ids.aggregate_id("bud");
    let items = command
        .items
        .iter()
        .map(|spec| BudgetItem {
            item_id: spec.item_id.clone(),
            name: spec.name.clone(),
            allocated_amount: spec.allocated_amount,
            spent_amount: Decimal::ZERO,
            flex_class: spec.flex_class,
            category: spec.category.clone(),
        })
        .collect();

    let payload = EventPayload::BudgetCreated(BudgetCreated {
        budget_id: budget_id.clone(),
        law_id: command.law_id.clone(),
        fiscal_year: command.fiscal_year,
        items,
        budget_total: command.budget_total,
        created_at: ctx.now,
        created_by: ctx.actor_id.map(str::to_string),
    });

    Ok(vec![ctx.event(budget_id, StreamType::Budget, 1, payload)])
}

/// Handles `ActivateBudget`: DRAFT → ACTIVE.
///
/// # Errors
///
/// [`KernelError::UnknownAggregate`] or
/// [`KernelError::IllegalStatusTransition`].
pub fn activate_budget(
    command: &ActivateBudget,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let budget = lookup(projections, &command.budget_id)?;
    require_status(budget, BudgetStatus::Draft, "activate")?;

    let payload = EventPayload::BudgetActivated(BudgetActivated {
        budget_id: command.budget_id.clone(),
        activated_at: ctx.now,
    });

    Ok(vec![ctx.event(
        command.budget_id.clone(),
        StreamType::Budget,
        budget.version + 1,
        payload,
    )])
}

/// Handles `AdjustAllocation` under the three gates, in order: item
/// existence + flex step-size per entry, zero-sum balance over the
/// merged batch, allocation floor per item.
///
/// # Errors
///
/// The corresponding [`KernelError`] per failed gate.
pub fn adjust_allocation(
    command: &AdjustAllocation,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let budget = lookup(projections, &command.budget_id)?;
    require_status(budget, BudgetStatus::Active, "adjust")?;

    if command.adjustments.is_empty() {
        return Err(KernelError::InvalidArgument {
            field: "adjustments",
            reason: "an adjustment batch cannot be empty".to_string(),
        });
    }

    // Gate 1, per entry as submitted.
    for adjustment in &command.adjustments {
        let item = budget.items.get(&adjustment.item_id).ok_or_else(|| {
            KernelError::UnknownAggregate {
                kind: "budget item",
                id: adjustment.item_id.clone(),
            }
        })?;
        invariants::validate_flex_step(
            item,
            adjustment.change_amount,
            &ctx.policy.budget_flex_limits,
        )?;
    }

    // Gates 2 and 3, over the merged batch.
    let merged = invariants::merge_adjustments(&command.adjustments);
    invariants::validate_balance(budget, &merged)?;
    for (item_id, change) in &merged {
        let item = &budget.items[item_id];
        invariants::validate_floor(item, item.allocated_amount + change)?;
    }

    let mut running: BTreeMap<String, Decimal> = BTreeMap::new();
    let applied = command
        .adjustments
        .iter()
        .map(|adjustment| {
            let item = &budget.items[&adjustment.item_id];
            let old_amount = item.allocated_amount
                + running
                    .get(&adjustment.item_id)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
            let new_amount = old_amount + adjustment.change_amount;
            *running
                .entry(adjustment.item_id.clone())
                .or_insert(Decimal::ZERO) += adjustment.change_amount;
            AppliedAdjustment {
                item_id: adjustment.item_id.clone(),
                old_amount,
                new_amount,
                change_amount: adjustment.change_amount,
            }
        })
        .collect();

    let payload = EventPayload::AllocationAdjusted(AllocationAdjusted {
        budget_id: command.budget_id.clone(),
        adjusted_at: ctx.now,
        adjustments: applied,
        reason: command.reason.clone(),
    });

    Ok(vec![ctx.event(
        command.budget_id.clone(),
        StreamType::Budget,
        budget.version + 1,
        payload,
    )])
}

/// Handles `ApproveExpenditure`.
///
/// Gate failures are not errors: they emit an `ExpenditureRejected`
/// event naming the gate, so refusals leave an audit trail. Gates run in
/// order: budget status, item existence, remaining allocation.
///
/// # Errors
///
/// [`KernelError::UnknownAggregate`] for a missing budget and
/// [`KernelError::InvalidArgument`] for a non-positive amount.
pub fn approve_expenditure(
    command: &ApproveExpenditure,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let budget = lookup(projections, &command.budget_id)?;

    if command.amount <= Decimal::ZERO {
        return Err(KernelError::InvalidArgument {
            field: "amount",
            reason: "expenditure amount must be positive".to_string(),
        });
    }

    let rejection = |gate: RejectionGate, reason: String| {
        EventPayload::ExpenditureRejected(ExpenditureRejected {
            budget_id: command.budget_id.clone(),
            item_id: command.item_id.clone(),
            amount: command.amount,
            purpose: command.purpose.clone(),
            rejected_at: ctx.now,
            gate,
            reason,
        })
    };

    let payload = if budget.status != BudgetStatus::Active {
        rejection(
            RejectionGate::BudgetStatus,
            format!("budget is {}", budget.status.as_str()),
        )
    } else if let Some(item) = budget.items.get(&command.item_id) {
        let remaining = item.remaining();
        if command.amount > remaining {
            rejection(
                RejectionGate::InsufficientBudget,
                format!("requested {} but only {remaining} remains", command.amount),
            )
        } else {
            EventPayload::ExpenditureApproved(ExpenditureApproved {
                budget_id: command.budget_id.clone(),
                item_id: command.item_id.clone(),
                expenditure_id: ctx.ids.aggregate_id("exp"),
                amount: command.amount,
                purpose: command.purpose.clone(),
                approved_at: ctx.now,
                remaining_after: remaining - command.amount,
            })
        }
    } else {
        rejection(
            RejectionGate::ItemNotFound,
            format!("no item {} in budget", command.item_id),
        )
    };

    Ok(vec![ctx.event(
        command.budget_id.clone(),
        StreamType::Budget,
        budget.version + 1,
        payload,
    )])
}

/// Handles `CloseBudget`: ACTIVE → CLOSED.
///
/// # Errors
///
/// [`KernelError::UnknownAggregate`] or
/// [`KernelError::IllegalStatusTransition`].
pub fn close_budget(
    command: &CloseBudget,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let budget = lookup(projections, &command.budget_id)?;
    require_status(budget, BudgetStatus::Active, "close")?;

    let final_allocated = budget.total_allocated();
    let final_spent = budget.total_spent();
    let payload = EventPayload::BudgetClosed(BudgetClosed {
        budget_id: command.budget_id.clone(),
        closed_at: ctx.now,
        final_allocated,
        final_spent,
        final_remaining: final_allocated - final_spent,
    });

    Ok(vec![ctx.event(
        command.budget_id.clone(),
        StreamType::Budget,
        budget.version + 1,
        payload,
    )])
}

fn lookup<'a>(
    projections: &'a Projections,
    budget_id: &str,
) -> Result<&'a BudgetState, KernelError> {
    projections
        .budgets
        .get(budget_id)
        .ok_or_else(|| KernelError::UnknownAggregate {
            kind: "budget",
            id: budget_id.to_string(),
        })
}

fn require_status(
    budget: &BudgetState,
    expected: BudgetStatus,
    operation: &'static str,
) -> Result<(), KernelError> {
    if budget.status == expected {
        Ok(())
    } else {
        Err(KernelError::IllegalStatusTransition {
            kind: "budget",
            from: budget.status.as_str().to_string(),
            operation,
        })
    }
}
