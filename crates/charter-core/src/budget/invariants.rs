//! Budget invariants: the adjustment gates.
//!
//! All arithmetic is exact decimal. The zero-sum and boundary tests
//! (`5.000000%` accepted, `5.000001%` rejected, cut-to-spent accepted)
//! hold without epsilon because nothing here touches binary floats.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::KernelError;
use crate::policy::FlexLimits;

use super::commands::AdjustmentSpec;
use super::{BudgetItem, BudgetState};

/// Gate 1: a single adjustment may move an item's allocation by at most
/// its flex-class ceiling, measured as `|change| / allocated`.
///
/// Items with a zero allocation cannot be adjusted at all: the ratio is
/// undefined and an unbounded step would bypass the ceiling entirely.
///
/// # Errors
///
/// Returns [`KernelError::FlexStepSizeViolation`].
pub fn validate_flex_step(
    item: &BudgetItem,
    change_amount: Decimal,
    limits: &FlexLimits,
) -> Result<(), KernelError> {
    let ceiling = item.flex_class.ceiling(limits);

    if item.allocated_amount.is_zero() {
        return Err(KernelError::FlexStepSizeViolation {
            item_id: item.item_id.clone(),
            flex_class: item.flex_class.as_str(),
            change_ratio: Decimal::ONE,
            max_ratio: ceiling,
        });
    }

    let change_ratio = (change_amount / item.allocated_amount).abs();
    if change_ratio > ceiling {
        return Err(KernelError::FlexStepSizeViolation {
            item_id: item.item_id.clone(),
            flex_class: item.flex_class.as_str(),
            change_ratio,
            max_ratio: ceiling,
        });
    }
    Ok(())
}

/// Gate 2: the batch must keep `Σ allocated = budget_total` exactly.
///
/// # Errors
///
/// Returns [`KernelError::BudgetBalanceViolation`] carrying the would-be
/// total and variance.
pub fn validate_balance(
    budget: &BudgetState,
    merged_changes: &BTreeMap<String, Decimal>,
) -> Result<(), KernelError> {
    let new_total: Decimal = budget
        .items
        .iter()
        .map(|(item_id, item)| {
            item.allocated_amount + merged_changes.get(item_id).copied().unwrap_or(Decimal::ZERO)
        })
        .sum();

    if new_total != budget.budget_total {
        return Err(KernelError::BudgetBalanceViolation {
            budget_total: budget.budget_total,
            new_total,
            variance: new_total - budget.budget_total,
        });
    }
    Ok(())
}

/// Gate 3: no item may end below what it has already spent.
///
/// # Errors
///
/// Returns [`KernelError::AllocationBelowSpending`].
pub fn validate_floor(
    item: &BudgetItem,
    new_allocation: Decimal,
) -> Result<(), KernelError> {
    if new_allocation < item.spent_amount {
        return Err(KernelError::AllocationBelowSpending {
            item_id: item.item_id.clone(),
            new_allocation,
            spent: item.spent_amount,
        });
    }
    Ok(())
}

/// Sums a batch per item, preserving nothing but the net change.
#[must_use]
pub fn merge_adjustments(adjustments: &[AdjustmentSpec]) -> BTreeMap<String, Decimal> {
    let mut merged: BTreeMap<String, Decimal> = BTreeMap::new();
    for adjustment in adjustments {
        *merged
            .entry(adjustment.item_id.clone())
            .or_insert(Decimal::ZERO) += adjustment.change_amount;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::FlexClass;

    fn item(id: &str, allocated: &str, spent: &str, class: FlexClass) -> BudgetItem {
        BudgetItem {
            item_id: id.to_string(),
            name: id.to_string(),
            allocated_amount: allocated.parse().unwrap(),
            spent_amount: spent.parse().unwrap(),
            flex_class: class,
            category: "general".to_string(),
        }
    }

    // =========================================================================
    // Flex step size
    // =========================================================================

    #[test]
    fn exact_ceiling_is_accepted() {
        let limits = FlexLimits::default();
        let critical = item("x", "500000", "0", FlexClass::Critical);
        // 25000 / 500000 = exactly 5%.
        assert!(validate_flex_step(&critical, "-25000".parse().unwrap(), &limits).is_ok());
    }

    #[test]
    fn one_millionth_over_the_ceiling_is_rejected() {
        let limits = FlexLimits::default();
        let critical = item("x", "100000000", "0", FlexClass::Critical);
        // 5.000001% of 100_000_000.
        let err = validate_flex_step(&critical, "5000001".parse().unwrap(), &limits);
        assert!(matches!(err, Err(KernelError::FlexStepSizeViolation { .. })));
    }

    #[test]
    fn ceilings_follow_the_flex_class() {
        let limits = FlexLimits::default();
        let important = item("y", "200000", "0", FlexClass::Important);
        assert!(validate_flex_step(&important, "30000".parse().unwrap(), &limits).is_ok());
        assert!(validate_flex_step(&important, "30001".parse().unwrap(), &limits).is_err());

        let aspirational = item("z", "200000", "0", FlexClass::Aspirational);
        assert!(validate_flex_step(&aspirational, "100000".parse().unwrap(), &limits).is_ok());
    }

    #[test]
    fn zero_allocation_cannot_be_adjusted() {
        let limits = FlexLimits::default();
        let empty = item("x", "0", "0", FlexClass::Aspirational);
        assert!(matches!(
            validate_flex_step(&empty, "1".parse().unwrap(), &limits),
            Err(KernelError::FlexStepSizeViolation { .. })
        ));
    }

    // =========================================================================
    // Balance and floor
    // =========================================================================

    fn budget_of(items: Vec<BudgetItem>) -> BudgetState {
        let total = items.iter().map(|i| i.allocated_amount).sum();
        BudgetState {
            budget_id: "b-1".to_string(),
            law_id: "law-1".to_string(),
            fiscal_year: 2025,
            items: items.into_iter().map(|i| (i.item_id.clone(), i)).collect(),
            budget_total: total,
            status: crate::budget::BudgetStatus::Active,
            created_at: chrono::DateTime::UNIX_EPOCH,
            activated_at: None,
            closed_at: None,
            version: 1,
        }
    }

    #[test]
    fn zero_sum_batch_balances() {
        let budget = budget_of(vec![
            item("x", "500000", "0", FlexClass::Critical),
            item("y", "200000", "0", FlexClass::Important),
        ]);
        let merged = merge_adjustments(&[
            AdjustmentSpec {
                item_id: "x".to_string(),
                change_amount: "-25000".parse().unwrap(),
            },
            AdjustmentSpec {
                item_id: "y".to_string(),
                change_amount: "25000".parse().unwrap(),
            },
        ]);
        assert!(validate_balance(&budget, &merged).is_ok());
    }

    #[test]
    fn one_unit_of_drift_violates_balance() {
        let budget = budget_of(vec![
            item("x", "500000", "0", FlexClass::Critical),
            item("y", "200000", "0", FlexClass::Important),
        ]);
        let merged = merge_adjustments(&[
            AdjustmentSpec {
                item_id: "x".to_string(),
                change_amount: "-25000".parse().unwrap(),
            },
            AdjustmentSpec {
                item_id: "y".to_string(),
                change_amount: "25001".parse().unwrap(),
            },
        ]);
        let err = validate_balance(&budget, &merged);
        assert!(matches!(
            err,
            Err(KernelError::BudgetBalanceViolation { variance, .. }) if variance == Decimal::ONE
        ));
    }

    #[test]
    fn cutting_to_exactly_spent_is_allowed() {
        let spent_item = item("x", "1000", "400", FlexClass::Aspirational);
        assert!(validate_floor(&spent_item, "400".parse().unwrap()).is_ok());
        assert!(matches!(
            validate_floor(&spent_item, "399.99".parse().unwrap()),
            Err(KernelError::AllocationBelowSpending { .. })
        ));
    }

    #[test]
    fn duplicate_entries_merge_before_balancing() {
        let merged = merge_adjustments(&[
            AdjustmentSpec {
                item_id: "x".to_string(),
                change_amount: "-10".parse().unwrap(),
            },
            AdjustmentSpec {
                item_id: "x".to_string(),
                change_amount: "10".parse().unwrap(),
            },
        ]);
        assert_eq!(merged["x"], Decimal::ZERO);
    }
}
