//! Feasible set computation: binary gates, no scoring.
//!
//! A supplier is feasible when it passes every gate (capacity,
//! certification, experience, reputation), in that order. Failures are
//! collected per supplier so exclusions are auditable.

use super::events::Exclusion;
use super::{SupplierState, TenderState};

/// Computes the feasible set for a tender over the given suppliers.
///
/// Suppliers must be supplied in a deterministic order (the registry
/// iterates its ordered map); the returned feasible ids preserve it.
#[must_use]
pub fn compute_feasible_set<'a, I>(tender: &TenderState, suppliers: I) -> (Vec<String>, Vec<Exclusion>)
where
    I: Iterator<Item = &'a SupplierState>,
{
    let mut feasible = Vec::new();
    let mut excluded = Vec::new();

    for supplier in suppliers {
        let reasons = gate_failures(tender, supplier);
        if reasons.is_empty() {
            feasible.push(supplier.supplier_id.clone());
        } else {
            excluded.push(Exclusion {
                supplier_id: supplier.supplier_id.clone(),
                reasons,
            });
        }
    }

    (feasible, excluded)
}

/// Runs every gate for one supplier and returns the failures.
fn gate_failures(tender: &TenderState, supplier: &SupplierState) -> Vec<String> {
    let mut reasons = Vec::new();

    if supplier.max_contract_value < tender.estimated_value {
        reasons.push(format!(
            "contract capacity {} below estimated value {}",
            supplier.max_contract_value, tender.estimated_value
        ));
    }

    for capability in &tender.required_capabilities {
        if !supplier.certifications.contains(capability) {
            reasons.push(format!("missing certification: {capability}"));
        }
    }

    if let Some(min_years) = tender.min_years_experience {
        if supplier.years_in_business < min_years {
            reasons.push(format!(
                "{} years in business, {min_years} required",
                supplier.years_in_business
            ));
        }
    }

    if let Some(min_reputation) = tender.min_reputation {
        if supplier.reputation_score < min_reputation {
            reasons.push(format!(
                "reputation {:.2} below required {min_reputation:.2}",
                supplier.reputation_score
            ));
        }
    }

    reasons
}
