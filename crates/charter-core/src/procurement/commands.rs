//! Procurement commands.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SelectionMechanism;

/// Registers a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterSupplier {
    /// Supplier name; must be non-empty.
    pub name: String,
    /// Free-form type.
    pub supplier_type: String,
    /// Largest single contract value the supplier can take on.
    pub max_contract_value: Decimal,
    /// Held certifications.
    #[serde(default)]
    pub certifications: BTreeSet<String>,
    /// Years in business.
    pub years_in_business: u32,
    /// Delivery performance score in `[0, 1]`.
    pub reputation_score: f64,
}

/// Creates a tender for a law.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTender {
    /// The law mandating this procurement.
    pub law_id: String,
    /// Tender title; must be non-empty.
    pub title: String,
    /// Estimated contract value.
    pub estimated_value: Decimal,
    /// Certifications every feasible supplier must hold.
    #[serde(default)]
    pub required_capabilities: BTreeSet<String>,
    /// Minimum years in business, when required.
    #[serde(default)]
    pub min_years_experience: Option<u32>,
    /// Minimum reputation score, when required.
    #[serde(default)]
    pub min_reputation: Option<f64>,
    /// Selection mechanism, fixed for the tender's lifetime.
    pub selection_mechanism: SelectionMechanism,
}

/// Opens a tender (DRAFT → OPEN).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTender {
    /// Tender to open.
    pub tender_id: String,
}

/// Computes the feasible set (OPEN → EVALUATING).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluateTender {
    /// Tender to evaluate.
    pub tender_id: String,
}

/// Awards the tender to a deterministically selected supplier
/// (EVALUATING → AWARDED).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardTender {
    /// Tender to award.
    pub tender_id: String,
    /// Selection seed; required for RANDOM and HYBRID mechanisms and
    /// recorded in the award event.
    #[serde(default)]
    pub seed: Option<String>,
}

/// Closes an awarded tender. Terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseTender {
    /// Tender to close.
    pub tender_id: String,
}
