//! Procurement events.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SelectionMechanism;

/// A supplier was registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRegistered {
    /// The new supplier's id.
    pub supplier_id: String,
    /// Supplier name.
    pub name: String,
    /// Free-form type.
    pub supplier_type: String,
    /// Largest single contract value the supplier can take on.
    pub max_contract_value: Decimal,
    /// Held certifications.
    pub certifications: BTreeSet<String>,
    /// Years in business.
    pub years_in_business: u32,
    /// Delivery performance score in `[0, 1]`.
    pub reputation_score: f64,
    /// Registration instant.
    pub registered_at: DateTime<Utc>,
}

/// A tender was created in DRAFT status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderCreated {
    /// The new tender's id.
    pub tender_id: String,
    /// The law mandating this procurement.
    pub law_id: String,
    /// Tender title.
    pub title: String,
    /// Estimated contract value.
    pub estimated_value: Decimal,
    /// Required certifications.
    pub required_capabilities: BTreeSet<String>,
    /// Minimum years in business, when required.
    pub min_years_experience: Option<u32>,
    /// Minimum reputation score, when required.
    pub min_reputation: Option<f64>,
    /// Selection mechanism.
    pub selection_mechanism: SelectionMechanism,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// A tender moved from DRAFT to OPEN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderOpened {
    /// The opened tender.
    pub tender_id: String,
    /// Opening instant.
    pub opened_at: DateTime<Utc>,
}

/// A supplier excluded from a feasible set, with the gates it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    /// The excluded supplier.
    pub supplier_id: String,
    /// One entry per failed gate.
    pub reasons: Vec<String>,
}

/// The feasible set was computed (OPEN → EVALUATING).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderEvaluated {
    /// The evaluated tender.
    pub tender_id: String,
    /// Evaluation instant.
    pub evaluated_at: DateTime<Utc>,
    /// Supplier ids that passed every gate, sorted.
    pub feasible_set: Vec<String>,
    /// Suppliers that failed, with reasons.
    pub excluded: Vec<Exclusion>,
}

/// A supplier was selected and the tender awarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderAwarded {
    /// The awarded tender.
    pub tender_id: String,
    /// The winning supplier.
    pub supplier_id: String,
    /// Mechanism that made the selection.
    pub mechanism: SelectionMechanism,
    /// Seed used, recorded for reproducibility (`None` for ROTATION).
    pub seed: Option<String>,
    /// Award instant.
    pub awarded_at: DateTime<Utc>,
    /// Size of the feasible set the selection ran over.
    pub feasible_count: u64,
}

/// A contract was recorded against the winning supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAwarded {
    /// The new contract's id.
    pub contract_id: String,
    /// The tender it fulfils.
    pub tender_id: String,
    /// The law mandating the procurement.
    pub law_id: String,
    /// The winning supplier.
    pub supplier_id: String,
    /// Contract value.
    pub value: Decimal,
    /// Award instant.
    pub awarded_at: DateTime<Utc>,
}

/// An awarded tender was closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderClosed {
    /// The closed tender.
    pub tender_id: String,
    /// Closing instant.
    pub closed_at: DateTime<Utc>,
}
