//! Procurement: suppliers, tenders, and discretion-free selection.
//!
//! Award decisions are algorithmic and auditable. Feasibility is a
//! pipeline of binary gates: a supplier passes all of them or is out;
//! there is no scoring. Selection over the feasible set is deterministic
//! given the recorded seed, so any award can be re-derived after the
//! fact.

mod commands;
mod events;
pub(crate) mod feasible;
pub(crate) mod handlers;
mod registry;
pub(crate) mod selection;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use commands::{
    AwardTender, CloseTender, CreateTender, EvaluateTender, OpenTender, RegisterSupplier,
};
pub use events::{
    ContractAwarded, Exclusion, SupplierRegistered, TenderAwarded, TenderClosed, TenderCreated,
    TenderEvaluated, TenderOpened,
};
pub use registry::{Contract, ContractRegistry, SupplierRegistry, TenderRegistry};

/// Constitutional selection mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionMechanism {
    /// Least-loaded supplier; ties broken by lexicographic id.
    Rotation,
    /// Seeded SHA-256 index into the id-sorted feasible set.
    Random,
    /// Restrict to near-least-loaded suppliers, then seeded random.
    Hybrid,
}

/// Tender lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenderStatus {
    /// Being prepared.
    Draft,
    /// Published; suppliers may be considered.
    Open,
    /// Feasible set computed; awaiting award.
    Evaluating,
    /// Awarded to a supplier.
    Awarded,
    /// Terminal.
    Closed,
}

impl TenderStatus {
    /// Stable name used in payloads and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Open => "OPEN",
            Self::Evaluating => "EVALUATING",
            Self::Awarded => "AWARDED",
            Self::Closed => "CLOSED",
        }
    }
}

/// Current state of a supplier aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierState {
    /// Aggregate identifier.
    pub supplier_id: String,
    /// Supplier name.
    pub name: String,
    /// Free-form type (company, cooperative, public agency, ...).
    pub supplier_type: String,
    /// Largest single contract value the supplier can take on.
    pub max_contract_value: Decimal,
    /// Held certifications.
    pub certifications: BTreeSet<String>,
    /// Years in business.
    pub years_in_business: u32,
    /// Delivery performance score in `[0, 1]`.
    pub reputation_score: f64,
    /// Cumulative value of awarded contracts; monotonically
    /// non-decreasing.
    pub total_value_awarded: Decimal,
    /// Registration instant.
    pub registered_at: DateTime<Utc>,
    /// Stream version of the last applied event.
    pub version: u64,
}

/// Current state of a tender aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderState {
    /// Aggregate identifier.
    pub tender_id: String,
    /// The law mandating this procurement.
    pub law_id: String,
    /// Tender title.
    pub title: String,
    /// Estimated contract value.
    pub estimated_value: Decimal,
    /// Certifications every feasible supplier must hold.
    pub required_capabilities: BTreeSet<String>,
    /// Minimum years in business, when required.
    pub min_years_experience: Option<u32>,
    /// Minimum reputation score, when required.
    pub min_reputation: Option<f64>,
    /// Selection mechanism fixed at creation.
    pub selection_mechanism: SelectionMechanism,
    /// Lifecycle status.
    pub status: TenderStatus,
    /// Winning supplier, once awarded.
    pub awarded_supplier_id: Option<String>,
    /// Award instant.
    pub awarded_at: Option<DateTime<Utc>>,
    /// Seed recorded at award for reproducibility.
    pub seed: Option<String>,
    /// Feasible supplier ids computed at evaluation.
    pub feasible_set: Option<Vec<String>>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Stream version of the last applied event.
    pub version: u64,
}
