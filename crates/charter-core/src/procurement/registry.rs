//! Supplier, tender, and contract registry projections.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::events::{
    ContractAwarded, SupplierRegistered, TenderAwarded, TenderClosed, TenderCreated,
    TenderEvaluated, TenderOpened,
};
use super::{SupplierState, TenderState, TenderStatus};

/// Materialized view of all suppliers, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct SupplierRegistry {
    suppliers: BTreeMap<String, SupplierState>,
}

impl SupplierRegistry {
    /// Looks up a supplier by id.
    #[must_use]
    pub fn get(&self, supplier_id: &str) -> Option<&SupplierState> {
        self.suppliers.get(supplier_id)
    }

    /// All suppliers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SupplierState> {
        self.suppliers.values()
    }

    /// Number of registered suppliers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    /// Whether no supplier is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }

    /// Awarded totals per supplier, for concentration metrics.
    #[must_use]
    pub fn awarded_totals(&self) -> Vec<Decimal> {
        self.suppliers
            .values()
            .map(|s| s.total_value_awarded)
            .collect()
    }

    pub(crate) fn apply_registered(&mut self, payload: &SupplierRegistered, version: u64) {
        self.suppliers.insert(
            payload.supplier_id.clone(),
            SupplierState {
                supplier_id: payload.supplier_id.clone(),
                name: payload.name.clone(),
                supplier_type: payload.supplier_type.clone(),
                max_contract_value: payload.max_contract_value,
                certifications: payload.certifications.clone(),
                years_in_business: payload.years_in_business,
                reputation_score: payload.reputation_score,
                total_value_awarded: Decimal::ZERO,
                registered_at: payload.registered_at,
                version,
            },
        );
    }

    pub(crate) fn apply_contract_awarded(&mut self, payload: &ContractAwarded) {
        if let Some(supplier) = self.suppliers.get_mut(&payload.supplier_id) {
            supplier.total_value_awarded += payload.value;
        }
    }
}

/// Materialized view of all tenders, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct TenderRegistry {
    tenders: BTreeMap<String, TenderState>,
}

impl TenderRegistry {
    /// Looks up a tender by id.
    #[must_use]
    pub fn get(&self, tender_id: &str) -> Option<&TenderState> {
        self.tenders.get(tender_id)
    }

    /// Tenders in a given status.
    pub fn list_by_status(&self, status: TenderStatus) -> impl Iterator<Item = &TenderState> {
        self.tenders.values().filter(move |t| t.status == status)
    }

    pub(crate) fn apply_created(&mut self, payload: &TenderCreated, version: u64) {
        self.tenders.insert(
            payload.tender_id.clone(),
            TenderState {
                tender_id: payload.tender_id.clone(),
                law_id: payload.law_id.clone(),
                title: payload.title.clone(),
                estimated_value: payload.estimated_value,
                required_capabilities: payload.required_capabilities.clone(),
                min_years_experience: payload.min_years_experience,
                min_reputation: payload.min_reputation,
                selection_mechanism: payload.selection_mechanism,
                status: TenderStatus::Draft,
                awarded_supplier_id: None,
                awarded_at: None,
                seed: None,
                feasible_set: None,
                created_at: payload.created_at,
                version,
            },
        );
    }

    pub(crate) fn apply_opened(&mut self, payload: &TenderOpened, version: u64) {
        if let Some(tender) = self.tenders.get_mut(&payload.tender_id) {
            tender.status = TenderStatus::Open;
            tender.version = version;
        }
    }

    pub(crate) fn apply_evaluated(&mut self, payload: &TenderEvaluated, version: u64) {
        if let Some(tender) = self.tenders.get_mut(&payload.tender_id) {
            tender.status = TenderStatus::Evaluating;
            tender.feasible_set = Some(payload.feasible_set.clone());
            tender.version = version;
        }
    }

    pub(crate) fn apply_awarded(&mut self, payload: &TenderAwarded, version: u64) {
        if let Some(tender) = self.tenders.get_mut(&payload.tender_id) {
            tender.status = TenderStatus::Awarded;
            tender.awarded_supplier_id = Some(payload.supplier_id.clone());
            tender.awarded_at = Some(payload.awarded_at);
            tender.seed = payload.seed.clone();
            tender.version = version;
        }
    }

    /// The contract event rides the tender stream and advances its
    /// version without further state change.
    pub(crate) fn apply_contract_awarded(&mut self, payload: &ContractAwarded, version: u64) {
        if let Some(tender) = self.tenders.get_mut(&payload.tender_id) {
            tender.version = version;
        }
    }

    pub(crate) fn apply_closed(&mut self, payload: &TenderClosed, version: u64) {
        if let Some(tender) = self.tenders.get_mut(&payload.tender_id) {
            tender.status = TenderStatus::Closed;
            tender.version = version;
        }
    }
}

/// A contract recorded from a tender award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    /// Contract identifier.
    pub contract_id: String,
    /// Fulfilled tender.
    pub tender_id: String,
    /// The law mandating the procurement.
    pub law_id: String,
    /// Winning supplier.
    pub supplier_id: String,
    /// Contract value.
    pub value: Decimal,
    /// Award instant.
    pub awarded_at: DateTime<Utc>,
}

/// Materialized view of all contracts, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct ContractRegistry {
    contracts: BTreeMap<String, Contract>,
}

impl ContractRegistry {
    /// Looks up a contract by id.
    #[must_use]
    pub fn get(&self, contract_id: &str) -> Option<&Contract> {
        self.contracts.get(contract_id)
    }

    /// All contracts in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.values()
    }

    /// Contracts awarded to one supplier.
    pub fn for_supplier<'a>(
        &'a self,
        supplier_id: &'a str,
    ) -> impl Iterator<Item = &'a Contract> {
        self.contracts
            .values()
            .filter(move |c| c.supplier_id == supplier_id)
    }

    pub(crate) fn apply_awarded(&mut self, payload: &ContractAwarded) {
        self.contracts.insert(
            payload.contract_id.clone(),
            Contract {
                contract_id: payload.contract_id.clone(),
                tender_id: payload.tender_id.clone(),
                law_id: payload.law_id.clone(),
                supplier_id: payload.supplier_id.clone(),
                value: payload.value,
                awarded_at: payload.awarded_at,
            },
        );
    }
}
