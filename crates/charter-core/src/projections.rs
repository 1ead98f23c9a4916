//! Materialized read models and their replay routing.
//!
//! [`Projections`] bundles every registry and dispatches each event to
//! the registries that care. The match is exhaustive over the payload
//! union: adding an event type without wiring its projection is a
//! compile error, and replaying an unknown type already failed at
//! decode time inside the ledger.

use crate::budget::{BudgetRegistry, ExpenditureLog};
use crate::delegation::DelegationGraph;
use crate::event::{Event, EventPayload};
use crate::law::LawRegistry;
use crate::procurement::{ContractRegistry, SupplierRegistry, TenderRegistry};
use crate::tick::SafetyEventLog;
use crate::workspace::WorkspaceRegistry;

/// All read models, owned by the façade and mutated only on its thread.
#[derive(Debug, Default, Clone)]
pub struct Projections {
    /// Workspace registry.
    pub workspaces: WorkspaceRegistry,
    /// Delegation graph.
    pub delegations: DelegationGraph,
    /// Law registry.
    pub laws: LawRegistry,
    /// Budget registry.
    pub budgets: BudgetRegistry,
    /// Expenditure audit log.
    pub expenditures: ExpenditureLog,
    /// Supplier registry.
    pub suppliers: SupplierRegistry,
    /// Tender registry.
    pub tenders: TenderRegistry,
    /// Contract registry.
    pub contracts: ContractRegistry,
    /// Reflex event log (tick dedup + halt latch).
    pub safety_log: SafetyEventLog,
}

impl Projections {
    /// Applies one event. Idempotent re-application is safe because
    /// registries key state by aggregate id and track versions.
    pub fn apply(&mut self, event: &Event) {
        let version = event.version;
        match &event.payload {
            EventPayload::WorkspaceCreated(p) => self.workspaces.apply_created(p, version),
            EventPayload::WorkspaceArchived(p) => self.workspaces.apply_archived(p, version),

            EventPayload::DecisionRightDelegated(p) => {
                self.delegations.apply_delegated(p, version);
            },
            EventPayload::DelegationRenewed(p) => self.delegations.apply_renewed(p, version),
            EventPayload::DelegationRevoked(p) => self.delegations.apply_revoked(p, version),
            EventPayload::DelegationExpired(p) => self.delegations.apply_expired(p, version),

            EventPayload::LawCreated(p) => self.laws.apply_created(p, version),
            EventPayload::LawActivated(p) => self.laws.apply_activated(p, version),
            EventPayload::LawReviewTriggered(p) => {
                self.laws.apply_review_triggered(p, version);
            },
            EventPayload::LawReviewCompleted(p) => {
                self.laws.apply_review_completed(p, version);
            },
            EventPayload::LawArchived(p) => self.laws.apply_archived(p, version),

            EventPayload::BudgetCreated(p) => self.budgets.apply_created(p, version),
            EventPayload::BudgetActivated(p) => self.budgets.apply_activated(p, version),
            EventPayload::AllocationAdjusted(p) => self.budgets.apply_adjusted(p, version),
            EventPayload::ExpenditureApproved(p) => {
                self.budgets.apply_expenditure_approved(p, version);
                self.expenditures.apply_approved(p);
            },
            EventPayload::ExpenditureRejected(p) => {
                self.budgets.apply_expenditure_rejected(p, version);
                self.expenditures.apply_rejected(p);
            },
            EventPayload::BudgetClosed(p) => self.budgets.apply_closed(p, version),

            EventPayload::SupplierRegistered(p) => self.suppliers.apply_registered(p, version),
            EventPayload::TenderCreated(p) => self.tenders.apply_created(p, version),
            EventPayload::TenderOpened(p) => self.tenders.apply_opened(p, version),
            EventPayload::TenderEvaluated(p) => self.tenders.apply_evaluated(p, version),
            EventPayload::TenderAwarded(p) => self.tenders.apply_awarded(p, version),
            EventPayload::ContractAwarded(p) => {
                self.tenders.apply_contract_awarded(p, version);
                self.suppliers.apply_contract_awarded(p);
                self.contracts.apply_awarded(p);
            },
            EventPayload::TenderClosed(p) => self.tenders.apply_closed(p, version),

            EventPayload::SystemTick(p) => {
                self.safety_log
                    .record("SystemTick", &event.stream_id, "global", p.tick_at);
            },
            EventPayload::DelegationConcentrationWarning(p) => {
                self.safety_log.record(
                    "DelegationConcentrationWarning",
                    &event.stream_id,
                    "global",
                    p.triggered_at,
                );
            },
            EventPayload::DelegationConcentrationHalt(p) => {
                self.safety_log.record(
                    "DelegationConcentrationHalt",
                    &event.stream_id,
                    "global",
                    p.triggered_at,
                );
            },
            EventPayload::TransparencyEscalated(p) => {
                self.safety_log.record(
                    "TransparencyEscalated",
                    &event.stream_id,
                    "global",
                    p.escalated_at,
                );
            },
            EventPayload::BudgetBalanceViolationDetected(p) => {
                self.safety_log.record(
                    "BudgetBalanceViolationDetected",
                    &event.stream_id,
                    &p.budget_id,
                    p.detected_at,
                );
            },
            EventPayload::BudgetOverspendDetected(p) => {
                let subject = format!("{}/{}", p.budget_id, p.item_id);
                self.safety_log.record(
                    "BudgetOverspendDetected",
                    &event.stream_id,
                    &subject,
                    p.detected_at,
                );
            },
            EventPayload::SupplierConcentrationWarning(p) => {
                self.safety_log.record(
                    "SupplierConcentrationWarning",
                    &event.stream_id,
                    "global",
                    p.triggered_at,
                );
            },
            EventPayload::SupplierConcentrationHalt(p) => {
                self.safety_log.record(
                    "SupplierConcentrationHalt",
                    &event.stream_id,
                    "global",
                    p.triggered_at,
                );
            },
        }
    }

    /// Replays a sequence of events in order.
    pub fn apply_all<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a Event>,
    {
        for event in events {
            self.apply(event);
        }
    }
}
