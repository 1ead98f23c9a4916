//! Tests for the tick engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::DateTime;
use rust_decimal::Decimal;

use crate::budget::{
    BudgetActivated, BudgetCreated, BudgetItem, ExpenditureApproved, FlexClass,
};
use crate::clock::VirtualClock;
use crate::event::{Event, EventPayload, StreamType};
use crate::ids::{self, IdGenerator};
use crate::kernel::{Charter, Command, CommandEnvelope};
use crate::law::{ActivateLaw, CreateLaw, LawStatus, Reversibility};
use crate::ledger::{EventStore, SqliteEventStore};
use crate::metrics::RiskLevel;
use crate::policy::SafetyPolicy;
use crate::workspace::CreateWorkspace;

fn kernel_with(policy: SafetyPolicy) -> (Charter, Arc<VirtualClock>) {
    let clock = Arc::new(VirtualClock::new());
    let charter = Charter::in_memory(policy, clock.clone()).expect("in-memory kernel");
    (charter, clock)
}

fn workspace(charter: &mut Charter) -> String {
    let events = charter
        .execute(&CommandEnvelope::new(Command::CreateWorkspace(
            CreateWorkspace {
                name: "Civic".to_string(),
                parent_workspace_id: None,
                scope: BTreeMap::new(),
            },
        )))
        .unwrap();
    events[0].stream_id.clone()
}

fn delegate(charter: &mut Charter, ws: &str, from: &str, to: &str, ttl_days: u32) {
    charter
        .execute(
            &CommandEnvelope::new(Command::DelegateDecisionRight(
                crate::delegation::DelegateDecisionRight {
                    workspace_id: ws.to_string(),
                    from_actor: from.to_string(),
                    to_actor: to.to_string(),
                    ttl_days,
                    visibility: None,
                    purpose_tag: None,
                },
            ))
            .by(from),
        )
        .unwrap();
}

// =========================================================================
// Rule 1: expiry
// =========================================================================

#[test]
fn expired_delegations_are_swept() {
    let (mut charter, clock) = kernel_with(SafetyPolicy::default());
    let ws = workspace(&mut charter);
    delegate(&mut charter, &ws, "alice", "bob", 30);

    clock.advance_days(31);
    let report = charter.tick().unwrap();

    assert!(
        report
            .events
            .iter()
            .any(|e| e.event_type() == "DelegationExpired")
    );
    assert!(
        charter
            .projections()
            .delegations
            .active_edges(charter.now())
            .is_empty()
    );
}

#[test]
fn unexpired_delegations_survive_the_sweep() {
    let (mut charter, clock) = kernel_with(SafetyPolicy::default());
    let ws = workspace(&mut charter);
    delegate(&mut charter, &ws, "alice", "bob", 30);

    clock.advance_days(29);
    let report = charter.tick().unwrap();

    assert!(
        !report
            .events
            .iter()
            .any(|e| e.event_type() == "DelegationExpired")
    );
    assert_eq!(
        charter
            .projections()
            .delegations
            .active_edges(charter.now())
            .len(),
        1
    );
}

// =========================================================================
// Rule 2: checkpoint overrun
// =========================================================================

#[test]
fn overdue_laws_are_forced_into_review() {
    let (mut charter, clock) = kernel_with(SafetyPolicy::default());
    let ws = workspace(&mut charter);

    let created = charter
        .execute(&CommandEnvelope::new(Command::CreateLaw(CreateLaw {
            workspace_id: ws,
            title: "Care Pilot".to_string(),
            scope: BTreeMap::new(),
            reversibility: Reversibility::SemiReversible,
            checkpoints: vec![30, 90],
            params: BTreeMap::new(),
        })))
        .unwrap();
    let law_id = created[0].stream_id.clone();
    charter
        .execute(&CommandEnvelope::new(Command::ActivateLaw(ActivateLaw {
            law_id: law_id.clone(),
        })))
        .unwrap();

    clock.advance_days(31);
    let report = charter.tick().unwrap();

    assert!(
        report
            .events
            .iter()
            .any(|e| e.event_type() == "LawReviewTriggered")
    );
    assert_eq!(
        charter.projections().laws.get(&law_id).unwrap().status,
        LawStatus::Review
    );
    assert_eq!(report.health.law_review.overdue_reviews, 0);
}

// =========================================================================
// Rule 3: delegation concentration
// =========================================================================

fn tight_policy() -> SafetyPolicy {
    SafetyPolicy {
        delegation_in_degree_warn: 3,
        delegation_in_degree_halt: 5,
        ..SafetyPolicy::default()
    }
}

#[test]
fn concentration_warns_between_thresholds() {
    let (mut charter, _clock) = kernel_with(tight_policy());
    let ws = workspace(&mut charter);
    for i in 0..3 {
        delegate(&mut charter, &ws, &format!("actor{i}"), "hub", 30);
    }

    let report = charter.tick().unwrap();
    assert!(report.has_warnings());
    assert!(!report.has_halts());
    assert_eq!(report.health.risk_level, RiskLevel::Yellow);
}

#[test]
fn concentration_halts_at_the_halt_threshold() {
    let (mut charter, _clock) = kernel_with(tight_policy());
    let ws = workspace(&mut charter);
    for i in 0..5 {
        delegate(&mut charter, &ws, &format!("actor{i}"), "hub", 30);
    }

    let report = charter.tick().unwrap();
    assert!(report.has_halts());
    let types: Vec<&str> = report.events.iter().map(Event::event_type).collect();
    assert!(types.contains(&"DelegationConcentrationHalt"));
    assert!(types.contains(&"TransparencyEscalated"));
    assert_eq!(report.health.risk_level, RiskLevel::Red);
    assert!(charter.projections().safety_log.delegation_halt_latched());
}

#[test]
fn expiry_runs_before_concentration() {
    // Edges that expire at this tick must not count toward the halt.
    let (mut charter, clock) = kernel_with(tight_policy());
    let ws = workspace(&mut charter);
    for i in 0..5 {
        delegate(&mut charter, &ws, &format!("actor{i}"), "hub", 10);
    }

    clock.advance_days(11);
    let report = charter.tick().unwrap();
    assert!(!report.has_halts());
    assert_eq!(
        report
            .events
            .iter()
            .filter(|e| e.event_type() == "DelegationExpired")
            .count(),
        5
    );
}

// =========================================================================
// Idempotence
// =========================================================================

#[test]
fn a_second_tick_at_the_same_instant_emits_nothing() {
    let (mut charter, clock) = kernel_with(tight_policy());
    let ws = workspace(&mut charter);
    for i in 0..5 {
        delegate(&mut charter, &ws, &format!("actor{i}"), "hub", 30);
    }
    clock.advance_days(1);

    let first = charter.tick().unwrap();
    assert!(!first.events.is_empty());

    let second = charter.tick().unwrap();
    assert!(
        second.events.is_empty(),
        "second tick emitted {:?}",
        second
            .events
            .iter()
            .map(Event::event_type)
            .collect::<Vec<_>>()
    );
}

// =========================================================================
// Rules 4 and 5: budget audits (corrupt-state detection)
// =========================================================================

fn crafted_event(
    ids: &IdGenerator,
    stream_id: &str,
    stream_type: StreamType,
    version: u64,
    payload: EventPayload,
) -> Event {
    Event {
        event_id: ids.event_id(),
        stream_id: stream_id.to_string(),
        stream_type,
        version,
        command_id: ids::command_id(),
        occurred_at: DateTime::UNIX_EPOCH,
        actor_id: None,
        payload,
    }
}

fn item(id: &str, allocated: i64, spent: i64) -> BudgetItem {
    BudgetItem {
        item_id: id.to_string(),
        name: id.to_string(),
        allocated_amount: Decimal::from(allocated),
        spent_amount: Decimal::from(spent),
        flex_class: FlexClass::Important,
        category: "general".to_string(),
    }
}

#[test]
fn unbalanced_budgets_are_reported() {
    // The write path guards balance, so corruption is planted directly
    // in the log: a created event whose total disagrees with its items.
    let store = SqliteEventStore::in_memory().unwrap();
    let clock = Arc::new(VirtualClock::new());
    let ids = IdGenerator::new(clock.clone());

    store
        .append(
            "bud-1",
            0,
            &[
                crafted_event(
                    &ids,
                    "bud-1",
                    StreamType::Budget,
                    1,
                    EventPayload::BudgetCreated(BudgetCreated {
                        budget_id: "bud-1".to_string(),
                        law_id: "law-1".to_string(),
                        fiscal_year: 2025,
                        items: vec![item("x", 1000, 0)],
                        budget_total: Decimal::from(900),
                        created_at: DateTime::UNIX_EPOCH,
                        created_by: None,
                    }),
                ),
                crafted_event(
                    &ids,
                    "bud-1",
                    StreamType::Budget,
                    2,
                    EventPayload::BudgetActivated(BudgetActivated {
                        budget_id: "bud-1".to_string(),
                        activated_at: DateTime::UNIX_EPOCH,
                    }),
                ),
            ],
        )
        .unwrap();

    let mut charter =
        Charter::with_store(Box::new(store), SafetyPolicy::default(), clock).unwrap();
    let report = charter.tick().unwrap();

    assert!(
        report
            .events
            .iter()
            .any(|e| e.event_type() == "BudgetBalanceViolationDetected")
    );
}

#[test]
fn overspent_items_are_reported() {
    let store = SqliteEventStore::in_memory().unwrap();
    let clock = Arc::new(VirtualClock::new());
    let ids = IdGenerator::new(clock.clone());

    store
        .append(
            "bud-1",
            0,
            &[
                crafted_event(
                    &ids,
                    "bud-1",
                    StreamType::Budget,
                    1,
                    EventPayload::BudgetCreated(BudgetCreated {
                        budget_id: "bud-1".to_string(),
                        law_id: "law-1".to_string(),
                        fiscal_year: 2025,
                        items: vec![item("x", 1000, 0)],
                        budget_total: Decimal::from(1000),
                        created_at: DateTime::UNIX_EPOCH,
                        created_by: None,
                    }),
                ),
                crafted_event(
                    &ids,
                    "bud-1",
                    StreamType::Budget,
                    2,
                    EventPayload::BudgetActivated(BudgetActivated {
                        budget_id: "bud-1".to_string(),
                        activated_at: DateTime::UNIX_EPOCH,
                    }),
                ),
                crafted_event(
                    &ids,
                    "bud-1",
                    StreamType::Budget,
                    3,
                    EventPayload::ExpenditureApproved(ExpenditureApproved {
                        budget_id: "bud-1".to_string(),
                        item_id: "x".to_string(),
                        expenditure_id: "exp-1".to_string(),
                        amount: Decimal::from(1500),
                        purpose: "overrun".to_string(),
                        approved_at: DateTime::UNIX_EPOCH,
                        remaining_after: Decimal::from(-500),
                    }),
                ),
            ],
        )
        .unwrap();

    let mut charter =
        Charter::with_store(Box::new(store), SafetyPolicy::default(), clock).unwrap();
    let report = charter.tick().unwrap();

    assert!(
        report
            .events
            .iter()
            .any(|e| e.event_type() == "BudgetOverspendDetected")
    );
    assert!(report.has_warnings());
}

// =========================================================================
// Rule 6: supplier concentration
// =========================================================================

fn store_with_awarded_totals(totals: &[i64]) -> (SqliteEventStore, Arc<VirtualClock>) {
    let store = SqliteEventStore::in_memory().unwrap();
    let clock = Arc::new(VirtualClock::new());
    let ids = IdGenerator::new(clock.clone());

    for (i, &total) in totals.iter().enumerate() {
        let supplier_id = format!("sup-{i}");
        store
            .append(
                &supplier_id,
                0,
                &[crafted_event(
                    &ids,
                    &supplier_id,
                    StreamType::Supplier,
                    1,
                    EventPayload::SupplierRegistered(crate::procurement::SupplierRegistered {
                        supplier_id: supplier_id.clone(),
                        name: format!("Supplier {i}"),
                        supplier_type: "company".to_string(),
                        max_contract_value: Decimal::from(10_000_000),
                        certifications: std::collections::BTreeSet::new(),
                        years_in_business: 10,
                        reputation_score: 0.9,
                        registered_at: DateTime::UNIX_EPOCH,
                    }),
                )],
            )
            .unwrap();

        if total > 0 {
            let contract_stream = format!("ten-{i}");
            store
                .append(
                    &contract_stream,
                    0,
                    &[crafted_event(
                        &ids,
                        &contract_stream,
                        StreamType::Tender,
                        1,
                        EventPayload::ContractAwarded(crate::procurement::ContractAwarded {
                            contract_id: format!("con-{i}"),
                            tender_id: contract_stream.clone(),
                            law_id: "law-1".to_string(),
                            supplier_id,
                            value: Decimal::from(total),
                            awarded_at: DateTime::UNIX_EPOCH,
                        }),
                    )],
                )
                .unwrap();
        }
    }
    (store, clock)
}

#[test]
fn supplier_concentration_warns_at_moderate_gini() {
    // Totals [0, 100k, 200k, 300k]: gini ~ 0.417, inside [0.3, 0.5).
    let (store, clock) = store_with_awarded_totals(&[0, 100_000, 200_000, 300_000]);
    let mut charter =
        Charter::with_store(Box::new(store), SafetyPolicy::default(), clock).unwrap();

    let report = charter.tick().unwrap();
    let types: Vec<&str> = report.events.iter().map(Event::event_type).collect();
    assert!(types.contains(&"SupplierConcentrationWarning"));
    assert!(!types.contains(&"SupplierConcentrationHalt"));
}

#[test]
fn supplier_concentration_halts_when_one_supplier_hoards() {
    // One supplier holds everything: gini 0.75 over four suppliers.
    let (store, clock) = store_with_awarded_totals(&[500_000, 0, 0, 0]);
    let mut charter =
        Charter::with_store(Box::new(store), SafetyPolicy::default(), clock).unwrap();

    let report = charter.tick().unwrap();
    assert!(report.has_halts());
    assert!(
        report
            .events
            .iter()
            .any(|e| e.event_type() == "SupplierConcentrationHalt")
    );
}

#[test]
fn even_awards_raise_no_concentration_events() {
    let (store, clock) = store_with_awarded_totals(&[100_000, 100_000, 100_000]);
    let mut charter =
        Charter::with_store(Box::new(store), SafetyPolicy::default(), clock).unwrap();

    let report = charter.tick().unwrap();
    assert!(
        !report
            .events
            .iter()
            .any(|e| e.event_type().starts_with("SupplierConcentration"))
    );
}
