//! The tick engine: periodic safeguard evaluation.
//!
//! A tick scans the projections and emits reflex events for every rule
//! whose condition holds. Rules run in a fixed order so replay is
//! bit-stable, and rules that mutate the active set (expiry) run before
//! rules that read it (concentration). Each rule's events are appended
//! and applied before the next rule evaluates.
//!
//! A tick is idempotent for a fixed `now` and projection state: rules
//! 1–2 re-check aggregate state that their own events change, and rules
//! 3–6 (plus the tick marker) skip when the safety log already recorded
//! an identical observation at this instant.

mod events;
mod safety_log;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub use events::{
    BudgetBalanceViolationDetected, BudgetOverspendDetected, DelegationConcentrationHalt,
    DelegationConcentrationWarning, SupplierConcentrationHalt, SupplierConcentrationWarning,
    SystemTick, TransparencyEscalated,
};
pub use safety_log::{SafetyEvent, SafetyEventLog};

use crate::error::KernelError;
use crate::event::{Event, EventPayload, StreamType};
use crate::ids::{self, IdGenerator};
use crate::ledger::{AppendOutcome, EventStore};
use crate::metrics::{
    ConcentrationMetrics, FreedomHealth, LawReviewHealth, compute_freedom_health,
    gini_coefficient,
};
use crate::policy::SafetyPolicy;
use crate::projections::Projections;

/// Synthetic stream for tick markers.
const STREAM_TICK: &str = "system:tick";
/// Synthetic stream for delegation concentration events.
const STREAM_DELEGATION_GINI: &str = "system:delegation_gini";
/// Synthetic stream for transparency escalations.
const STREAM_TRANSPARENCY: &str = "system:transparency";
/// Synthetic stream for budget audit events.
const STREAM_BUDGET_AUDIT: &str = "system:budget_audit";
/// Synthetic stream for supplier concentration events.
const STREAM_SUPPLIER_GINI: &str = "system:supplier_gini";

/// Result of one tick evaluation.
#[derive(Debug)]
pub struct TickReport {
    /// Identifier tying the pass's events together.
    pub tick_id: String,
    /// The instant the pass evaluated at.
    pub tick_at: DateTime<Utc>,
    /// Reflex events emitted (excluding skipped duplicates).
    pub events: Vec<Event>,
    /// The scorecard computed at the end of the pass.
    pub health: FreedomHealth,
}

impl TickReport {
    /// Whether any warning-class event was emitted.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.events.iter().any(|e| {
            matches!(
                e.event_type(),
                "DelegationConcentrationWarning"
                    | "BudgetBalanceViolationDetected"
                    | "BudgetOverspendDetected"
                    | "SupplierConcentrationWarning"
            )
        })
    }

    /// Whether any halt-class event was emitted.
    #[must_use]
    pub fn has_halts(&self) -> bool {
        self.events.iter().any(|e| {
            matches!(
                e.event_type(),
                "DelegationConcentrationHalt" | "SupplierConcentrationHalt"
            )
        })
    }

    /// One-line operator summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "tick {} at {} | risk {:?} | {} events{}",
            self.tick_id,
            self.tick_at,
            self.health.risk_level,
            self.events.len(),
            if self.has_halts() {
                " | HALT conditions detected"
            } else if self.has_warnings() {
                " | warning conditions detected"
            } else {
                ""
            }
        )
    }
}

/// Evaluates all tick rules once, appending reflex events through the
/// store and applying them to the projections.
///
/// # Errors
///
/// Storage failures from the append path.
pub(crate) fn run_tick(
    store: &dyn EventStore,
    projections: &mut Projections,
    policy: &SafetyPolicy,
    id_gen: &IdGenerator,
    now: DateTime<Utc>,
) -> Result<TickReport, KernelError> {
    let tick_id = id_gen.event_id().to_string();
    let mut emitted = Vec::new();

    tracing::debug!(%tick_id, %now, "tick evaluation started");

    // Tick marker.
    if !projections.safety_log.already_emitted("SystemTick", "global", now) {
        emit_system(
            store,
            projections,
            id_gen,
            STREAM_TICK,
            EventPayload::SystemTick(SystemTick {
                tick_at: now,
                tick_id: tick_id.clone(),
            }),
            now,
            &mut emitted,
        )?;
    }

    // Rule 1: delegation expiry. Mutates the active edge set, so it
    // runs before any rule that reads it.
    let expired: Vec<(String, u64)> = projections
        .delegations
        .iter()
        .filter(|d| d.revoked_at.is_none() && d.expired_at.is_none() && d.expires_at < now)
        .map(|d| (d.delegation_id.clone(), d.version))
        .collect();
    for (delegation_id, version) in expired {
        let event = Event {
            event_id: id_gen.event_id(),
            stream_id: delegation_id.clone(),
            stream_type: StreamType::Delegation,
            version: version + 1,
            command_id: ids::command_id(),
            occurred_at: now,
            actor_id: Some("system".to_string()),
            payload: EventPayload::DelegationExpired(crate::delegation::DelegationExpired {
                delegation_id,
                expired_at: now,
            }),
        };
        append_and_apply(store, projections, event, &mut emitted)?;
    }

    // Rule 2: law checkpoint overrun.
    let overdue: Vec<(String, u64, u32)> = projections
        .laws
        .list_overdue(now)
        .into_iter()
        .map(|law| (law.law_id.clone(), law.version, law.checkpoint_index))
        .collect();
    for (law_id, version, checkpoint_index) in overdue {
        let event = Event {
            event_id: id_gen.event_id(),
            stream_id: law_id.clone(),
            stream_type: StreamType::Law,
            version: version + 1,
            command_id: ids::command_id(),
            occurred_at: now,
            actor_id: Some("system".to_string()),
            payload: EventPayload::LawReviewTriggered(crate::law::LawReviewTriggered {
                law_id,
                triggered_at: now,
                triggered_by: None,
                reason: "checkpoint_overdue".to_string(),
                checkpoint_index,
            }),
        };
        append_and_apply(store, projections, event, &mut emitted)?;
    }

    // Rule 3: delegation concentration over the post-expiry edge set.
    let in_degrees = projections.delegations.in_degrees(now);
    let concentration = ConcentrationMetrics::from_in_degrees(in_degrees.values());
    evaluate_delegation_concentration(
        store,
        projections,
        policy,
        id_gen,
        now,
        &concentration,
        &mut emitted,
    )?;

    // Rules 4 and 5: budget audits. The write path guards these
    // invariants; anything found here is corruption or a handler bug.
    evaluate_budget_audits(store, projections, id_gen, now, &mut emitted)?;

    // Rule 6: supplier concentration over awarded totals.
    evaluate_supplier_concentration(store, projections, policy, id_gen, now, &mut emitted)?;

    let health = compute_freedom_health(
        concentration,
        law_review_health(projections, now),
        policy,
        now,
    );

    tracing::info!(
        %tick_id,
        risk = ?health.risk_level,
        events = emitted.len(),
        gini = health.concentration.gini_coefficient,
        overdue = health.law_review.overdue_reviews,
        "tick evaluation completed"
    );

    Ok(TickReport {
        tick_id,
        tick_at: now,
        events: emitted,
        health,
    })
}

/// Computes the law review health snapshot used by the scorecard.
pub(crate) fn law_review_health(projections: &Projections, now: DateTime<Utc>) -> LawReviewHealth {
    LawReviewHealth {
        total_active_laws: projections.laws.list_active().count() as u64,
        overdue_reviews: projections.laws.list_overdue(now).len() as u64,
        upcoming_reviews_7d: projections.laws.count_upcoming(now, 7),
        upcoming_reviews_30d: projections.laws.count_upcoming(now, 30),
    }
}

fn evaluate_delegation_concentration(
    store: &dyn EventStore,
    projections: &mut Projections,
    policy: &SafetyPolicy,
    id_gen: &IdGenerator,
    now: DateTime<Utc>,
    metrics: &ConcentrationMetrics,
    emitted: &mut Vec<Event>,
) -> Result<(), KernelError> {
    if metrics.total_active_delegations == 0 {
        return Ok(());
    }

    let gini_halt = metrics.gini_coefficient >= policy.delegation_gini_halt;
    let degree_halt = metrics.max_in_degree >= policy.delegation_in_degree_halt;

    if gini_halt || degree_halt {
        if projections
            .safety_log
            .already_emitted("DelegationConcentrationHalt", "global", now)
        {
            return Ok(());
        }

        let mut reasons = Vec::new();
        if gini_halt {
            reasons.push(format!(
                "gini {:.3} >= {}",
                metrics.gini_coefficient, policy.delegation_gini_halt
            ));
        }
        if degree_halt {
            reasons.push(format!(
                "max in-degree {} >= {}",
                metrics.max_in_degree, policy.delegation_in_degree_halt
            ));
        }

        emit_system(
            store,
            projections,
            id_gen,
            STREAM_DELEGATION_GINI,
            EventPayload::DelegationConcentrationHalt(DelegationConcentrationHalt {
                triggered_at: now,
                gini_coefficient: metrics.gini_coefficient,
                max_in_degree: metrics.max_in_degree,
                halt_threshold_gini: policy.delegation_gini_halt,
                halt_threshold_in_degree: policy.delegation_in_degree_halt,
                automatic_responses: vec!["transparency_escalated".to_string()],
                reason: reasons.join("; "),
            }),
            now,
            emitted,
        )?;

        if !projections
            .safety_log
            .already_emitted("TransparencyEscalated", "global", now)
        {
            emit_system(
                store,
                projections,
                id_gen,
                STREAM_TRANSPARENCY,
                EventPayload::TransparencyEscalated(TransparencyEscalated {
                    escalated_at: now,
                    scope: "global".to_string(),
                    previous_level: "private".to_string(),
                    new_level: "aggregate_plus".to_string(),
                    trigger_event: "DelegationConcentrationHalt".to_string(),
                }),
                now,
                emitted,
            )?;
        }
        return Ok(());
    }

    let gini_warn = metrics.gini_coefficient >= policy.delegation_gini_warn;
    let degree_warn = metrics.max_in_degree >= policy.delegation_in_degree_warn;
    if (gini_warn || degree_warn)
        && !projections
            .safety_log
            .already_emitted("DelegationConcentrationWarning", "global", now)
    {
        let mut reasons = Vec::new();
        if gini_warn {
            reasons.push(format!(
                "gini {:.3} >= {}",
                metrics.gini_coefficient, policy.delegation_gini_warn
            ));
        }
        if degree_warn {
            reasons.push(format!(
                "max in-degree {} >= {}",
                metrics.max_in_degree, policy.delegation_in_degree_warn
            ));
        }

        emit_system(
            store,
            projections,
            id_gen,
            STREAM_DELEGATION_GINI,
            EventPayload::DelegationConcentrationWarning(DelegationConcentrationWarning {
                triggered_at: now,
                gini_coefficient: metrics.gini_coefficient,
                max_in_degree: metrics.max_in_degree,
                warn_threshold_gini: policy.delegation_gini_warn,
                warn_threshold_in_degree: policy.delegation_in_degree_warn,
                reason: reasons.join("; "),
            }),
            now,
            emitted,
        )?;
    }
    Ok(())
}

fn evaluate_budget_audits(
    store: &dyn EventStore,
    projections: &mut Projections,
    id_gen: &IdGenerator,
    now: DateTime<Utc>,
    emitted: &mut Vec<Event>,
) -> Result<(), KernelError> {
    // Rule 4: balance.
    let unbalanced: Vec<(String, Decimal, Decimal)> = projections
        .budgets
        .list_active()
        .filter(|b| !b.is_balanced())
        .map(|b| (b.budget_id.clone(), b.budget_total, b.total_allocated()))
        .collect();
    for (budget_id, budget_total, total_allocated) in unbalanced {
        if projections
            .safety_log
            .already_emitted("BudgetBalanceViolationDetected", &budget_id, now)
        {
            continue;
        }
        emit_system(
            store,
            projections,
            id_gen,
            STREAM_BUDGET_AUDIT,
            EventPayload::BudgetBalanceViolationDetected(BudgetBalanceViolationDetected {
                budget_id,
                detected_at: now,
                budget_total,
                total_allocated,
                variance: total_allocated - budget_total,
            }),
            now,
            emitted,
        )?;
    }

    // Rule 5: overspend.
    let overspent: Vec<(String, String, Decimal, Decimal)> = projections
        .budgets
        .list_active()
        .flat_map(|b| {
            b.items.values().filter_map(|item| {
                (item.spent_amount > item.allocated_amount).then(|| {
                    (
                        b.budget_id.clone(),
                        item.item_id.clone(),
                        item.allocated_amount,
                        item.spent_amount,
                    )
                })
            })
        })
        .collect();
    for (budget_id, item_id, allocated, spent) in overspent {
        let subject = format!("{budget_id}/{item_id}");
        if projections
            .safety_log
            .already_emitted("BudgetOverspendDetected", &subject, now)
        {
            continue;
        }
        emit_system(
            store,
            projections,
            id_gen,
            STREAM_BUDGET_AUDIT,
            EventPayload::BudgetOverspendDetected(BudgetOverspendDetected {
                budget_id,
                item_id,
                detected_at: now,
                allocated_amount: allocated,
                spent_amount: spent,
                overspend_amount: spent - allocated,
            }),
            now,
            emitted,
        )?;
    }
    Ok(())
}

fn evaluate_supplier_concentration(
    store: &dyn EventStore,
    projections: &mut Projections,
    policy: &SafetyPolicy,
    id_gen: &IdGenerator,
    now: DateTime<Utc>,
    emitted: &mut Vec<Event>,
) -> Result<(), KernelError> {
    let totals = projections.suppliers.awarded_totals();
    if totals.is_empty() {
        return Ok(());
    }
    let total_awarded: Decimal = totals.iter().copied().sum();
    if total_awarded.is_zero() {
        return Ok(());
    }

    let as_floats: Vec<f64> = totals.iter().map(|d| d.to_f64().unwrap_or(0.0)).collect();
    let gini = gini_coefficient(&as_floats);
    let supplier_count = totals.len() as u64;

    if gini >= policy.supplier_gini_halt {
        if !projections
            .safety_log
            .already_emitted("SupplierConcentrationHalt", "global", now)
        {
            emit_system(
                store,
                projections,
                id_gen,
                STREAM_SUPPLIER_GINI,
                EventPayload::SupplierConcentrationHalt(SupplierConcentrationHalt {
                    triggered_at: now,
                    gini_coefficient: gini,
                    halt_threshold: policy.supplier_gini_halt,
                    total_value_awarded: total_awarded,
                    supplier_count,
                }),
                now,
                emitted,
            )?;
        }
    } else if gini >= policy.supplier_gini_warn
        && !projections
            .safety_log
            .already_emitted("SupplierConcentrationWarning", "global", now)
    {
        emit_system(
            store,
            projections,
            id_gen,
            STREAM_SUPPLIER_GINI,
            EventPayload::SupplierConcentrationWarning(SupplierConcentrationWarning {
                triggered_at: now,
                gini_coefficient: gini,
                warn_threshold: policy.supplier_gini_warn,
                total_value_awarded: total_awarded,
                supplier_count,
            }),
            now,
            emitted,
        )?;
    }
    Ok(())
}

/// Appends a reflex event to a synthetic system stream and applies it.
fn emit_system(
    store: &dyn EventStore,
    projections: &mut Projections,
    id_gen: &IdGenerator,
    stream_id: &str,
    payload: EventPayload,
    now: DateTime<Utc>,
    emitted: &mut Vec<Event>,
) -> Result<(), KernelError> {
    let version = store.stream_version(stream_id)? + 1;
    let event = Event {
        event_id: id_gen.event_id(),
        stream_id: stream_id.to_string(),
        stream_type: StreamType::System,
        version,
        command_id: ids::command_id(),
        occurred_at: now,
        actor_id: Some("system".to_string()),
        payload,
    };
    append_and_apply(store, projections, event, emitted)
}

/// Appends one event under its stream's expected version and applies it.
fn append_and_apply(
    store: &dyn EventStore,
    projections: &mut Projections,
    event: Event,
    emitted: &mut Vec<Event>,
) -> Result<(), KernelError> {
    let outcome = store.append(&event.stream_id, event.version - 1, std::slice::from_ref(&event))?;
    match outcome {
        AppendOutcome::Appended => {
            projections.apply(&event);
            emitted.push(event);
        },
        // Fresh command ids make this unreachable in practice; if the
        // store does report a duplicate, the event is already in the
        // log and there is nothing further to do.
        AppendOutcome::AlreadyApplied(_) => {},
    }
    Ok(())
}
