//! Procurement command handlers.

use rust_decimal::Decimal;

use crate::context::HandlerContext;
use crate::error::KernelError;
use crate::event::{Event, EventPayload, StreamType};
use crate::projections::Projections;

use super::commands::{
    AwardTender, CloseTender, CreateTender, EvaluateTender, OpenTender, RegisterSupplier,
};
use super::events::{
    ContractAwarded, SupplierRegistered, TenderAwarded, TenderClosed, TenderCreated,
    TenderEvaluated, TenderOpened,
};
use super::{SelectionMechanism, SupplierState, TenderState, TenderStatus, feasible, selection};

/// Handles `RegisterSupplier`.
///
/// # Errors
///
/// [`KernelError::InvalidArgument`] for an empty name, a negative
/// contract ceiling, or a reputation outside `[0, 1]`.
pub fn register_supplier(
    command: &RegisterSupplier,
    ctx: &HandlerContext<'_>,
    _projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    if command.name.trim().is_empty() {
        return Err(KernelError::InvalidArgument {
            field: "name",
            reason: "supplier name must be non-empty".to_string(),
        });
    }
    if command.max_contract_value < Decimal::ZERO {
        return Err(KernelError::InvalidArgument {
            field: "max_contract_value",
            reason: "contract ceiling cannot be negative".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&command.reputation_score) {
        return Err(KernelError::InvalidArgument {
            field: "reputation_score",
            reason: format!("{} is outside [0, 1]", command.reputation_score),
        });
    }

    let supplier_id = ctx.ids.aggregate_id("sup");
    let payload = EventPayload::SupplierRegistered(SupplierRegistered {
        supplier_id: supplier_id.clone(),
        name: command.name.clone(),
        supplier_type: command.supplier_type.clone(),
        max_contract_value: command.max_contract_value,
        certifications: command.certifications.clone(),
        years_in_business: command.years_in_business,
        reputation_score: command.reputation_score,
        registered_at: ctx.now,
    });

    Ok(vec![ctx.event(supplier_id, StreamType::Supplier, 1, payload)])
}

/// Handles `CreateTender`.
///
/// # Errors
///
/// [`KernelError::UnknownAggregate`] for a missing law and
/// [`KernelError::InvalidArgument`] for an empty title or a negative
/// estimated value.
pub fn create_tender(
    command: &CreateTender,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    if projections.laws.get(&command.law_id).is_none() {
        return Err(KernelError::UnknownAggregate {
            kind: "law",
            id: command.law_id.clone(),
        });
    }
    if command.title.trim().is_empty() {
        return Err(KernelError::InvalidArgument {
            field: "title",
            reason: "tender title must be non-empty".to_string(),
        });
    }
    if command.estimated_value < Decimal::ZERO {
        return Err(KernelError::InvalidArgument {
            field: "estimated_value",
            reason: "estimated value cannot be negative".to_string(),
        });
    }

    let tender_id = ctx.ids.aggregate_id("ten");
    let payload = EventPayload::TenderCreated(TenderCreated {
        tender_id: tender_id.clone(),
        law_id: command.law_id.clone(),
        title: command.title.clone(),
        estimated_value: command.estimated_value,
        required_capabilities: command.required_capabilities.clone(),
        min_years_experience: command.min_years_experience,
        min_reputation: command.min_reputation,
        selection_mechanism: command.selection_mechanism,
        created_at: ctx.now,
    });

    Ok(vec![ctx.event(tender_id, StreamType::Tender, 1, payload)])
}

/// Handles `OpenTender`: DRAFT → OPEN.
///
/// # Errors
///
/// [`KernelError::UnknownAggregate`] or
/// [`KernelError::IllegalStatusTransition`].
pub fn open_tender(
    command: &OpenTender,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let tender = lookup(projections, &command.tender_id)?;
    require_status(tender, TenderStatus::Draft, "open")?;

    let payload = EventPayload::TenderOpened(TenderOpened {
        tender_id: command.tender_id.clone(),
        opened_at: ctx.now,
    });

    Ok(vec![ctx.event(
        command.tender_id.clone(),
        StreamType::Tender,
        tender.version + 1,
        payload,
    )])
}

/// Handles `EvaluateTender`: OPEN → EVALUATING, recording the feasible
/// set and every exclusion.
///
/// # Errors
///
/// [`KernelError::UnknownAggregate`] or
/// [`KernelError::IllegalStatusTransition`].
pub fn evaluate_tender(
    command: &EvaluateTender,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let tender = lookup(projections, &command.tender_id)?;
    require_status(tender, TenderStatus::Open, "evaluate")?;

    let (feasible_set, excluded) =
        feasible::compute_feasible_set(tender, projections.suppliers.iter());

    let payload = EventPayload::TenderEvaluated(TenderEvaluated {
        tender_id: command.tender_id.clone(),
        evaluated_at: ctx.now,
        feasible_set,
        excluded,
    });

    Ok(vec![ctx.event(
        command.tender_id.clone(),
        StreamType::Tender,
        tender.version + 1,
        payload,
    )])
}

/// Handles `AwardTender`: EVALUATING → AWARDED.
///
/// Runs the tender's selection mechanism over the feasible set computed
/// at evaluation and records the seed in the award event. Also emits the
/// `ContractAwarded` event that advances the winner's cumulative total.
///
/// # Errors
///
/// [`KernelError::NoFeasibleSupplier`] when the feasible set is empty;
/// [`KernelError::InvalidArgument`] when a seeded mechanism is missing
/// its seed; the usual lookup/status errors otherwise.
pub fn award_tender(
    command: &AwardTender,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let tender = lookup(projections, &command.tender_id)?;
    require_status(tender, TenderStatus::Evaluating, "award")?;

    let feasible_ids = tender.feasible_set.clone().unwrap_or_default();
    let feasible: Vec<&SupplierState> = feasible_ids
        .iter()
        .filter_map(|id| projections.suppliers.get(id))
        .collect();

    if feasible.is_empty() {
        return Err(KernelError::NoFeasibleSupplier {
            tender_id: command.tender_id.clone(),
        });
    }

    let seed = match tender.selection_mechanism {
        SelectionMechanism::Rotation => None,
        SelectionMechanism::Random | SelectionMechanism::Hybrid => {
            Some(command.seed.clone().ok_or_else(|| {
                KernelError::InvalidArgument {
                    field: "seed",
                    reason: "seeded selection mechanisms require a seed".to_string(),
                }
            })?)
        },
    };

    let winner = match tender.selection_mechanism {
        SelectionMechanism::Rotation => selection::select_rotation(&feasible),
        SelectionMechanism::Random => {
            selection::select_random(&feasible, seed.as_deref().unwrap_or_default())
        },
        SelectionMechanism::Hybrid => {
            selection::select_hybrid(&feasible, seed.as_deref().unwrap_or_default())
        },
    }
    .ok_or_else(|| KernelError::NoFeasibleSupplier {
        tender_id: command.tender_id.clone(),
    })?;

    let awarded = EventPayload::TenderAwarded(TenderAwarded {
        tender_id: command.tender_id.clone(),
        supplier_id: winner.supplier_id.clone(),
        mechanism: tender.selection_mechanism,
        seed,
        awarded_at: ctx.now,
        feasible_count: feasible.len() as u64,
    });

    let contract = EventPayload::ContractAwarded(ContractAwarded {
        contract_id: ctx.ids.aggregate_id("con"),
        tender_id: command.tender_id.clone(),
        law_id: tender.law_id.clone(),
        supplier_id: winner.supplier_id.clone(),
        value: tender.estimated_value,
        awarded_at: ctx.now,
    });

    Ok(vec![
        ctx.event(
            command.tender_id.clone(),
            StreamType::Tender,
            tender.version + 1,
            awarded,
        ),
        // Same command, same stream; the derived idempotency key keeps
        // (command_id) unique per persisted event.
        ctx.derived_event(
            "contract",
            command.tender_id.clone(),
            StreamType::Tender,
            tender.version + 2,
            contract,
        ),
    ])
}

/// Handles `CloseTender`: AWARDED → CLOSED.
///
/// # Errors
///
/// [`KernelError::UnknownAggregate`] or
/// [`KernelError::IllegalStatusTransition`].
pub fn close_tender(
    command: &CloseTender,
    ctx: &HandlerContext<'_>,
    projections: &Projections,
) -> Result<Vec<Event>, KernelError> {
    let tender = lookup(projections, &command.tender_id)?;
    require_status(tender, TenderStatus::Awarded, "close")?;

    let payload = EventPayload::TenderClosed(TenderClosed {
        tender_id: command.tender_id.clone(),
        closed_at: ctx.now,
    });

    Ok(vec![ctx.event(
        command.tender_id.clone(),
        StreamType::Tender,
        tender.version + 1,
        payload,
    )])
}

fn lookup<'a>(
    projections: &'a Projections,
    tender_id: &str,
) -> Result<&'a TenderState, KernelError> {
    projections
        .tenders
        .get(tender_id)
        .ok_or_else(|| KernelError::UnknownAggregate {
            kind: "tender",
            id: tender_id.to_string(),
        })
}

fn require_status(
    tender: &TenderState,
    expected: TenderStatus,
    operation: &'static str,
) -> Result<(), KernelError> {
    if tender.status == expected {
        Ok(())
    } else {
        Err(KernelError::IllegalStatusTransition {
            kind: "tender",
            from: tender.status.as_str().to_string(),
            operation,
        })
    }
}
