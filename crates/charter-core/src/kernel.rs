//! The `Charter` façade: the single write path into the kernel.
//!
//! Every command flows caller → façade → invariants → handler → events →
//! atomic append → projection apply. The façade serializes writes (one
//! `&mut self` at a time), retries a version conflict once after
//! reloading, and coerces duplicate commands into success.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::budget;
use crate::clock::{Clock, SystemClock, VirtualClock};
use crate::config::{KernelConfig, TimeSource};
use crate::context::HandlerContext;
use crate::delegation;
use crate::error::KernelError;
use crate::event::Event;
use crate::ids::{self, IdGenerator};
use crate::law;
use crate::ledger::{AppendOutcome, EventStore, SqliteEventStore, StoreError};
use crate::metrics::{ConcentrationMetrics, FreedomHealth, compute_freedom_health};
use crate::policy::SafetyPolicy;
use crate::procurement;
use crate::projections::Projections;
use crate::tick::{self, TickReport};
use crate::workspace;

/// Every command the kernel accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a workspace.
    CreateWorkspace(workspace::CreateWorkspace),
    /// Archive a workspace.
    ArchiveWorkspace(workspace::ArchiveWorkspace),
    /// Delegate decision authority.
    DelegateDecisionRight(delegation::DelegateDecisionRight),
    /// Renew a delegation.
    RenewDelegation(delegation::RenewDelegation),
    /// Revoke a delegation.
    RevokeDelegation(delegation::RevokeDelegation),
    /// Create a law.
    CreateLaw(law::CreateLaw),
    /// Activate a law.
    ActivateLaw(law::ActivateLaw),
    /// Manually trigger a law review.
    TriggerLawReview(law::TriggerLawReview),
    /// Complete a law review.
    CompleteReview(law::CompleteReview),
    /// Archive a law.
    ArchiveLaw(law::ArchiveLaw),
    /// Create a budget.
    CreateBudget(budget::CreateBudget),
    /// Activate a budget.
    ActivateBudget(budget::ActivateBudget),
    /// Rebalance budget allocations.
    AdjustAllocation(budget::AdjustAllocation),
    /// Approve an expenditure.
    ApproveExpenditure(budget::ApproveExpenditure),
    /// Close a budget.
    CloseBudget(budget::CloseBudget),
    /// Register a supplier.
    RegisterSupplier(procurement::RegisterSupplier),
    /// Create a tender.
    CreateTender(procurement::CreateTender),
    /// Open a tender.
    OpenTender(procurement::OpenTender),
    /// Compute a tender's feasible set.
    EvaluateTender(procurement::EvaluateTender),
    /// Award a tender.
    AwardTender(procurement::AwardTender),
    /// Close a tender.
    CloseTender(procurement::CloseTender),
}

impl Command {
    /// The command's stable kind name, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateWorkspace(_) => "CreateWorkspace",
            Self::ArchiveWorkspace(_) => "ArchiveWorkspace",
            Self::DelegateDecisionRight(_) => "DelegateDecisionRight",
            Self::RenewDelegation(_) => "RenewDelegation",
            Self::RevokeDelegation(_) => "RevokeDelegation",
            Self::CreateLaw(_) => "CreateLaw",
            Self::ActivateLaw(_) => "ActivateLaw",
            Self::TriggerLawReview(_) => "TriggerLawReview",
            Self::CompleteReview(_) => "CompleteReview",
            Self::ArchiveLaw(_) => "ArchiveLaw",
            Self::CreateBudget(_) => "CreateBudget",
            Self::ActivateBudget(_) => "ActivateBudget",
            Self::AdjustAllocation(_) => "AdjustAllocation",
            Self::ApproveExpenditure(_) => "ApproveExpenditure",
            Self::CloseBudget(_) => "CloseBudget",
            Self::RegisterSupplier(_) => "RegisterSupplier",
            Self::CreateTender(_) => "CreateTender",
            Self::OpenTender(_) => "OpenTender",
            Self::EvaluateTender(_) => "EvaluateTender",
            Self::AwardTender(_) => "AwardTender",
            Self::CloseTender(_) => "CloseTender",
        }
    }
}

/// A command plus its idempotency key and acting identity.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    /// Caller-generated idempotency key.
    pub command_id: String,
    /// The acting identity, if any.
    pub actor_id: Option<String>,
    /// The command itself.
    pub command: Command,
}

impl CommandEnvelope {
    /// Wraps a command with a fresh cryptographically random key.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            command_id: ids::command_id(),
            actor_id: None,
            command,
        }
    }

    /// Sets the acting identity.
    #[must_use]
    pub fn by(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Overrides the idempotency key (for retries of the same intent).
    #[must_use]
    pub fn with_command_id(mut self, command_id: impl Into<String>) -> Self {
        self.command_id = command_id.into();
        self
    }
}

/// The governance kernel façade.
pub struct Charter {
    store: Box<dyn EventStore>,
    clock: Arc<dyn Clock>,
    ids: IdGenerator,
    policy: SafetyPolicy,
    projections: Projections,
}

impl Charter {
    /// Opens a kernel over a SQLite store at `path` with the default
    /// policy and the system clock.
    ///
    /// # Errors
    ///
    /// Storage errors opening the database or replaying the log.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KernelError> {
        let store = SqliteEventStore::open(path)?;
        Self::with_store(Box::new(store), SafetyPolicy::default(), Arc::new(SystemClock))
    }

    /// Builds a kernel from a validated configuration.
    ///
    /// # Errors
    ///
    /// [`KernelError::InvalidArgument`] for a configuration that fails
    /// validation; storage errors otherwise.
    pub fn from_config(config: &KernelConfig) -> Result<Self, KernelError> {
        config
            .validate()
            .map_err(|e| KernelError::InvalidArgument {
                field: "config",
                reason: e.to_string(),
            })?;

        let clock: Arc<dyn Clock> = match config.time_source {
            TimeSource::Real => Arc::new(SystemClock),
            TimeSource::Virtual => Arc::new(VirtualClock::new()),
        };
        let store = SqliteEventStore::open(config.resolved_db_path())?;
        Self::with_store(Box::new(store), config.policy.clone(), clock)
    }

    /// Builds a kernel over an explicit store, policy, and clock, then
    /// rebuilds all projections from the log.
    ///
    /// # Errors
    ///
    /// Storage errors replaying the log.
    pub fn with_store(
        store: Box<dyn EventStore>,
        policy: SafetyPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, KernelError> {
        let mut kernel = Self {
            ids: IdGenerator::new(clock.clone()),
            store,
            clock,
            policy,
            projections: Projections::default(),
        };
        kernel.rebuild()?;
        Ok(kernel)
    }

    /// Creates an in-memory kernel, for tests and demos.
    ///
    /// # Errors
    ///
    /// Storage errors initializing the in-memory database.
    pub fn in_memory(policy: SafetyPolicy, clock: Arc<dyn Clock>) -> Result<Self, KernelError> {
        Self::with_store(Box::new(SqliteEventStore::in_memory()?), policy, clock)
    }

    /// Drops and rebuilds every projection from the full log.
    ///
    /// Rebuild is deterministic: the resulting state equals what
    /// incremental application produced.
    ///
    /// # Errors
    ///
    /// Storage errors loading the log.
    pub fn rebuild(&mut self) -> Result<(), KernelError> {
        let events = self.store.load_all()?;
        let mut fresh = Projections::default();
        fresh.apply_all(&events);
        self.projections = fresh;
        tracing::debug!(events = events.len(), "projections rebuilt from log");
        Ok(())
    }

    /// Executes one command: validate, append, apply, return the events.
    ///
    /// A duplicate command (same `command_id`) returns the originally
    /// stored events and appends nothing. A version conflict is retried
    /// once after reloading projections from the log.
    ///
    /// # Errors
    ///
    /// Validation errors surface unchanged; storage errors after the
    /// retry budget is exhausted.
    pub fn execute(&mut self, envelope: &CommandEnvelope) -> Result<Vec<Event>, KernelError> {
        let correlation_id = ids::correlation_id();
        let span = tracing::debug_span!(
            "execute",
            command = envelope.command.kind(),
            %correlation_id,
        );
        let _guard = span.enter();

        match self.try_execute(envelope) {
            Err(KernelError::Store(StoreError::VersionConflict { stream_id, .. })) => {
                tracing::warn!(
                    command = envelope.command.kind(),
                    %stream_id,
                    "version conflict, reloading projections and retrying once"
                );
                self.rebuild()?;
                self.try_execute(envelope)
            },
            other => other,
        }
    }

    /// One attempt of the execute path: handle, append, apply.
    fn try_execute(&mut self, envelope: &CommandEnvelope) -> Result<Vec<Event>, KernelError> {
        // Exactly-once: a command the log has already seen returns its
        // original events, even when the aggregate has since moved to a
        // state in which the handler would no longer accept it.
        let stored = self.store.load_command(&envelope.command_id)?;
        if !stored.is_empty() {
            tracing::info!(
                command = envelope.command.kind(),
                "duplicate command, returning stored events"
            );
            return Ok(stored);
        }

        let events = self.handle(envelope)?;
        let Some(first) = events.first() else {
            return Ok(events);
        };
        let stream_id = first.stream_id.clone();
        let expected_version = first.version - 1;

        match self.store.append(&stream_id, expected_version, &events)? {
            AppendOutcome::Appended => {
                self.projections.apply_all(&events);
                tracing::info!(
                    command = envelope.command.kind(),
                    events = events.len(),
                    "command applied"
                );
                Ok(events)
            },
            AppendOutcome::AlreadyApplied(stored) => {
                tracing::info!(
                    command = envelope.command.kind(),
                    "duplicate command, returning stored events"
                );
                Ok(stored)
            },
        }
    }

    /// Runs one tick evaluation pass.
    ///
    /// # Errors
    ///
    /// Storage errors from the reflex append path.
    pub fn tick(&mut self) -> Result<TickReport, KernelError> {
        tick::run_tick(
            self.store.as_ref(),
            &mut self.projections,
            &self.policy,
            &self.ids,
            self.clock.now(),
        )
    }

    /// Computes the freedom-health scorecard on demand.
    #[must_use]
    pub fn health(&self) -> FreedomHealth {
        let now = self.clock.now();
        let in_degrees = self.projections.delegations.in_degrees(now);
        compute_freedom_health(
            ConcentrationMetrics::from_in_degrees(in_degrees.values()),
            tick::law_review_health(&self.projections, now),
            &self.policy,
            now,
        )
    }

    /// Read access to all projections.
    #[must_use]
    pub const fn projections(&self) -> &Projections {
        &self.projections
    }

    /// The safety policy in force.
    #[must_use]
    pub const fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    /// The kernel's current instant.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Dispatches to the command's handler with a projection snapshot.
    fn handle(&self, envelope: &CommandEnvelope) -> Result<Vec<Event>, KernelError> {
        let ctx = HandlerContext {
            command_id: &envelope.command_id,
            actor_id: envelope.actor_id.as_deref(),
            now: self.clock.now(),
            policy: &self.policy,
            ids: &self.ids,
        };
        let projections = &self.projections;

        match &envelope.command {
            Command::CreateWorkspace(c) => {
                workspace::handlers::create_workspace(c, &ctx, projections)
            },
            Command::ArchiveWorkspace(c) => {
                workspace::handlers::archive_workspace(c, &ctx, projections)
            },
            Command::DelegateDecisionRight(c) => {
                delegation::handlers::delegate_decision_right(c, &ctx, projections)
            },
            Command::RenewDelegation(c) => {
                delegation::handlers::renew_delegation(c, &ctx, projections)
            },
            Command::RevokeDelegation(c) => {
                delegation::handlers::revoke_delegation(c, &ctx, projections)
            },
            Command::CreateLaw(c) => law::handlers::create_law(c, &ctx, projections),
            Command::ActivateLaw(c) => law::handlers::activate_law(c, &ctx, projections),
            Command::TriggerLawReview(c) => {
                law::handlers::trigger_law_review(c, &ctx, projections)
            },
            Command::CompleteReview(c) => law::handlers::complete_review(c, &ctx, projections),
            Command::ArchiveLaw(c) => law::handlers::archive_law(c, &ctx, projections),
            Command::CreateBudget(c) => budget::handlers::create_budget(c, &ctx, projections),
            Command::ActivateBudget(c) => {
                budget::handlers::activate_budget(c, &ctx, projections)
            },
            Command::AdjustAllocation(c) => {
                budget::handlers::adjust_allocation(c, &ctx, projections)
            },
            Command::ApproveExpenditure(c) => {
                budget::handlers::approve_expenditure(c, &ctx, projections)
            },
            Command::CloseBudget(c) => budget::handlers::close_budget(c, &ctx, projections),
            Command::RegisterSupplier(c) => {
                procurement::handlers::register_supplier(c, &ctx, projections)
            },
            Command::CreateTender(c) => {
                procurement::handlers::create_tender(c, &ctx, projections)
            },
            Command::OpenTender(c) => procurement::handlers::open_tender(c, &ctx, projections),
            Command::EvaluateTender(c) => {
                procurement::handlers::evaluate_tender(c, &ctx, projections)
            },
            Command::AwardTender(c) => procurement::handlers::award_tender(c, &ctx, projections),
            Command::CloseTender(c) => procurement::handlers::close_tender(c, &ctx, projections),
        }
    }
}
