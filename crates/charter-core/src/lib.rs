//! # charter-core
//!
//! An event-sourced governance kernel: a deterministic state machine
//! that records governance actions (delegations of authority, laws,
//! budgets, procurement tenders) as an append-only event log, enforces
//! a fixed set of anti-entrenchment invariants on every transition, and
//! periodically evaluates reflex triggers that emit further events when
//! concentration, time, or balance thresholds are breached.
//!
//! ## Architecture
//!
//! ```text
//! caller → Charter (façade) → invariants → handler → events
//!            │                                        │
//!            │         append under expected version  ▼
//!            │◄──────────── projections ◄──────── event log
//! ```
//!
//! The event log is the sole source of truth; every projection is a
//! deterministic fold over it and can be dropped and rebuilt. Time and
//! identifiers flow through injectable seams ([`clock::Clock`],
//! [`ids::IdGenerator`]) so replay is reproducible bit for bit.
//!
//! ## Example
//!
//! ```rust,no_run
//! use charter_core::kernel::{Charter, Command, CommandEnvelope};
//! use charter_core::workspace::CreateWorkspace;
//!
//! # fn main() -> Result<(), charter_core::error::KernelError> {
//! let mut charter = Charter::open("governance.db")?;
//! let events = charter.execute(
//!     &CommandEnvelope::new(Command::CreateWorkspace(CreateWorkspace {
//!         name: "Health Services".to_string(),
//!         parent_workspace_id: None,
//!         scope: Default::default(),
//!     }))
//!     .by("alice"),
//! )?;
//! let report = charter.tick()?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod budget;
pub mod clock;
pub mod config;
pub mod context;
pub mod delegation;
pub mod error;
pub mod event;
pub mod ids;
pub mod kernel;
pub mod law;
pub mod ledger;
pub mod metrics;
pub mod policy;
pub mod procurement;
pub mod projections;
pub mod telemetry;
pub mod tick;
pub mod workspace;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clock::{Clock, SystemClock, VirtualClock};
    pub use crate::error::KernelError;
    pub use crate::event::{Event, EventPayload, StreamType};
    pub use crate::kernel::{Charter, Command, CommandEnvelope};
    pub use crate::ledger::{EventStore, SqliteEventStore};
    pub use crate::metrics::{FreedomHealth, RiskLevel};
    pub use crate::policy::SafetyPolicy;
    pub use crate::tick::TickReport;
}

pub use error::KernelError;
pub use kernel::{Charter, Command, CommandEnvelope};
pub use policy::SafetyPolicy;
