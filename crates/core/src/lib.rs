//! # PayBridge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The `DocumentApi` port the ERP adapter implements
//! - Lifecycle transitions (submit/cancel with conflict retries)
//! - Totals reconciliation for salary slips
//! - Idempotent per-entity resource accessors
//! - The batch import orchestrator
//!
//! ## Architecture Principles
//! - Only depends on `paybridge-domain`
//! - No HTTP or transport code
//! - All external I/O via the `DocumentApi` trait
//! - Pure, testable business logic

pub mod erp_ports;
pub mod import;
pub mod lifecycle;
pub mod reconcile;
pub mod resources;

// Re-export the public surface callers actually use
pub use erp_ports::DocumentApi;
pub use import::{ImportOrchestrator, ResolutionContext};
pub use lifecycle::{LifecycleConfig, LifecycleDriver, TransitionOutcome};
pub use reconcile::reconcile_slip;
pub use resources::{
    AssignmentRequest, Assignments, Companies, Components, Employees, Ensured, SlipRequest,
    Slips, Structures,
};
