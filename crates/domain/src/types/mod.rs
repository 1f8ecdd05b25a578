//! Domain types
//!
//! Split by concern: the ERP document model, typed list queries, payroll
//! input specs, batch input, and run reporting.

pub mod document;
pub mod import;
pub mod payroll;
pub mod query;
pub mod report;

pub use document::{coerce_f64, DocStatus, DocType, Document};
pub use import::ImportBatch;
pub use payroll::{
    AssignmentSpec, CompanySpec, ComponentKind, EmployeeSpec, SalaryComponentSpec,
    SalarySlipSpec, SalaryStructureSpec, SlipLine, StructureLine,
};
pub use query::{Filter, FilterOp, ListQuery};
pub use report::{BatchReport, Outcome, OutcomeCounts, RecordOutcome};
