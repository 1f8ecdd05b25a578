//! # PayBridge Domain
//!
//! Business domain types and models for PayBridge.
//!
//! This crate contains:
//! - ERP document model (doctype, docstatus, field map)
//! - Payroll record specifications consumed by the import pipeline
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants and pure helpers (date normalization, abbreviations)
//!
//! ## Architecture
//! - No dependencies on other PayBridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
