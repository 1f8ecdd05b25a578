//! # PayBridge Infra
//!
//! Infrastructure adapters for PayBridge.
//!
//! This crate contains:
//! - HTTP transport (thin reqwest wrapper, no transport-level retry)
//! - ERP REST adapter implementing the core [`DocumentApi`] port
//! - Configuration loading (environment first, file fallback)
//!
//! ## Architecture
//! - Depends on `paybridge-domain` and `paybridge-core`
//! - All I/O lives here; business logic stays in the core crate
//!
//! [`DocumentApi`]: paybridge_core::DocumentApi

pub mod config;
pub mod erp;
pub mod http;

// Re-export commonly used items
pub use config::loader::{load, load_from_env, load_from_file};
pub use erp::ErpClient;
pub use http::{HttpClient, HttpClientBuilder};
