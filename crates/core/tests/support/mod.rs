//! Shared test helpers for `paybridge-core` integration tests.
//!
//! The mock ERP and batch fixtures live here so the integration tests can
//! focus on behaviour instead of boilerplate.

// Each test binary compiles this module separately and none uses all of it.
#![allow(dead_code)]

pub mod erp;
pub mod fixtures;
