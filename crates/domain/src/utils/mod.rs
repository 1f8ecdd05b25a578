//! Pure helper functions shared across the workspace.

pub mod dates;
pub mod naming;

pub use dates::normalize_date;
pub use naming::derive_abbreviation;
