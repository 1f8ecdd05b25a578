//! Typed, idempotent resource accessors
//!
//! One accessor per entity kind, each built on the [`DocumentApi`] port.
//! Accessors own the entity-specific invariants (natural-key lookup,
//! mutually exclusive component flags, submitted-assignment immutability,
//! the slip period fallback chain); the port below them stays generic.
//!
//! Every `ensure` call converges: rerunning it with the same input reuses
//! what exists instead of duplicating it.

use std::future::Future;

use paybridge_domain::constants::DUPLICATE_REFETCH_ATTEMPTS;
use paybridge_domain::{Document, ErpError, Outcome, Result};
use tracing::debug;

use crate::erp_ports::DocumentApi;

pub mod assignments;
pub mod companies;
pub mod components;
pub mod employees;
pub mod slips;
pub mod structures;

pub use assignments::{AssignmentRequest, Assignments};
pub use companies::Companies;
pub use components::Components;
pub use employees::Employees;
pub use slips::{SlipRequest, Slips};
pub use structures::Structures;

/// Result of an ensure-style call: the live document plus what happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensured {
    pub document: Document,
    pub outcome: Outcome,
}

impl Ensured {
    pub(crate) fn created(document: Document) -> Self {
        Self { document, outcome: Outcome::Created }
    }

    pub(crate) fn reused(document: Document) -> Self {
        Self { document, outcome: Outcome::Reused }
    }

    pub(crate) fn updated(document: Document) -> Self {
        Self { document, outcome: Outcome::Updated }
    }

    /// Server-assigned document name.
    ///
    /// # Errors
    ///
    /// Internal error if the ERP returned a document without a name,
    /// which would break every downstream reference.
    pub fn resolved_name(&self) -> Result<&str> {
        self.document.name.as_deref().ok_or_else(|| {
            ErpError::Internal(format!(
                "{} document came back without a name",
                self.document.doctype
            ))
        })
    }
}

/// Insert a document, absorbing a duplicate-entry rejection by re-fetching
/// the existing document.
///
/// The re-fetch runs up to [`DUPLICATE_REFETCH_ATTEMPTS`] times without
/// sleeping: the ERP may serve stale reads right after the competing
/// insert, and repeated lookups tolerate that lag without assuming it.
/// When every re-fetch still misses, the original duplicate error
/// propagates.
pub(crate) async fn insert_with_refetch<F, Fut>(
    api: &dyn DocumentApi,
    doc: &Document,
    refetch: F,
) -> Result<Ensured>
where
    F: Fn() -> Fut + Send,
    Fut: Future<Output = Result<Option<Document>>> + Send,
{
    match api.insert(doc).await {
        Ok(created) => Ok(Ensured::created(created)),
        Err(err @ ErpError::DuplicateEntry(_)) => {
            debug!(doctype = %doc.doctype, "insert hit a duplicate, re-fetching existing document");
            for _ in 0..DUPLICATE_REFETCH_ATTEMPTS {
                if let Some(existing) = refetch().await? {
                    return Ok(Ensured::reused(existing));
                }
            }
            Err(err)
        }
        Err(err) => Err(err),
    }
}

/// Reject empty natural keys before they reach the ERP.
pub(crate) fn require_key<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ErpError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(trimmed)
}
