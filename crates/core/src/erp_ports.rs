//! ERP document API port
//!
//! The single seam between business logic and the remote ERP. The infra
//! crate provides the HTTP implementation; tests provide an in-memory one.
//!
//! Transitions and writes return the ERP's latest representation of the
//! document, which carries the server-assigned `name` and fresh `modified`
//! stamp. Implementations never retry; retry policy belongs to the
//! lifecycle driver and the resource accessors, where business context
//! decides what is safe to repeat.

use async_trait::async_trait;
use paybridge_domain::{DocType, Document, ListQuery, Result};

/// Typed request execution against the ERP's document endpoints.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Insert a new document. Returns the stored document including its
    /// server-assigned name.
    async fn insert(&self, doc: &Document) -> Result<Document>;

    /// Save changes to an existing document.
    async fn save(&self, doc: &Document) -> Result<Document>;

    /// Submit a draft document, finalizing it.
    async fn submit(&self, doc: &Document) -> Result<Document>;

    /// Cancel a submitted document.
    async fn cancel(&self, doc: &Document) -> Result<Document>;

    /// Delete a document outright. Only drafts and cancelled documents
    /// are deletable server-side.
    async fn delete(&self, doctype: DocType, name: &str) -> Result<()>;

    /// Fetch a single document by name. `Ok(None)` when it does not exist.
    async fn get(&self, doctype: DocType, name: &str) -> Result<Option<Document>>;

    /// List documents matching the query filters.
    async fn list(&self, query: &ListQuery) -> Result<Vec<Document>>;

    /// Lightweight connectivity probe. `Ok(false)` when the ERP is
    /// unreachable; errors are reserved for local failures.
    async fn ping(&self) -> Result<bool>;
}
