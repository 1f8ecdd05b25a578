//! Error types used throughout the application
//!
//! Remote ERP failures arrive as an HTTP status plus an opaque error body
//! (exception text, sometimes a serialized traceback). All substring
//! heuristics that turn that body into a typed error live here, in one
//! place, so callers never match on raw text themselves.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::DocStatus;

/// Main error type for PayBridge
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ErpError {
    /// The ERP rejected an insert because a document with the same
    /// identity already exists.
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// The ERP rejected the payload on business-rule grounds.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Optimistic-concurrency conflict: the document changed remotely
    /// since it was last fetched.
    #[error("Timestamp mismatch: {0}")]
    TimestampMismatch(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Remote failure that matched no known category.
    #[error("ERP error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for PayBridge operations
pub type Result<T> = std::result::Result<T, ErpError>;

// Marker substrings emitted by the ERP. The body is matched verbatim, so
// these must cover both the exception class name and the human message.
const DUPLICATE_MARKERS: &[&str] = &["DuplicateEntryError", "Duplicate entry"];
const TIMESTAMP_MARKERS: &[&str] =
    &["TimestampMismatchError", "has been modified after you have opened"];
const PERMISSION_MARKERS: &[&str] =
    &["PermissionError", "Not permitted", "Insufficient Permission"];
const VALIDATION_MARKERS: &[&str] = &["ValidationError", "MandatoryError"];

const ALREADY_SUBMITTED_MARKERS: &[&str] = &["already submitted", "docstatus from 1 to 1"];
const ALREADY_CANCELLED_MARKERS: &[&str] =
    &["already cancelled", "docstatus from 2 to 2", "cannot edit cancelled"];

const MAX_REMOTE_MESSAGE_LEN: usize = 500;

impl ErpError {
    /// Classify a non-success ERP response into a typed error.
    ///
    /// Marker substrings are checked most-specific first because the ERP
    /// exception hierarchy means a timestamp or duplicate body usually
    /// contains `ValidationError` somewhere in its traceback too. When no
    /// marker matches, 401/403 map to [`ErpError::PermissionDenied`] and
    /// everything else falls through to [`ErpError::Remote`].
    #[must_use]
    pub fn classify_remote(status: u16, body: &str) -> Self {
        let message = extract_remote_message(body);

        if contains_any(body, DUPLICATE_MARKERS) {
            return Self::DuplicateEntry(message);
        }
        if contains_any(body, TIMESTAMP_MARKERS) {
            return Self::TimestampMismatch(message);
        }
        if contains_any(body, PERMISSION_MARKERS) {
            return Self::PermissionDenied(message);
        }
        if contains_any(body, VALIDATION_MARKERS) {
            return Self::Validation(message);
        }

        match status {
            401 | 403 => Self::PermissionDenied(message),
            _ => Self::Remote { status, message },
        }
    }

    /// True when the error text says the document is already in `target`
    /// state, e.g. submitting an already-submitted document.
    ///
    /// Lifecycle drivers treat these as success rather than failures.
    #[must_use]
    pub fn indicates_already_in(&self, target: DocStatus) -> bool {
        let message = match self {
            Self::Validation(m) | Self::DuplicateEntry(m) => m,
            Self::Remote { message, .. } => message,
            _ => return false,
        };
        let lowered = message.to_lowercase();
        let markers = match target {
            DocStatus::Submitted => ALREADY_SUBMITTED_MARKERS,
            DocStatus::Cancelled => ALREADY_CANCELLED_MARKERS,
            DocStatus::Draft => return false,
        };
        markers.iter().any(|marker| lowered.contains(marker))
    }

    /// True for conflicts that a caller may resolve by re-fetching the
    /// remote document (duplicate identity or concurrent modification).
    #[must_use]
    pub const fn is_refetchable_conflict(&self) -> bool {
        matches!(self, Self::DuplicateEntry(_) | Self::TimestampMismatch(_))
    }
}

/// Pull a readable message out of an ERP error body.
///
/// Bodies are frequently JSON objects carrying an `exception` string (and
/// sometimes a `message`); plain-text bodies are passed through. Output is
/// truncated so a traceback never floods logs or reports.
fn extract_remote_message(body: &str) -> String {
    let extracted = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["exception", "message", "exc_type"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string());

    if extracted.is_empty() {
        return "no error detail provided".to_string();
    }
    truncate(&extracted, MAX_REMOTE_MESSAGE_LEN)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    // Respect char boundaries; byte slicing may split a UTF-8 sequence.
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
