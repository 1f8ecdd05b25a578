//! Document lifecycle transitions
//!
//! Submitting or cancelling a document races any concurrent edit: the ERP
//! rejects the write with a timestamp mismatch when the document changed
//! since it was last read. The driver resolves such conflicts by
//! re-fetching the latest representation and retrying with backoff, a
//! bounded number of times. A response saying the document is already in
//! the requested state counts as success, which makes every transition
//! safe to repeat.

use std::sync::Arc;
use std::time::Duration;

use paybridge_domain::constants::{LIFECYCLE_BACKOFF_UNIT_SECS, LIFECYCLE_MAX_ATTEMPTS};
use paybridge_domain::{DocStatus, DocType, Document, ErpError, Result};
use tracing::{debug, info, warn};

use crate::erp_ports::DocumentApi;

/// Retry tuning for lifecycle transitions.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Total attempts per transition, initial try included.
    pub max_attempts: usize,
    /// Unit multiplied by `attempt * 2` between conflict retries.
    /// Seconds in production; tests shrink it to milliseconds.
    pub backoff_unit: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_attempts: LIFECYCLE_MAX_ATTEMPTS,
            backoff_unit: Duration::from_secs(LIFECYCLE_BACKOFF_UNIT_SECS),
        }
    }
}

/// How a transition concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The ERP applied the transition; latest representation attached.
    Applied(Document),
    /// The document was already in the requested state. Not an error.
    AlreadyInTargetState,
}

/// Drives documents through submit and cancel.
///
/// Reused for every doctype; salary slips go through [`submit_with`] so
/// their totals are re-validated against the freshly fetched document on
/// each retry.
///
/// [`submit_with`]: LifecycleDriver::submit_with
#[derive(Clone)]
pub struct LifecycleDriver {
    api: Arc<dyn DocumentApi>,
    config: LifecycleConfig,
}

impl LifecycleDriver {
    pub fn new(api: Arc<dyn DocumentApi>) -> Self {
        Self::with_config(api, LifecycleConfig::default())
    }

    pub fn with_config(api: Arc<dyn DocumentApi>, config: LifecycleConfig) -> Self {
        Self { api, config }
    }

    /// Submit a document by name.
    ///
    /// # Errors
    ///
    /// Propagates any non-conflict ERP error immediately; returns the last
    /// conflict error once retries are exhausted.
    pub async fn submit(&self, doctype: DocType, name: &str) -> Result<TransitionOutcome> {
        self.transition(doctype, name, DocStatus::Submitted, |_| Ok(())).await
    }

    /// Submit with a prepare hook applied to the re-fetched document
    /// before each retry.
    ///
    /// The hook never sees the first attempt's minimal reference, only
    /// full documents fetched after a conflict, so it can safely derive
    /// fields from child tables.
    ///
    /// # Errors
    ///
    /// Same contract as [`submit`](Self::submit); prepare-hook failures
    /// propagate as-is.
    pub async fn submit_with<F>(
        &self,
        doctype: DocType,
        name: &str,
        prepare: F,
    ) -> Result<TransitionOutcome>
    where
        F: FnMut(&mut Document) -> Result<()> + Send,
    {
        self.transition(doctype, name, DocStatus::Submitted, prepare).await
    }

    /// Cancel a document by name.
    ///
    /// # Errors
    ///
    /// Same contract as [`submit`](Self::submit).
    pub async fn cancel(&self, doctype: DocType, name: &str) -> Result<TransitionOutcome> {
        self.transition(doctype, name, DocStatus::Cancelled, |_| Ok(())).await
    }

    async fn transition<F>(
        &self,
        doctype: DocType,
        name: &str,
        target: DocStatus,
        mut prepare: F,
    ) -> Result<TransitionOutcome>
    where
        F: FnMut(&mut Document) -> Result<()> + Send,
    {
        let max_attempts = self.config.max_attempts.max(1);
        // First attempt carries the minimal reference; a conflict widens
        // it to the full latest document.
        let mut body = Document::reference(doctype, name);

        for attempt in 1..=max_attempts {
            let result = match target {
                DocStatus::Submitted => self.api.submit(&body).await,
                DocStatus::Cancelled => self.api.cancel(&body).await,
                DocStatus::Draft => {
                    return Err(ErpError::Internal(
                        "draft is not a transition target".to_string(),
                    ))
                }
            };

            match result {
                Ok(doc) => {
                    info!(%doctype, name, %target, attempt, "lifecycle transition applied");
                    return Ok(TransitionOutcome::Applied(doc));
                }
                Err(err) if err.indicates_already_in(target) => {
                    debug!(%doctype, name, %target, "document already in target state");
                    return Ok(TransitionOutcome::AlreadyInTargetState);
                }
                Err(err @ ErpError::TimestampMismatch(_)) => {
                    if attempt == max_attempts {
                        warn!(%doctype, name, %target, attempt, "conflict retries exhausted");
                        return Err(err);
                    }
                    warn!(%doctype, name, %target, attempt, "concurrent edit detected, re-fetching");
                    self.sleep_with_backoff(attempt).await;
                    body = self.api.get(doctype, name).await?.ok_or_else(|| {
                        ErpError::Internal(format!(
                            "{doctype} {name} vanished while resolving an edit conflict"
                        ))
                    })?;
                    prepare(&mut body)?;
                }
                Err(err) => return Err(err),
            }
        }

        // Loop always returns within max_attempts iterations.
        Err(ErpError::Internal("lifecycle transition loop exited without result".to_string()))
    }

    async fn sleep_with_backoff(&self, attempt: usize) {
        let delay = self.backoff_delay(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt.min(16) * 2).unwrap_or(u32::MAX);
        self.config.backoff_unit.saturating_mul(factor)
    }
}
