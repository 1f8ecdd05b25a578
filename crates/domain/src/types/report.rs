//! Per-run import reporting
//!
//! Every record in a batch produces exactly one outcome, failures
//! included, so a report always accounts for the whole input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::DocType;

/// What happened to a single record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    /// Inserted fresh.
    Created,
    /// Found already present and left as-is.
    Reused,
    /// Found present but converged to the requested state.
    Updated,
    /// Could not be processed; the reason is preserved verbatim.
    Failed(String),
}

impl Outcome {
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome of one input record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordOutcome {
    pub entity: DocType,
    /// Natural key from the input spec (company name, employee number, ...).
    pub key: String,
    /// ERP document name, when resolution got that far.
    pub resolved_name: Option<String>,
    pub outcome: Outcome,
}

/// Aggregate counters over a report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub created: usize,
    pub reused: usize,
    pub updated: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.created + self.reused + self.updated + self.failed
    }
}

/// Report for one import run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records: Vec<RecordOutcome>,
}

impl BatchReport {
    /// Start a new report with a fresh run id.
    #[must_use]
    pub fn begin() -> Self {
        Self { run_id: Uuid::new_v4(), started_at: Utc::now(), finished_at: None, records: Vec::new() }
    }

    pub fn push(
        &mut self,
        entity: DocType,
        key: impl Into<String>,
        resolved_name: Option<String>,
        outcome: Outcome,
    ) {
        self.records.push(RecordOutcome { entity, key: key.into(), resolved_name, outcome });
    }

    /// Mark the run finished. Idempotent; the first stamp wins.
    pub fn finish(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
    }

    #[must_use]
    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for record in &self.records {
            match record.outcome {
                Outcome::Created => counts.created += 1,
                Outcome::Reused => counts.reused += 1,
                Outcome::Updated => counts.updated += 1,
                Outcome::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.records.iter().filter(|record| record.outcome.is_failure())
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}
