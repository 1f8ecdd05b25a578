//! Salary structure accessor
//!
//! A structure must be submitted before assignments or slips can use it,
//! so the common entry point is [`Structures::ensure_submitted`]: it
//! creates or converges the structure, then drives it to submitted.
//! Row updates only apply while the structure is still draft; a submitted
//! structure with different rows is reused as-is with a warning.

use std::sync::Arc;

use paybridge_domain::constants::AMOUNT_TOLERANCE;
use paybridge_domain::{
    coerce_f64, DocStatus, DocType, Document, Outcome, Result, SalaryStructureSpec, StructureLine,
};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use super::{insert_with_refetch, require_key, Ensured};
use crate::erp_ports::DocumentApi;
use crate::lifecycle::LifecycleDriver;

const EARNINGS_TABLE: &str = "earnings";
const DEDUCTIONS_TABLE: &str = "deductions";

pub struct Structures {
    api: Arc<dyn DocumentApi>,
    driver: LifecycleDriver,
}

impl Structures {
    pub fn new(api: Arc<dyn DocumentApi>, driver: LifecycleDriver) -> Self {
        Self { api, driver }
    }

    /// Fetch a structure by name.
    ///
    /// # Errors
    ///
    /// Propagates every error except not-found, which reads as `None`.
    pub async fn get(&self, name: &str) -> Result<Option<Document>> {
        self.api.get(DocType::SalaryStructure, name).await
    }

    /// Create or converge a structure, without touching its lifecycle.
    ///
    /// # Errors
    ///
    /// Invalid input on an empty name; otherwise propagates ERP errors.
    #[instrument(skip(self, spec, company), fields(structure = %spec.name))]
    pub async fn ensure(&self, spec: &SalaryStructureSpec, company: &str) -> Result<Ensured> {
        let name = require_key(&spec.name, "salary structure name")?;
        let earnings = rows_from_lines(&spec.earnings);
        let deductions = rows_from_lines(&spec.deductions);

        let Some(mut existing) = self.get(name).await? else {
            let mut doc = Document::reference(DocType::SalaryStructure, name)
                .with_field("company", company)
                .with_field(EARNINGS_TABLE, earnings)
                .with_field(DEDUCTIONS_TABLE, deductions);
            doc.set_field("is_active", "Yes");
            let ensured = insert_with_refetch(self.api.as_ref(), &doc, || self.get(name)).await?;
            if ensured.outcome == Outcome::Created {
                info!(structure = name, "created salary structure");
            }
            return Ok(ensured);
        };

        let rows_differ = !tables_match(&existing, &earnings, &deductions);
        match existing.docstatus {
            DocStatus::Draft if rows_differ => {
                existing.set_field(EARNINGS_TABLE, earnings);
                existing.set_field(DEDUCTIONS_TABLE, deductions);
                let saved = self.api.save(&existing).await?;
                info!(structure = name, "updated draft salary structure rows");
                Ok(Ensured::updated(saved))
            }
            DocStatus::Draft => {
                debug!(structure = name, "draft structure already matches, reusing");
                Ok(Ensured::reused(existing))
            }
            _ => {
                if rows_differ {
                    warn!(
                        structure = name,
                        status = %existing.docstatus,
                        "structure is past draft with different rows, keeping remote version"
                    );
                }
                Ok(Ensured::reused(existing))
            }
        }
    }

    /// Create or converge a structure and drive it to submitted.
    ///
    /// Already-submitted structures pass straight through; a failed
    /// submission blocks every assignment and slip depending on it, so
    /// the error propagates.
    ///
    /// # Errors
    ///
    /// Same contract as [`ensure`](Self::ensure), plus lifecycle errors
    /// from the submit.
    pub async fn ensure_submitted(
        &self,
        spec: &SalaryStructureSpec,
        company: &str,
    ) -> Result<Ensured> {
        let ensured = self.ensure(spec, company).await?;
        let name = ensured.resolved_name()?.to_string();
        self.driver.submit(DocType::SalaryStructure, &name).await?;
        Ok(ensured)
    }
}

/// Convert spec lines to the ERP's child-table rows.
fn rows_from_lines(lines: &[StructureLine]) -> Value {
    Value::Array(
        lines
            .iter()
            .map(|line| {
                let mut row = json!({
                    "salary_component": line.component,
                    "amount_based_on_formula": i32::from(line.formula.is_some()),
                });
                if let Some(formula) = &line.formula {
                    row["formula"] = json!(formula);
                }
                if let Some(amount) = line.amount {
                    row["amount"] = json!(amount);
                }
                row
            })
            .collect(),
    )
}

fn tables_match(existing: &Document, earnings: &Value, deductions: &Value) -> bool {
    rows_match(existing.rows(EARNINGS_TABLE), earnings)
        && rows_match(existing.rows(DEDUCTIONS_TABLE), deductions)
}

/// Compare desired rows against remote rows on the fields this client
/// writes; the ERP decorates rows with bookkeeping fields we ignore.
fn rows_match(remote: &[Value], desired: &Value) -> bool {
    let Some(desired_rows) = desired.as_array() else { return false };
    if remote.len() != desired_rows.len() {
        return false;
    }
    remote.iter().zip(desired_rows).all(|(have, want)| {
        have.get("salary_component") == want.get("salary_component")
            && have.get("formula").and_then(Value::as_str)
                == want.get("formula").and_then(Value::as_str)
            && match (
                have.get("amount").and_then(coerce_f64),
                want.get("amount").and_then(coerce_f64),
            ) {
                (Some(a), Some(b)) => (a - b).abs() <= AMOUNT_TOLERANCE,
                (a, b) => a == b,
            }
    })
}
