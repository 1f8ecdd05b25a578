//! Salary slip accessor
//!
//! Slip period queries are ambiguous: depending on how a slip was
//! generated, its start date, end date, or neither may fall inside the
//! window being asked about. The lookup therefore runs an ordered chain
//! of filter strategies and merges the results by document name. Saves
//! and submits always pass through the totals reconciler first.

use std::sync::Arc;

use paybridge_domain::constants::AMOUNT_TOLERANCE;
use paybridge_domain::{
    coerce_f64, DocStatus, DocType, Document, ErpError, FilterOp, ListQuery, Result, SlipLine,
    SlipSavePolicy,
};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use super::{insert_with_refetch, require_key, Ensured};
use crate::erp_ports::DocumentApi;
use crate::lifecycle::{LifecycleDriver, TransitionOutcome};
use crate::reconcile::reconcile_slip;

const EARNINGS_TABLE: &str = "earnings";
const DEDUCTIONS_TABLE: &str = "deductions";
const LOOKUP_FIELDS: &[&str] = &["name", "employee", "start_date", "end_date", "docstatus"];

/// Fully resolved slip request: ERP names, ISO dates.
#[derive(Debug, Clone, PartialEq)]
pub struct SlipRequest {
    /// ERP employee name (not the payroll number).
    pub employee: String,
    pub structure: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub earnings: Vec<SlipLine>,
    pub deductions: Vec<SlipLine>,
}

pub struct Slips {
    api: Arc<dyn DocumentApi>,
    driver: LifecycleDriver,
    policy: SlipSavePolicy,
}

impl Slips {
    pub fn new(api: Arc<dyn DocumentApi>, driver: LifecycleDriver, policy: SlipSavePolicy) -> Self {
        Self { api, driver, policy }
    }

    /// Find an employee's slips touching the period `[start, end]`.
    ///
    /// Runs up to three filter strategies in order: start date inside the
    /// window, end date inside the window, then period overlap. Results
    /// are merged by document name. The chain stops after the first
    /// strategy only when it already matched; later strategies exist for
    /// slips the first one cannot see.
    ///
    /// # Errors
    ///
    /// Propagates ERP errors from any strategy.
    pub async fn find_for_period(
        &self,
        employee: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<Document>> {
        let strategies = [
            ListQuery::new(DocType::SalarySlip)
                .filter("employee", FilterOp::Eq, employee)
                .filter("start_date", FilterOp::Gte, start)
                .filter("start_date", FilterOp::Lte, end),
            ListQuery::new(DocType::SalarySlip)
                .filter("employee", FilterOp::Eq, employee)
                .filter("end_date", FilterOp::Gte, start)
                .filter("end_date", FilterOp::Lte, end),
            ListQuery::new(DocType::SalarySlip)
                .filter("employee", FilterOp::Eq, employee)
                .filter("start_date", FilterOp::Lte, end)
                .filter("end_date", FilterOp::Gte, start),
        ];

        let mut merged: Vec<Document> = Vec::new();
        for (index, strategy) in strategies.into_iter().enumerate() {
            let query = strategy.fields(LOOKUP_FIELDS.iter().copied());
            for doc in self.api.list(&query).await? {
                let duplicate = doc
                    .name
                    .as_deref()
                    .is_some_and(|name| merged.iter().any(|m| m.name.as_deref() == Some(name)));
                if !duplicate {
                    merged.push(doc);
                }
            }
            if index == 0 && !merged.is_empty() {
                break;
            }
        }
        debug!(employee, start, end, found = merged.len(), "slip period lookup finished");
        Ok(merged)
    }

    /// Converge a slip for (employee, period) to the requested lines.
    ///
    /// Existing and already submitted with matching lines: no-op. Existing
    /// with different lines: rewrite, save, resubmit. Absent: insert and
    /// submit. Totals are reconciled before every save and before every
    /// submit attempt.
    ///
    /// # Errors
    ///
    /// Invalid input on an empty employee; under
    /// [`SlipSavePolicy::RespectLifecycle`] saving a submitted slip
    /// surfaces the ERP's rejection. Other ERP errors propagate.
    #[instrument(skip(self, req), fields(employee = %req.employee, start = %req.start_date))]
    pub async fn ensure(&self, req: &SlipRequest) -> Result<Ensured> {
        let employee = require_key(&req.employee, "slip employee")?;

        let candidates =
            self.find_for_period(employee, &req.start_date, &req.end_date).await?;
        let Some(existing_name) =
            candidates.first().and_then(|doc| doc.name.as_deref().map(str::to_string))
        else {
            return self.create(req).await;
        };

        let Some(mut doc) = self.api.get(DocType::SalarySlip, &existing_name).await? else {
            // Lookup saw it but the fetch missed; treat as absent.
            warn!(slip = %existing_name, "slip vanished between list and get, creating fresh");
            return self.create(req).await;
        };

        if doc.docstatus == DocStatus::Submitted && lines_match(&doc, req) {
            debug!(slip = %existing_name, "submitted slip already matches, reusing");
            return Ok(Ensured::reused(doc));
        }

        apply_request(&mut doc, req);
        if self.policy == SlipSavePolicy::AlwaysDraftOnSave {
            // Force the document editable instead of cancel-before-edit.
            doc.docstatus = DocStatus::Draft;
        }
        reconcile_slip(&mut doc)?;
        let saved = self.api.save(&doc).await?;
        self.submit_reconciled(&existing_name).await?;
        info!(slip = %existing_name, "rewrote and resubmitted slip");
        Ok(Ensured::updated(saved))
    }

    async fn create(&self, req: &SlipRequest) -> Result<Ensured> {
        let mut doc = Document::new(DocType::SalarySlip)
            .with_field("employee", req.employee.as_str())
            .with_field("start_date", req.start_date.as_str())
            .with_field("end_date", req.end_date.as_str())
            .with_field(EARNINGS_TABLE, rows_from_lines(&req.earnings))
            .with_field(DEDUCTIONS_TABLE, rows_from_lines(&req.deductions));
        if let Some(structure) = &req.structure {
            doc.set_field("salary_structure", structure.as_str());
        }
        reconcile_slip(&mut doc)?;

        let ensured = insert_with_refetch(self.api.as_ref(), &doc, || async {
            Ok(self
                .find_for_period(&req.employee, &req.start_date, &req.end_date)
                .await?
                .into_iter()
                .next())
        })
        .await?;

        let name = ensured.resolved_name()?.to_string();
        self.submit_reconciled(&name).await?;
        info!(slip = %name, employee = %req.employee, "created and submitted slip");
        Ok(ensured)
    }

    /// Submit with totals re-validated against every re-fetched document,
    /// so a conflict retry never submits stale aggregates.
    async fn submit_reconciled(&self, name: &str) -> Result<TransitionOutcome> {
        self.driver.submit_with(DocType::SalarySlip, name, reconcile_slip).await
    }

    /// Discard a stale draft slip outright.
    ///
    /// # Errors
    ///
    /// Rejects anything past draft; the ERP refuses those deletes anyway.
    pub async fn delete_draft(&self, name: &str) -> Result<()> {
        let Some(doc) = self.api.get(DocType::SalarySlip, name).await? else {
            return Ok(());
        };
        if doc.docstatus != DocStatus::Draft {
            return Err(ErpError::Validation(format!(
                "slip {name} is {} and cannot be deleted",
                doc.docstatus
            )));
        }
        self.api.delete(DocType::SalarySlip, name).await
    }
}

fn rows_from_lines(lines: &[SlipLine]) -> Value {
    Value::Array(
        lines
            .iter()
            .map(|line| json!({"salary_component": line.component, "amount": line.amount}))
            .collect(),
    )
}

fn lines_match(doc: &Document, req: &SlipRequest) -> bool {
    table_matches(doc.rows(EARNINGS_TABLE), &req.earnings)
        && table_matches(doc.rows(DEDUCTIONS_TABLE), &req.deductions)
}

fn apply_request(doc: &mut Document, req: &SlipRequest) {
    doc.set_field("employee", req.employee.as_str());
    doc.set_field("start_date", req.start_date.as_str());
    doc.set_field("end_date", req.end_date.as_str());
    doc.set_field(EARNINGS_TABLE, rows_from_lines(&req.earnings));
    doc.set_field(DEDUCTIONS_TABLE, rows_from_lines(&req.deductions));
    if let Some(structure) = &req.structure {
        doc.set_field("salary_structure", structure.as_str());
    }
}

/// Ordered comparison of remote rows against requested lines, amounts
/// within tolerance.
fn table_matches(remote: &[Value], desired: &[SlipLine]) -> bool {
    if remote.len() != desired.len() {
        return false;
    }
    remote.iter().zip(desired).all(|(row, line)| {
        row.get("salary_component").and_then(Value::as_str) == Some(line.component.as_str())
            && row
                .get("amount")
                .and_then(coerce_f64)
                .is_some_and(|amount| (amount - line.amount).abs() <= AMOUNT_TOLERANCE)
    })
}
