//! Salary structure assignment accessor
//!
//! An assignment binds an employee to a structure with a base amount
//! from a date. The "current" assignment as of a date is the latest one
//! whose `from_date` is on or before it, cancelled ones excluded.
//!
//! Once submitted, an assignment's base is immutable: a request to change
//! it is absorbed, the existing value wins, and the caller gets the
//! remote document back instead of an error.

use std::sync::Arc;

use paybridge_domain::constants::AMOUNT_TOLERANCE;
use paybridge_domain::{DocStatus, DocType, Document, ErpError, FilterOp, ListQuery, Result};
use tracing::{debug, info, instrument, warn};

use super::{insert_with_refetch, require_key, Ensured};
use crate::erp_ports::DocumentApi;
use crate::lifecycle::LifecycleDriver;

const LOOKUP_FIELDS: &[&str] =
    &["name", "employee", "salary_structure", "base", "from_date", "docstatus"];

/// Fully resolved assignment request: ERP names, ISO date.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentRequest {
    /// ERP employee name (not the payroll number).
    pub employee: String,
    /// Salary structure name; must already be submitted.
    pub structure: String,
    pub company: String,
    /// ISO `YYYY-MM-DD`.
    pub from_date: String,
    pub base: f64,
}

pub struct Assignments {
    api: Arc<dyn DocumentApi>,
    driver: LifecycleDriver,
}

impl Assignments {
    pub fn new(api: Arc<dyn DocumentApi>, driver: LifecycleDriver) -> Self {
        Self { api, driver }
    }

    /// Latest assignment for (employee, structure) effective on `as_of`.
    ///
    /// Lookup is "latest `from_date` ≤ target date", not an exact match;
    /// list rows only carry [`LOOKUP_FIELDS`].
    ///
    /// # Errors
    ///
    /// Propagates ERP errors; no current assignment reads as `None`.
    pub async fn current_for(
        &self,
        employee: &str,
        structure: &str,
        as_of: &str,
    ) -> Result<Option<Document>> {
        let query = ListQuery::new(DocType::SalaryStructureAssignment)
            .filter("employee", FilterOp::Eq, employee)
            .filter("salary_structure", FilterOp::Eq, structure)
            .filter("from_date", FilterOp::Lte, as_of)
            .filter("docstatus", FilterOp::Ne, DocStatus::Cancelled.as_int())
            .fields(LOOKUP_FIELDS.iter().copied())
            .order_by("from_date desc")
            .limit(1);
        Ok(self.api.list(&query).await?.into_iter().next())
    }

    /// Converge an assignment to the requested base.
    ///
    /// No current assignment: create and submit one. Current base within
    /// tolerance: reuse. Draft with a different base: update and submit.
    /// Submitted with a different base: keep the remote value (logged,
    /// never an error).
    ///
    /// # Errors
    ///
    /// Invalid input on empty keys; otherwise propagates ERP and
    /// lifecycle errors.
    #[instrument(skip(self, req), fields(employee = %req.employee, structure = %req.structure))]
    pub async fn ensure(&self, req: &AssignmentRequest) -> Result<Ensured> {
        let employee = require_key(&req.employee, "assignment employee")?;
        let structure = require_key(&req.structure, "assignment structure")?;

        let Some(existing) = self.current_for(employee, structure, &req.from_date).await? else {
            return self.create(req).await;
        };

        let current_base = existing.f64_field("base").unwrap_or(0.0);
        if (current_base - req.base).abs() <= AMOUNT_TOLERANCE {
            debug!(employee, structure, base = current_base, "assignment base already matches");
            return Ok(Ensured::reused(existing));
        }

        match existing.docstatus {
            DocStatus::Draft => self.update_base(&existing, req.base).await,
            _ => {
                warn!(
                    employee,
                    structure,
                    existing_base = current_base,
                    requested_base = req.base,
                    "assignment is submitted, keeping existing base"
                );
                Ok(Ensured::reused(existing))
            }
        }
    }

    async fn create(&self, req: &AssignmentRequest) -> Result<Ensured> {
        let doc = Document::new(DocType::SalaryStructureAssignment)
            .with_field("employee", req.employee.as_str())
            .with_field("salary_structure", req.structure.as_str())
            .with_field("company", req.company.as_str())
            .with_field("from_date", req.from_date.as_str())
            .with_field("base", req.base);

        let ensured = insert_with_refetch(self.api.as_ref(), &doc, || {
            self.current_for(&req.employee, &req.structure, &req.from_date)
        })
        .await?;

        let name = ensured.resolved_name()?.to_string();
        self.driver.submit(DocType::SalaryStructureAssignment, &name).await?;
        info!(
            employee = %req.employee,
            structure = %req.structure,
            base = req.base,
            "created and submitted assignment"
        );
        Ok(ensured)
    }

    /// Update the base of a draft assignment, then submit it.
    ///
    /// Works on the full remote document so the save carries the latest
    /// `modified` stamp.
    async fn update_base(&self, row: &Document, base: f64) -> Result<Ensured> {
        let name = row.name.as_deref().ok_or_else(|| {
            ErpError::Internal("assignment list row came back without a name".to_string())
        })?;
        let mut doc =
            self.api.get(DocType::SalaryStructureAssignment, name).await?.ok_or_else(|| {
                ErpError::Internal(format!("assignment {name} vanished between list and get"))
            })?;

        doc.set_field("base", base);
        let saved = self.api.save(&doc).await?;
        self.driver.submit(DocType::SalaryStructureAssignment, name).await?;
        info!(assignment = name, base, "updated draft assignment base and submitted");
        Ok(Ensured::updated(saved))
    }
}
