//! Employee accessor
//!
//! Employees carry two identifiers: the payroll number the upstream
//! system knows (`employee_number`) and the ERP-assigned document name.
//! All lookups here go by payroll number; callers receive documents whose
//! `name` is the ERP identifier to use in references.

use std::sync::Arc;

use paybridge_domain::utils::normalize_date;
use paybridge_domain::{DocType, Document, EmployeeSpec, FilterOp, ListQuery, Outcome, Result};
use tracing::{debug, info, instrument};

use super::{insert_with_refetch, require_key, Ensured};
use crate::erp_ports::DocumentApi;

const LOOKUP_FIELDS: &[&str] =
    &["name", "employee_number", "first_name", "company", "docstatus"];

pub struct Employees {
    api: Arc<dyn DocumentApi>,
}

impl Employees {
    pub fn new(api: Arc<dyn DocumentApi>) -> Self {
        Self { api }
    }

    /// Look up an employee by payroll number.
    ///
    /// # Errors
    ///
    /// Propagates ERP errors; an absent employee reads as `None`.
    pub async fn get_by_number(&self, employee_number: &str) -> Result<Option<Document>> {
        let query = ListQuery::new(DocType::Employee)
            .filter("employee_number", FilterOp::Eq, employee_number)
            .fields(LOOKUP_FIELDS.iter().copied())
            .limit(1);
        Ok(self.api.list(&query).await?.into_iter().next())
    }

    /// Get-or-create an employee by payroll number.
    ///
    /// Dates are normalized to ISO before anything reaches the ERP.
    ///
    /// # Errors
    ///
    /// Invalid input on an empty number or unparseable date; otherwise
    /// propagates ERP errors.
    #[instrument(skip(self, spec, company), fields(employee = %spec.employee_number))]
    pub async fn ensure(&self, spec: &EmployeeSpec, company: &str) -> Result<Ensured> {
        let number = require_key(&spec.employee_number, "employee number")?;

        if let Some(existing) = self.get_by_number(number).await? {
            debug!(employee = number, "employee already exists, reusing");
            return Ok(Ensured::reused(existing));
        }

        let date_of_birth = normalize_date(&spec.date_of_birth)?;
        let date_of_joining = normalize_date(&spec.date_of_joining)?;

        let mut doc = Document::new(DocType::Employee)
            .with_field("employee_number", number)
            .with_field("first_name", spec.first_name.trim())
            .with_field("date_of_birth", date_of_birth)
            .with_field("date_of_joining", date_of_joining)
            .with_field("company", company);
        if let Some(last_name) = spec.last_name.as_deref().map(str::trim).filter(|v| !v.is_empty())
        {
            doc.set_field("last_name", last_name);
        }
        if let Some(gender) = spec.gender.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            doc.set_field("gender", gender);
        }

        let ensured =
            insert_with_refetch(self.api.as_ref(), &doc, || self.get_by_number(number)).await?;
        if ensured.outcome == Outcome::Created {
            info!(employee = number, "created employee");
        }
        Ok(ensured)
    }
}
