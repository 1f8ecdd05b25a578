//! Salary component accessor
//!
//! A component is either formula-derived or valued directly from the
//! assignment base, never both. The ERP expresses that as the flag pair
//! `amount_based_on_formula` / `depends_on_payment_days`; both are
//! derived here from formula presence alone so no caller can send a
//! contradictory combination.

use std::sync::Arc;

use paybridge_domain::utils::derive_abbreviation;
use paybridge_domain::{DocType, Document, Outcome, Result, SalaryComponentSpec};
use tracing::{debug, info, instrument};

use super::{insert_with_refetch, require_key, Ensured};
use crate::erp_ports::DocumentApi;

pub struct Components {
    api: Arc<dyn DocumentApi>,
}

impl Components {
    pub fn new(api: Arc<dyn DocumentApi>) -> Self {
        Self { api }
    }

    /// Fetch a component by name.
    ///
    /// # Errors
    ///
    /// Propagates every error except not-found, which reads as `None`.
    pub async fn get(&self, name: &str) -> Result<Option<Document>> {
        self.api.get(DocType::SalaryComponent, name).await
    }

    /// Get-or-create a salary component.
    ///
    /// # Errors
    ///
    /// Invalid input on an empty name; otherwise propagates ERP errors.
    #[instrument(skip(self, spec), fields(component = %spec.name))]
    pub async fn ensure(&self, spec: &SalaryComponentSpec) -> Result<Ensured> {
        let name = require_key(&spec.name, "salary component name")?;

        if let Some(existing) = self.get(name).await? {
            debug!(component = name, "salary component already exists, reusing");
            return Ok(Ensured::reused(existing));
        }

        let abbreviation = spec
            .abbreviation
            .as_deref()
            .map(str::trim)
            .filter(|abbr| !abbr.is_empty())
            .map_or_else(|| derive_abbreviation(name), str::to_string);
        let formula = spec.formula.as_deref().map(str::trim).filter(|f| !f.is_empty());

        let mut doc = Document::new(DocType::SalaryComponent)
            .with_field("salary_component", name)
            .with_field("salary_component_abbr", abbreviation)
            .with_field("type", spec.kind.as_str())
            .with_field("amount_based_on_formula", i32::from(formula.is_some()))
            .with_field("depends_on_payment_days", i32::from(formula.is_none()));
        if let Some(formula) = formula {
            doc.set_field("formula", formula);
        }

        let ensured = insert_with_refetch(self.api.as_ref(), &doc, || self.get(name)).await?;
        if ensured.outcome == Outcome::Created {
            info!(component = name, formula_based = formula.is_some(), "created salary component");
        }
        Ok(ensured)
    }
}
