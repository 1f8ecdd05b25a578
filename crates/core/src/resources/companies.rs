//! Company accessor
//!
//! Companies are the provisioning root: every other entity references one.
//! The ERP names a company after its `company_name`, so the spec name
//! doubles as the lookup key.

use std::sync::Arc;

use paybridge_domain::utils::derive_abbreviation;
use paybridge_domain::{CompanySpec, DocType, Document, ImportConfig, Outcome, Result};
use tracing::{debug, info, instrument};

use super::{insert_with_refetch, require_key, Ensured};
use crate::erp_ports::DocumentApi;

pub struct Companies {
    api: Arc<dyn DocumentApi>,
}

impl Companies {
    pub fn new(api: Arc<dyn DocumentApi>) -> Self {
        Self { api }
    }

    /// Fetch a company by name.
    ///
    /// # Errors
    ///
    /// Propagates every error except not-found, which reads as `None`.
    pub async fn get(&self, name: &str) -> Result<Option<Document>> {
        self.api.get(DocType::Company, name).await
    }

    /// Get-or-create a company.
    ///
    /// The abbreviation is derived from the name when the spec omits it;
    /// currency and country fall back to the import defaults.
    ///
    /// # Errors
    ///
    /// Invalid input on an empty name; otherwise propagates ERP errors.
    #[instrument(skip(self, spec, defaults), fields(company = %spec.name))]
    pub async fn ensure(&self, spec: &CompanySpec, defaults: &ImportConfig) -> Result<Ensured> {
        let name = require_key(&spec.name, "company name")?;

        if let Some(existing) = self.get(name).await? {
            debug!(company = name, "company already exists, reusing");
            return Ok(Ensured::reused(existing));
        }

        let abbreviation = spec
            .abbreviation
            .as_deref()
            .map(str::trim)
            .filter(|abbr| !abbr.is_empty())
            .map_or_else(|| derive_abbreviation(name), str::to_string);
        let currency =
            spec.currency.clone().unwrap_or_else(|| defaults.default_currency.clone());
        let country = spec.country.clone().unwrap_or_else(|| defaults.default_country.clone());

        let doc = Document::new(DocType::Company)
            .with_field("company_name", name)
            .with_field("abbr", abbreviation)
            .with_field("default_currency", currency)
            .with_field("country", country);

        let ensured = insert_with_refetch(self.api.as_ref(), &doc, || self.get(name)).await?;
        if ensured.outcome == Outcome::Created {
            info!(company = name, "created company");
        }
        Ok(ensured)
    }
}
