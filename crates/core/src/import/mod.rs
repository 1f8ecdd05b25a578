//! Batch import orchestration
//!
//! Provisions a whole payroll batch against the ERP in the fixed
//! dependency order: company, employees, components, structure,
//! assignments, slips. The graph is static, so no ordering is computed.
//!
//! One record failing never aborts the rest, with two structural
//! exceptions: without a company nothing downstream can exist, and
//! without a submitted structure its assignments and slips cannot. Those
//! dependents are reported as skipped failures instead of being
//! attempted. Rerunning the same batch converges: everything already
//! provisioned is reused, not duplicated.

use std::collections::HashMap;
use std::sync::Arc;

use paybridge_domain::utils::normalize_date;
use paybridge_domain::{
    AssignmentSpec, BatchReport, DocType, ErpError, ImportBatch, ImportConfig, Outcome, Result,
    SalarySlipSpec, SlipLine,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::erp_ports::DocumentApi;
use crate::lifecycle::{LifecycleConfig, LifecycleDriver};
use crate::resources::{
    AssignmentRequest, Assignments, Companies, Components, Employees, Ensured, SlipRequest,
    Slips, Structures,
};

const SKIP_COMPANY: &str = "skipped: company provisioning failed";
const SKIP_STRUCTURE: &str = "skipped: salary structure was not submitted";
const SKIP_CANCELLED: &str = "skipped: import run was cancelled";

/// Natural-key to ERP-name resolutions accumulated during one run.
///
/// Owned by the run and threaded through the pipeline stages; each key is
/// written once and read by later stages. Dependents first consult this
/// context and only fall back to an ERP lookup for entities that
/// pre-exist outside the batch.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    company: Option<String>,
    employees: HashMap<String, String>,
    components: HashMap<String, String>,
    structures: HashMap<String, String>,
}

impl ResolutionContext {
    #[must_use]
    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    #[must_use]
    pub fn employee(&self, number: &str) -> Option<&str> {
        self.employees.get(number.trim()).map(String::as_str)
    }

    #[must_use]
    pub fn component(&self, name: &str) -> Option<&str> {
        self.components.get(name.trim()).map(String::as_str)
    }

    #[must_use]
    pub fn structure(&self, name: &str) -> Option<&str> {
        self.structures.get(name.trim()).map(String::as_str)
    }

    fn record_employee(&mut self, number: &str, resolved: String) {
        self.employees.insert(number.trim().to_string(), resolved);
    }

    fn record_component(&mut self, name: &str, resolved: String) {
        self.components.insert(name.trim().to_string(), resolved);
    }

    fn record_structure(&mut self, name: &str, resolved: String) {
        self.structures.insert(name.trim().to_string(), resolved);
    }
}

/// Best-effort, dependency-respecting, idempotent bulk upsert of one
/// payroll batch.
pub struct ImportOrchestrator {
    config: ImportConfig,
    companies: Companies,
    employees: Employees,
    components: Components,
    structures: Structures,
    assignments: Assignments,
    slips: Slips,
}

impl ImportOrchestrator {
    pub fn new(api: Arc<dyn DocumentApi>, config: ImportConfig) -> Self {
        Self::with_lifecycle_config(api, config, LifecycleConfig::default())
    }

    /// Construct with explicit retry tuning; tests shrink the backoff.
    pub fn with_lifecycle_config(
        api: Arc<dyn DocumentApi>,
        config: ImportConfig,
        lifecycle: LifecycleConfig,
    ) -> Self {
        let driver = LifecycleDriver::with_config(Arc::clone(&api), lifecycle);
        Self {
            companies: Companies::new(Arc::clone(&api)),
            employees: Employees::new(Arc::clone(&api)),
            components: Components::new(Arc::clone(&api)),
            structures: Structures::new(Arc::clone(&api), driver.clone()),
            assignments: Assignments::new(Arc::clone(&api), driver.clone()),
            slips: Slips::new(api, driver, config.slip_save_policy),
            config,
        }
    }

    /// Run a batch to completion.
    pub async fn run(&self, batch: &ImportBatch) -> BatchReport {
        self.run_cancellable(batch, &CancellationToken::new()).await
    }

    /// Run a batch, honoring a caller-supplied cancellation token.
    ///
    /// The token is checked between records: once cancelled, remaining
    /// records are reported as skipped failures and no further ERP calls
    /// are issued. Records are processed strictly sequentially; later
    /// steps read the resolutions earlier steps wrote.
    #[instrument(skip(self, batch, cancel), fields(records = batch.record_count()))]
    pub async fn run_cancellable(
        &self,
        batch: &ImportBatch,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let mut report = BatchReport::begin();
        let mut ctx = ResolutionContext::default();

        let company = self.step_company(batch, cancel, &mut ctx, &mut report).await;
        let Some(company) = company else {
            skip_dependents(batch, &mut report, SKIP_COMPANY, cancel.is_cancelled());
            report.finish();
            return report;
        };

        self.step_employees(batch, &company, cancel, &mut ctx, &mut report).await;
        self.step_components(batch, cancel, &mut ctx, &mut report).await;
        let failed_structure =
            self.step_structure(batch, &company, cancel, &mut ctx, &mut report).await;
        self.step_assignments(batch, &company, failed_structure.as_deref(), cancel, &ctx, &mut report)
            .await;
        self.step_slips(batch, failed_structure.as_deref(), cancel, &ctx, &mut report).await;

        report.finish();
        let counts = report.counts();
        info!(
            run_id = %report.run_id,
            created = counts.created,
            reused = counts.reused,
            updated = counts.updated,
            failed = counts.failed,
            "import run finished"
        );
        report
    }

    async fn step_company(
        &self,
        batch: &ImportBatch,
        cancel: &CancellationToken,
        ctx: &mut ResolutionContext,
        report: &mut BatchReport,
    ) -> Option<String> {
        let key = batch.company.name.clone();
        if cancel.is_cancelled() {
            report.push(DocType::Company, key, None, Outcome::failed(SKIP_CANCELLED));
            return None;
        }
        match self.companies.ensure(&batch.company, &self.config).await {
            Ok(ensured) => {
                let name = ensured
                    .document
                    .name
                    .clone()
                    .unwrap_or_else(|| batch.company.name.trim().to_string());
                if ensured.outcome == Outcome::Created {
                    // Give the ERP time to finish company fixture setup
                    // before dependents reference it.
                    let delay = self.config.settle_delay();
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                report.push(DocType::Company, key, Some(name.clone()), ensured.outcome);
                ctx.company = Some(name.clone());
                Some(name)
            }
            Err(err) => {
                warn!(company = %key, error = %err, "company provisioning failed");
                report.push(DocType::Company, key, None, Outcome::failed(err.to_string()));
                None
            }
        }
    }

    async fn step_employees(
        &self,
        batch: &ImportBatch,
        company: &str,
        cancel: &CancellationToken,
        ctx: &mut ResolutionContext,
        report: &mut BatchReport,
    ) {
        for spec in &batch.employees {
            let key = spec.employee_number.trim().to_string();
            if cancel.is_cancelled() {
                report.push(DocType::Employee, key, None, Outcome::failed(SKIP_CANCELLED));
                continue;
            }
            // In-batch duplicates collapse onto the first occurrence.
            if let Some(resolved) = ctx.employee(&key) {
                report.push(DocType::Employee, key.clone(), Some(resolved.to_string()), Outcome::Reused);
                continue;
            }
            match self.employees.ensure(spec, company).await.and_then(named_outcome) {
                Ok((name, outcome)) => {
                    ctx.record_employee(&key, name.clone());
                    report.push(DocType::Employee, key, Some(name), outcome);
                }
                Err(err) => {
                    report.push(DocType::Employee, key, None, Outcome::failed(err.to_string()));
                }
            }
        }
    }

    async fn step_components(
        &self,
        batch: &ImportBatch,
        cancel: &CancellationToken,
        ctx: &mut ResolutionContext,
        report: &mut BatchReport,
    ) {
        for spec in &batch.components {
            let key = spec.name.trim().to_string();
            if cancel.is_cancelled() {
                report.push(DocType::SalaryComponent, key, None, Outcome::failed(SKIP_CANCELLED));
                continue;
            }
            if let Some(resolved) = ctx.component(&key) {
                report.push(
                    DocType::SalaryComponent,
                    key.clone(),
                    Some(resolved.to_string()),
                    Outcome::Reused,
                );
                continue;
            }
            match self.components.ensure(spec).await.and_then(named_outcome) {
                Ok((name, outcome)) => {
                    ctx.record_component(&key, name.clone());
                    report.push(DocType::SalaryComponent, key, Some(name), outcome);
                }
                Err(err) => {
                    report.push(
                        DocType::SalaryComponent,
                        key,
                        None,
                        Outcome::failed(err.to_string()),
                    );
                }
            }
        }
    }

    /// Returns the structure name whose submission failed, if any; its
    /// dependents are skipped rather than attempted.
    async fn step_structure(
        &self,
        batch: &ImportBatch,
        company: &str,
        cancel: &CancellationToken,
        ctx: &mut ResolutionContext,
        report: &mut BatchReport,
    ) -> Option<String> {
        let spec = batch.structure.as_ref()?;
        let key = spec.name.trim().to_string();
        if cancel.is_cancelled() {
            report.push(DocType::SalaryStructure, key.clone(), None, Outcome::failed(SKIP_CANCELLED));
            return Some(key);
        }
        match self.structures.ensure_submitted(spec, company).await.and_then(named_outcome) {
            Ok((name, outcome)) => {
                ctx.record_structure(&key, name.clone());
                report.push(DocType::SalaryStructure, key, Some(name), outcome);
                None
            }
            Err(err) => {
                warn!(structure = %key, error = %err, "structure provisioning failed");
                report.push(
                    DocType::SalaryStructure,
                    key.clone(),
                    None,
                    Outcome::failed(err.to_string()),
                );
                Some(key)
            }
        }
    }

    async fn step_assignments(
        &self,
        batch: &ImportBatch,
        company: &str,
        failed_structure: Option<&str>,
        cancel: &CancellationToken,
        ctx: &ResolutionContext,
        report: &mut BatchReport,
    ) {
        for spec in &batch.assignments {
            let key = assignment_key(spec);
            if cancel.is_cancelled() {
                report.push(
                    DocType::SalaryStructureAssignment,
                    key,
                    None,
                    Outcome::failed(SKIP_CANCELLED),
                );
                continue;
            }
            if failed_structure == Some(spec.structure.trim()) {
                report.push(
                    DocType::SalaryStructureAssignment,
                    key,
                    None,
                    Outcome::failed(SKIP_STRUCTURE),
                );
                continue;
            }
            let outcome = self.ensure_assignment(spec, company, ctx).await;
            match outcome {
                Ok(ensured) => report.push(
                    DocType::SalaryStructureAssignment,
                    key,
                    ensured.document.name.clone(),
                    ensured.outcome,
                ),
                Err(err) => report.push(
                    DocType::SalaryStructureAssignment,
                    key,
                    None,
                    Outcome::failed(err.to_string()),
                ),
            }
        }
    }

    async fn ensure_assignment(
        &self,
        spec: &AssignmentSpec,
        company: &str,
        ctx: &ResolutionContext,
    ) -> Result<Ensured> {
        let employee = self.resolve_employee(ctx, &spec.employee).await?;
        let structure = self.resolve_structure(ctx, &spec.structure).await?;
        let from_date = normalize_date(&spec.from_date)?;
        self.assignments
            .ensure(&AssignmentRequest {
                employee,
                structure,
                company: company.to_string(),
                from_date,
                base: spec.base,
            })
            .await
    }

    async fn step_slips(
        &self,
        batch: &ImportBatch,
        failed_structure: Option<&str>,
        cancel: &CancellationToken,
        ctx: &ResolutionContext,
        report: &mut BatchReport,
    ) {
        for spec in &batch.slips {
            let key = slip_key(spec);
            if cancel.is_cancelled() {
                report.push(DocType::SalarySlip, key, None, Outcome::failed(SKIP_CANCELLED));
                continue;
            }
            let depends_on_failed = spec
                .structure
                .as_deref()
                .is_some_and(|name| failed_structure == Some(name.trim()));
            if depends_on_failed {
                report.push(DocType::SalarySlip, key, None, Outcome::failed(SKIP_STRUCTURE));
                continue;
            }
            match self.ensure_slip(spec, ctx).await {
                Ok(ensured) => report.push(
                    DocType::SalarySlip,
                    key,
                    ensured.document.name.clone(),
                    ensured.outcome,
                ),
                Err(err) => {
                    report.push(DocType::SalarySlip, key, None, Outcome::failed(err.to_string()));
                }
            }
        }
    }

    async fn ensure_slip(
        &self,
        spec: &SalarySlipSpec,
        ctx: &ResolutionContext,
    ) -> Result<Ensured> {
        let employee = self.resolve_employee(ctx, &spec.employee).await?;
        let structure = match spec.structure.as_deref() {
            Some(name) => Some(self.resolve_structure(ctx, name).await?),
            None => None,
        };
        let start_date = normalize_date(&spec.start_date)?;
        let end_date = normalize_date(&spec.end_date)?;
        self.slips
            .ensure(&SlipRequest {
                employee,
                structure,
                start_date,
                end_date,
                earnings: resolve_lines(&spec.earnings, ctx),
                deductions: resolve_lines(&spec.deductions, ctx),
            })
            .await
    }

    /// Resolve an employee reference: batch context first, then the ERP
    /// for employees that pre-exist outside the batch.
    async fn resolve_employee(&self, ctx: &ResolutionContext, number: &str) -> Result<String> {
        if let Some(resolved) = ctx.employee(number) {
            return Ok(resolved.to_string());
        }
        let found = self.employees.get_by_number(number.trim()).await?;
        found.and_then(|doc| doc.name).ok_or_else(|| {
            ErpError::InvalidInput(format!("employee '{}' not found in batch or ERP", number.trim()))
        })
    }

    async fn resolve_structure(&self, ctx: &ResolutionContext, name: &str) -> Result<String> {
        if let Some(resolved) = ctx.structure(name) {
            return Ok(resolved.to_string());
        }
        let found = self.structures.get(name.trim()).await?;
        found.and_then(|doc| doc.name).ok_or_else(|| {
            ErpError::InvalidInput(format!(
                "salary structure '{}' not found in batch or ERP",
                name.trim()
            ))
        })
    }
}

/// Extract the server-assigned name so the outcome can be reported and
/// recorded without holding onto the document.
fn named_outcome(ensured: Ensured) -> Result<(String, Outcome)> {
    let name = ensured.resolved_name()?.to_string();
    Ok((name, ensured.outcome))
}

/// Report every record below the company as skipped. Used when the
/// company, the structural root, could not be provisioned.
fn skip_dependents(batch: &ImportBatch, report: &mut BatchReport, reason: &str, cancelled: bool) {
    let reason = if cancelled { SKIP_CANCELLED } else { reason };
    for spec in &batch.employees {
        report.push(DocType::Employee, spec.employee_number.trim(), None, Outcome::failed(reason));
    }
    for spec in &batch.components {
        report.push(DocType::SalaryComponent, spec.name.trim(), None, Outcome::failed(reason));
    }
    if let Some(spec) = &batch.structure {
        report.push(DocType::SalaryStructure, spec.name.trim(), None, Outcome::failed(reason));
    }
    for spec in &batch.assignments {
        report.push(
            DocType::SalaryStructureAssignment,
            assignment_key(spec),
            None,
            Outcome::failed(reason),
        );
    }
    for spec in &batch.slips {
        report.push(DocType::SalarySlip, slip_key(spec), None, Outcome::failed(reason));
    }
}

/// Slip lines reference components by the name the batch used; map them
/// through the context where possible and pass pre-existing names through.
fn resolve_lines(lines: &[SlipLine], ctx: &ResolutionContext) -> Vec<SlipLine> {
    lines
        .iter()
        .map(|line| SlipLine {
            component: ctx
                .component(&line.component)
                .map_or_else(|| line.component.trim().to_string(), str::to_string),
            amount: line.amount,
        })
        .collect()
}

fn assignment_key(spec: &AssignmentSpec) -> String {
    format!("{}/{}", spec.employee.trim(), spec.structure.trim())
}

fn slip_key(spec: &SalarySlipSpec) -> String {
    format!("{}:{}..{}", spec.employee.trim(), spec.start_date.trim(), spec.end_date.trim())
}
