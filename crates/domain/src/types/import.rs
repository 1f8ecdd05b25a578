//! Batch import input
//!
//! One batch provisions a single company and everything hanging off it.
//! Record order inside each section is preserved; cross-section ordering
//! is fixed by the orchestrator (company, employees, components,
//! structure, assignments, slips).

use serde::{Deserialize, Serialize};

use super::payroll::{
    AssignmentSpec, CompanySpec, EmployeeSpec, SalaryComponentSpec, SalarySlipSpec,
    SalaryStructureSpec,
};

/// Full payroll batch for one company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportBatch {
    pub company: CompanySpec,
    #[serde(default)]
    pub employees: Vec<EmployeeSpec>,
    #[serde(default)]
    pub components: Vec<SalaryComponentSpec>,
    #[serde(default)]
    pub structure: Option<SalaryStructureSpec>,
    #[serde(default)]
    pub assignments: Vec<AssignmentSpec>,
    #[serde(default)]
    pub slips: Vec<SalarySlipSpec>,
}

impl ImportBatch {
    /// New batch containing only the company record.
    #[must_use]
    pub fn for_company(company: CompanySpec) -> Self {
        Self {
            company,
            employees: Vec::new(),
            components: Vec::new(),
            structure: None,
            assignments: Vec::new(),
            slips: Vec::new(),
        }
    }

    /// Total record count across all sections, company included.
    #[must_use]
    pub fn record_count(&self) -> usize {
        1 + self.employees.len()
            + self.components.len()
            + usize::from(self.structure.is_some())
            + self.assignments.len()
            + self.slips.len()
    }
}
