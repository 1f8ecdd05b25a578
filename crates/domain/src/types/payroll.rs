//! Payroll record specifications
//!
//! Input records for the import pipeline, typically deserialized from an
//! upstream payroll export. Specs carry natural keys (company name,
//! employee number, component name); ERP-assigned document names are
//! resolved during the import run.
//!
//! Date fields accept both ISO (`YYYY-MM-DD`) and legacy European
//! (`DD/MM/YYYY`) spellings; they are normalized before any ERP call.

use serde::{Deserialize, Serialize};

/// Company to provision (or reuse) as the payroll root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanySpec {
    pub name: String,
    /// Derived from the name when absent.
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Employee identified by payroll number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeSpec {
    pub employee_number: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    pub date_of_birth: String,
    pub date_of_joining: String,
}

/// Whether a salary component adds to or subtracts from gross pay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Earning,
    Deduction,
}

impl ComponentKind {
    /// Component type value as the ERP spells it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earning => "Earning",
            Self::Deduction => "Deduction",
        }
    }
}

/// Salary component definition.
///
/// A component is either formula-derived (`formula` present) or valued
/// directly from the assignment base, never both. The flag pair sent to
/// the ERP is derived from `formula` presence alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalaryComponentSpec {
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
    pub kind: ComponentKind,
    #[serde(default)]
    pub formula: Option<String>,
}

/// One component row inside a salary structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureLine {
    /// Salary component name (natural key).
    pub component: String,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Salary structure: ordered earning and deduction rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalaryStructureSpec {
    pub name: String,
    #[serde(default)]
    pub earnings: Vec<StructureLine>,
    #[serde(default)]
    pub deductions: Vec<StructureLine>,
}

/// Links an employee to a structure with a base amount from a date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentSpec {
    /// Employee payroll number (natural key, not the ERP name).
    pub employee: String,
    /// Salary structure name.
    pub structure: String,
    pub from_date: String,
    pub base: f64,
}

/// One earning or deduction line on a salary slip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlipLine {
    pub component: String,
    pub amount: f64,
}

/// Salary slip for one employee and pay period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalarySlipSpec {
    /// Employee payroll number (natural key, not the ERP name).
    pub employee: String,
    #[serde(default)]
    pub structure: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub earnings: Vec<SlipLine>,
    #[serde(default)]
    pub deductions: Vec<SlipLine>,
}
