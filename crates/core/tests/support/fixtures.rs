//! Batch and spec builders shared across the integration tests.

use paybridge_domain::{
    AssignmentSpec, CompanySpec, ComponentKind, EmployeeSpec, ImportBatch, SalaryComponentSpec,
    SalarySlipSpec, SalaryStructureSpec, SlipLine, StructureLine,
};

pub fn company(name: &str) -> CompanySpec {
    CompanySpec { name: name.to_string(), abbreviation: None, currency: None, country: None }
}

pub fn employee(number: &str, first_name: &str) -> EmployeeSpec {
    EmployeeSpec {
        employee_number: number.to_string(),
        first_name: first_name.to_string(),
        last_name: None,
        gender: None,
        date_of_birth: "1990-04-12".to_string(),
        date_of_joining: "2020-01-01".to_string(),
    }
}

pub fn earning_component(name: &str, formula: Option<&str>) -> SalaryComponentSpec {
    SalaryComponentSpec {
        name: name.to_string(),
        abbreviation: None,
        kind: ComponentKind::Earning,
        formula: formula.map(str::to_string),
    }
}

pub fn deduction_component(name: &str, formula: Option<&str>) -> SalaryComponentSpec {
    SalaryComponentSpec {
        name: name.to_string(),
        abbreviation: None,
        kind: ComponentKind::Deduction,
        formula: formula.map(str::to_string),
    }
}

pub fn structure_line(component: &str, formula: Option<&str>) -> StructureLine {
    StructureLine {
        component: component.to_string(),
        formula: formula.map(str::to_string),
        amount: None,
    }
}

pub fn slip_line(component: &str, amount: f64) -> SlipLine {
    SlipLine { component: component.to_string(), amount }
}

/// A representative one-employee batch: company, employee, two components,
/// a structure using them, one assignment and one January slip.
pub fn standard_batch(company_name: &str) -> ImportBatch {
    ImportBatch {
        company: company(company_name),
        employees: vec![employee("42", "Ada")],
        components: vec![
            earning_component("Base Salary", Some("base")),
            deduction_component("Income Tax", Some("base * 0.2")),
        ],
        structure: Some(SalaryStructureSpec {
            name: "Standard 2025".to_string(),
            earnings: vec![structure_line("Base Salary", Some("base"))],
            deductions: vec![structure_line("Income Tax", Some("base * 0.2"))],
        }),
        assignments: vec![AssignmentSpec {
            employee: "42".to_string(),
            structure: "Standard 2025".to_string(),
            from_date: "2025-01-01".to_string(),
            base: 3000.0,
        }],
        slips: vec![SalarySlipSpec {
            employee: "42".to_string(),
            structure: Some("Standard 2025".to_string()),
            start_date: "2025-01-01".to_string(),
            end_date: "2025-01-31".to_string(),
            earnings: vec![slip_line("Base Salary", 3000.0)],
            deductions: vec![slip_line("Income Tax", 600.0)],
        }],
    }
}
