//! Salary slip totals reconciliation
//!
//! Line items are authoritative; aggregates are derived. Before any save
//! or submit, a slip's stated `gross_pay`, `total_deduction` and
//! `net_pay` are recomputed from the earnings and deductions tables and
//! overwritten wherever they disagree beyond the tolerance. This is the
//! single guard keeping internally inconsistent documents away from the
//! ERP's own validation.

use paybridge_domain::constants::AMOUNT_TOLERANCE;
use paybridge_domain::{coerce_f64, DocStatus, Document, ErpError, Result};
use serde_json::Value;
use tracing::{debug, warn};

const EARNINGS_TABLE: &str = "earnings";
const DEDUCTIONS_TABLE: &str = "deductions";
const REQUIRED_FIELDS: &[&str] = &["employee", "start_date", "end_date"];

/// Recompute and repair a salary slip's aggregate fields in place.
///
/// Also coerces numeric-looking string amounts to numbers (spreadsheet
/// exports stringify them) and verifies the identity and period fields
/// the ERP mandates are present.
///
/// # Errors
///
/// Returns `ErpError::Validation` when a required field is missing. A
/// document without a name is accepted only while it is an unsaved draft.
pub fn reconcile_slip(slip: &mut Document) -> Result<()> {
    check_required_fields(slip)?;
    coerce_row_amounts(slip, EARNINGS_TABLE);
    coerce_row_amounts(slip, DEDUCTIONS_TABLE);

    let gross = sum_amounts(slip.rows(EARNINGS_TABLE));
    let total_deduction = sum_amounts(slip.rows(DEDUCTIONS_TABLE));
    let net = gross - total_deduction;

    reconcile_aggregate(slip, "gross_pay", gross);
    reconcile_aggregate(slip, "total_deduction", total_deduction);
    reconcile_aggregate(slip, "net_pay", net);

    Ok(())
}

fn check_required_fields(slip: &Document) -> Result<()> {
    if slip.name.is_none() && slip.docstatus != DocStatus::Draft {
        return Err(ErpError::Validation(
            "salary slip has no name but is past draft".to_string(),
        ));
    }
    for field in REQUIRED_FIELDS {
        let present = slip.str_field(field).is_some_and(|v| !v.trim().is_empty());
        if !present {
            return Err(ErpError::Validation(format!(
                "salary slip is missing required field '{field}'"
            )));
        }
    }
    Ok(())
}

/// Sum the `amount` column of a child table, coercing stringified numbers.
fn sum_amounts(rows: &[Value]) -> f64 {
    rows.iter()
        .filter_map(|row| row.get("amount"))
        .filter_map(coerce_f64)
        .sum()
}

/// Rewrite stringified `amount` cells as JSON numbers.
fn coerce_row_amounts(slip: &mut Document, table: &str) {
    let Some(Value::Array(rows)) = slip.fields.get_mut(table) else {
        return;
    };
    for row in rows {
        let Some(amount) = row.get("amount") else { continue };
        if amount.is_string() {
            if let Some(parsed) = coerce_f64(amount) {
                row["amount"] = Value::from(parsed);
            }
        }
    }
}

/// Overwrite a stated aggregate when it drifts beyond the tolerance.
///
/// Within tolerance, the stated value is kept but normalized to a JSON
/// number. The computed value never loses to the stated one.
fn reconcile_aggregate(slip: &mut Document, field: &str, computed: f64) {
    match slip.f64_field(field) {
        Some(stated) if (stated - computed).abs() <= AMOUNT_TOLERANCE => {
            slip.set_field(field, stated);
        }
        Some(stated) => {
            warn!(
                slip = slip.name.as_deref().unwrap_or("<unsaved>"),
                field, stated, computed, "aggregate disagrees with line items, overwriting"
            );
            slip.set_field(field, computed);
        }
        None => {
            debug!(field, computed, "aggregate missing, deriving from line items");
            slip.set_field(field, computed);
        }
    }
}
