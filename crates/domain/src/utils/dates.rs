//! Date normalization
//!
//! Upstream payroll exports carry European `DD/MM/YYYY` dates; the ERP
//! only accepts ISO `YYYY-MM-DD`. Everything crossing into an ERP payload
//! goes through [`normalize_date`] first.

use chrono::NaiveDate;

use crate::constants::{ERP_DATE_FORMAT, LEGACY_DATE_FORMAT};
use crate::errors::{ErpError, Result};

/// Normalize a date string to ISO `YYYY-MM-DD`.
///
/// Accepts `DD/MM/YYYY` (zero-padding optional) and ISO input, which is
/// re-rendered canonically. Anything else is rejected, including
/// calendar-impossible dates.
///
/// # Errors
///
/// Returns `ErpError::InvalidInput` when the input matches neither format.
///
/// # Examples
///
/// ```
/// use paybridge_domain::utils::dates::normalize_date;
///
/// assert_eq!(normalize_date("31/01/2025").unwrap(), "2025-01-31");
/// assert_eq!(normalize_date("5/1/2025").unwrap(), "2025-01-05");
/// assert_eq!(normalize_date("2025-01-31").unwrap(), "2025-01-31");
/// assert!(normalize_date("01-31-2025").is_err());
/// ```
pub fn normalize_date(input: &str) -> Result<String> {
    let trimmed = input.trim();

    let parsed = NaiveDate::parse_from_str(trimmed, LEGACY_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, ERP_DATE_FORMAT))
        .map_err(|_| {
            ErpError::InvalidInput(format!(
                "unrecognized date '{trimmed}', expected DD/MM/YYYY or YYYY-MM-DD"
            ))
        })?;

    Ok(parsed.format(ERP_DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_legacy_format() {
        assert_eq!(normalize_date("31/01/2025").unwrap(), "2025-01-31");
        assert_eq!(normalize_date("01/12/1999").unwrap(), "1999-12-01");
    }

    #[test]
    fn test_normalize_unpadded_legacy() {
        assert_eq!(normalize_date("5/1/2025").unwrap(), "2025-01-05");
    }

    #[test]
    fn test_normalize_iso_passthrough() {
        assert_eq!(normalize_date("2025-01-31").unwrap(), "2025-01-31");
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(normalize_date("  31/01/2025  ").unwrap(), "2025-01-31");
    }

    #[test]
    fn test_normalize_rejects_impossible_dates() {
        assert!(normalize_date("31/02/2025").is_err());
        assert!(normalize_date("2025-02-30").is_err());
    }

    #[test]
    fn test_normalize_rejects_unknown_formats() {
        for input in ["01-31-2025", "2025/01/31", "Jan 31 2025", "", "garbage"] {
            let err = normalize_date(input).unwrap_err();
            assert!(matches!(err, ErpError::InvalidInput(_)), "input: {input}");
        }
    }
}
