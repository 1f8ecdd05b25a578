//! Company abbreviation derivation
//!
//! The ERP requires a short unique abbreviation per company; payroll
//! exports rarely provide one.

use crate::constants::{ABBR_MAX_LENGTH, ABBR_MIN_LENGTH, ABBR_PAD_CHAR};

/// Derive an uppercase abbreviation from a company name.
///
/// Multi-word names abbreviate to their initials (capped at
/// [`ABBR_MAX_LENGTH`]); single words keep their leading characters. The
/// result is padded with `X` up to [`ABBR_MIN_LENGTH`] so the ERP never
/// sees an abbreviation shorter than it allows.
///
/// # Examples
///
/// ```
/// use paybridge_domain::utils::naming::derive_abbreviation;
///
/// assert_eq!(derive_abbreviation("Acme Corporation Ltd"), "ACL");
/// assert_eq!(derive_abbreviation("Acme"), "ACM");
/// assert_eq!(derive_abbreviation("Ab"), "ABX");
/// ```
#[must_use]
pub fn derive_abbreviation(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();

    let mut abbr: String = if words.len() >= 2 {
        words
            .iter()
            .filter_map(|word| word.chars().find(char::is_ascii_alphanumeric))
            .flat_map(char::to_uppercase)
            .take(ABBR_MAX_LENGTH)
            .collect()
    } else {
        name.chars()
            .filter(char::is_ascii_alphanumeric)
            .take(ABBR_MIN_LENGTH)
            .flat_map(char::to_uppercase)
            .collect()
    };

    while abbr.chars().count() < ABBR_MIN_LENGTH {
        abbr.push(ABBR_PAD_CHAR);
    }
    abbr
}
