//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Money comparison
pub const AMOUNT_TOLERANCE: f64 = 0.01;

// Lifecycle transition retries (submit/cancel)
pub const LIFECYCLE_MAX_ATTEMPTS: usize = 3;
pub const LIFECYCLE_BACKOFF_UNIT_SECS: u64 = 1;

// Duplicate-insert recovery (re-fetch loop, no sleep between attempts)
pub const DUPLICATE_REFETCH_ATTEMPTS: usize = 3;

// ERP pauses
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// Date formats
pub const ERP_DATE_FORMAT: &str = "%Y-%m-%d";
pub const LEGACY_DATE_FORMAT: &str = "%d/%m/%Y";

// Provisioning defaults applied when a record spec leaves them blank
pub const DEFAULT_CURRENCY: &str = "EUR";
pub const DEFAULT_COUNTRY: &str = "Germany";

// Abbreviation derivation
pub const ABBR_MIN_LENGTH: usize = 3;
pub const ABBR_MAX_LENGTH: usize = 5;
pub const ABBR_PAD_CHAR: char = 'X';
