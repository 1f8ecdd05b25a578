//! Configuration structures
//!
//! Plain data definitions only; loading (environment probing, file
//! fallback) lives in the infra crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_COUNTRY, DEFAULT_CURRENCY, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_SETTLE_DELAY_MS,
};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub erp: ErpConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

/// Connection settings for the ERP REST API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErpConfig {
    /// Site root, e.g. `https://erp.example.com`. The API prefix is
    /// appended per call.
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ErpConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How saves treat documents that are already submitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SlipSavePolicy {
    /// Force `docstatus` back to draft on every save so updates always
    /// go through, sidestepping cancel-before-edit.
    #[default]
    AlwaysDraftOnSave,
    /// Leave `docstatus` untouched; saving a submitted slip fails.
    RespectLifecycle,
}

/// Knobs for the batch import pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportConfig {
    /// Currency applied when a company spec leaves it blank.
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Country applied when a company spec leaves it blank.
    #[serde(default = "default_country")]
    pub default_country: String,
    /// Pause after creating a company, giving the ERP time to finish
    /// fixture setup (accounts, defaults) before dependents reference it.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default)]
    pub slip_save_policy: SlipSavePolicy,
}

impl ImportConfig {
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_currency: DEFAULT_CURRENCY.to_string(),
            default_country: DEFAULT_COUNTRY.to_string(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            slip_save_policy: SlipSavePolicy::default(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

const fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_config_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.default_currency, "EUR");
        assert_eq!(config.default_country, "Germany");
        assert_eq!(config.settle_delay_ms, 500);
        assert_eq!(config.slip_save_policy, SlipSavePolicy::AlwaysDraftOnSave);
    }

    #[test]
    fn test_config_deserializes_without_import_section() {
        let config: Config = serde_json::from_str(
            r#"{"erp": {"base_url": "https://erp.example.com", "api_key": "key", "api_secret": "secret"}}"#,
        )
        .unwrap();
        assert_eq!(config.erp.timeout_secs, 30);
        assert_eq!(config.import.slip_save_policy, SlipSavePolicy::AlwaysDraftOnSave);
    }

    #[test]
    fn test_slip_save_policy_snake_case() {
        let config: ImportConfig =
            serde_json::from_str(r#"{"slip_save_policy": "respect_lifecycle"}"#).unwrap();
        assert_eq!(config.slip_save_policy, SlipSavePolicy::RespectLifecycle);
    }
}
