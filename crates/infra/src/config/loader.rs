//! Configuration loading
//!
//! Environment variables win; a config file is the fallback. The file is
//! probed in the working directory, its parents, and next to the binary,
//! as `paybridge.toml`, `paybridge.json`, `config.toml` or `config.json`.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use paybridge_domain::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use paybridge_domain::{Config, ErpConfig, ErpError, ImportConfig, Result, SlipSavePolicy};
use tracing::{debug, info};

const ENV_BASE_URL: &str = "PAYBRIDGE_ERP_BASE_URL";
const ENV_API_KEY: &str = "PAYBRIDGE_ERP_API_KEY";
const ENV_API_SECRET: &str = "PAYBRIDGE_ERP_API_SECRET";
const ENV_TIMEOUT_SECS: &str = "PAYBRIDGE_ERP_TIMEOUT_SECS";
const ENV_SETTLE_DELAY_MS: &str = "PAYBRIDGE_SETTLE_DELAY_MS";
const ENV_DEFAULT_CURRENCY: &str = "PAYBRIDGE_DEFAULT_CURRENCY";
const ENV_DEFAULT_COUNTRY: &str = "PAYBRIDGE_DEFAULT_COUNTRY";
const ENV_SLIP_SAVE_POLICY: &str = "PAYBRIDGE_SLIP_SAVE_POLICY";

const FILE_CANDIDATES: &[&str] =
    &["paybridge.toml", "paybridge.json", "config.toml", "config.json"];

/// Load configuration, environment first, probed file second.
///
/// # Errors
///
/// Returns [`ErpError::Config`] when neither source yields a complete
/// configuration.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            info!("configuration loaded from environment");
            return Ok(config);
        }
        Err(err) => debug!(%err, "environment configuration incomplete, probing files"),
    }
    load_from_file(None)
}

/// Load configuration from `PAYBRIDGE_*` environment variables.
///
/// `PAYBRIDGE_ERP_BASE_URL`, `PAYBRIDGE_ERP_API_KEY` and
/// `PAYBRIDGE_ERP_API_SECRET` are required; the remaining variables
/// override [`ImportConfig`] defaults.
///
/// # Errors
///
/// Returns [`ErpError::Config`] on a missing required variable or an
/// unparseable value.
pub fn load_from_env() -> Result<Config> {
    let erp = ErpConfig {
        base_url: required_var(ENV_BASE_URL)?,
        api_key: required_var(ENV_API_KEY)?,
        api_secret: required_var(ENV_API_SECRET)?,
        timeout_secs: parsed_var::<u64>(ENV_TIMEOUT_SECS)?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
    };

    let mut import = ImportConfig::default();
    if let Some(delay) = parsed_var::<u64>(ENV_SETTLE_DELAY_MS)? {
        import.settle_delay_ms = delay;
    }
    if let Some(currency) = env_var(ENV_DEFAULT_CURRENCY) {
        import.default_currency = currency;
    }
    if let Some(country) = env_var(ENV_DEFAULT_COUNTRY) {
        import.default_country = country;
    }
    if let Some(policy) = env_var(ENV_SLIP_SAVE_POLICY) {
        import.slip_save_policy = parse_slip_save_policy(&policy)?;
    }

    Ok(Config { erp, import })
}

/// Load configuration from a file, probing standard locations when no
/// explicit path is given.
///
/// # Errors
///
/// Returns [`ErpError::Config`] when no file is found, the file cannot be
/// read, or its contents do not parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None => probe_config_paths().ok_or_else(|| {
            ErpError::Config(format!(
                "no configuration found: set {ENV_BASE_URL}, {ENV_API_KEY} and \
                 {ENV_API_SECRET}, or provide paybridge.toml"
            ))
        })?,
    };

    let raw = fs::read_to_string(&path)
        .map_err(|err| ErpError::Config(format!("cannot read {}: {err}", path.display())))?;
    let config = parse_config(&path, &raw)?;
    info!(path = %path.display(), "configuration loaded from file");
    Ok(config)
}

/// First existing candidate config file, or `None`.
#[must_use]
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir: Option<&Path> = Some(cwd.as_path());
        while let Some(current) = dir {
            dirs.push(current.to_path_buf());
            dir = current.parent();
        }
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            dirs.push(dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| FILE_CANDIDATES.iter().map(move |candidate| dir.join(candidate)))
        .find(|path| path.is_file())
}

fn parse_config(path: &Path, raw: &str) -> Result<Config> {
    match path.extension().and_then(OsStr::to_str) {
        Some("toml") => toml::from_str(raw)
            .map_err(|err| ErpError::Config(format!("invalid TOML in {}: {err}", path.display()))),
        Some("json") => serde_json::from_str(raw)
            .map_err(|err| ErpError::Config(format!("invalid JSON in {}: {err}", path.display()))),
        _ => Err(ErpError::Config(format!(
            "unsupported config format: {} (expected .toml or .json)",
            path.display()
        ))),
    }
}

fn parse_slip_save_policy(raw: &str) -> Result<SlipSavePolicy> {
    match raw.trim().to_lowercase().as_str() {
        "always_draft_on_save" => Ok(SlipSavePolicy::AlwaysDraftOnSave),
        "respect_lifecycle" => Ok(SlipSavePolicy::RespectLifecycle),
        other => Err(ErpError::Config(format!(
            "unknown slip save policy '{other}' in {ENV_SLIP_SAVE_POLICY}"
        ))),
    }
}

/// Trimmed, non-empty environment value.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|value| value.trim().to_string()).filter(|v| !v.is_empty())
}

fn required_var(name: &str) -> Result<String> {
    env_var(name).ok_or_else(|| ErpError::Config(format!("missing environment variable {name}")))
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    env_var(name)
        .map(|value| {
            value.parse::<T>().map_err(|err| {
                ErpError::Config(format!("invalid value for {name} ({value}): {err}"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::Builder;

    use super::*;

    // Environment variables are process-global; tests touching them must
    // not interleave.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(Mutex::default);

    const ALL_VARS: &[&str] = &[
        ENV_BASE_URL,
        ENV_API_KEY,
        ENV_API_SECRET,
        ENV_TIMEOUT_SECS,
        ENV_SETTLE_DELAY_MS,
        ENV_DEFAULT_CURRENCY,
        ENV_DEFAULT_COUNTRY,
        ENV_SLIP_SAVE_POLICY,
    ];

    fn clear_env() {
        for name in ALL_VARS {
            std::env::remove_var(name);
        }
    }

    fn set_required() {
        std::env::set_var(ENV_BASE_URL, "https://erp.example.com");
        std::env::set_var(ENV_API_KEY, "key");
        std::env::set_var(ENV_API_SECRET, "secret");
    }

    #[test]
    fn test_load_from_env_minimal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required();

        let config = load_from_env().unwrap();
        assert_eq!(config.erp.base_url, "https://erp.example.com");
        assert_eq!(config.erp.timeout_secs, 30);
        assert_eq!(config.import, ImportConfig::default());
    }

    #[test]
    fn test_load_from_env_missing_secret() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(ENV_BASE_URL, "https://erp.example.com");
        std::env::set_var(ENV_API_KEY, "key");

        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_API_SECRET));
    }

    #[test]
    fn test_load_from_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required();
        std::env::set_var(ENV_TIMEOUT_SECS, "90");
        std::env::set_var(ENV_SETTLE_DELAY_MS, "0");
        std::env::set_var(ENV_DEFAULT_CURRENCY, "CHF");
        std::env::set_var(ENV_DEFAULT_COUNTRY, "Switzerland");
        std::env::set_var(ENV_SLIP_SAVE_POLICY, "respect_lifecycle");

        let config = load_from_env().unwrap();
        assert_eq!(config.erp.timeout_secs, 90);
        assert_eq!(config.import.settle_delay_ms, 0);
        assert_eq!(config.import.default_currency, "CHF");
        assert_eq!(config.import.default_country, "Switzerland");
        assert_eq!(config.import.slip_save_policy, SlipSavePolicy::RespectLifecycle);
    }

    #[test]
    fn test_load_from_env_rejects_bad_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required();

        std::env::set_var(ENV_TIMEOUT_SECS, "soon");
        assert!(matches!(load_from_env(), Err(ErpError::Config(_))));
        std::env::remove_var(ENV_TIMEOUT_SECS);

        std::env::set_var(ENV_SLIP_SAVE_POLICY, "yolo");
        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains("yolo"));
    }

    #[test]
    fn test_blank_env_values_read_as_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required();
        std::env::set_var(ENV_API_SECRET, "   ");

        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_API_SECRET));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[erp]
base_url = "https://erp.example.com"
api_key = "key"
api_secret = "secret"
timeout_secs = 10

[import]
settle_delay_ms = 250
slip_save_policy = "respect_lifecycle"
"#
        )
        .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.erp.timeout_secs, 10);
        assert_eq!(config.import.settle_delay_ms, 250);
        assert_eq!(config.import.slip_save_policy, SlipSavePolicy::RespectLifecycle);
    }

    #[test]
    fn test_load_from_json_file_with_defaults() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"erp": {{"base_url": "https://erp.example.com", "api_key": "k", "api_secret": "s"}}}}"#
        )
        .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.erp.timeout_secs, 30);
        assert_eq!(config.import, ImportConfig::default());
    }

    #[test]
    fn test_load_from_file_rejects_unknown_extension() {
        let file = Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_load_from_file_missing_path() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/paybridge.toml"))).unwrap_err();
        assert!(matches!(err, ErpError::Config(_)));
    }

    #[test]
    fn test_load_prefers_environment() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_required();
        std::env::set_var(ENV_DEFAULT_CURRENCY, "USD");

        let config = load().unwrap();
        assert_eq!(config.import.default_currency, "USD");
    }
}
