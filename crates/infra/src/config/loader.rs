//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file into the process environment, if one exists
//! 2. Attempts to load from environment variables
//! 3. If incomplete, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `BATCHLINE_ENDPOINT_URL`: Base URL of the remote store (required)
//! - `BATCHLINE_API_KEY`: Bearer token
//! - `BATCHLINE_TIMEOUT_MS`: Per-request read deadline
//! - `BATCHLINE_CONSISTENCY_LEVEL`: `one`, `quorum` or `all`
//! - `BATCHLINE_BATCH_SIZE`: Items per batch
//! - `BATCHLINE_POOL_SIZE`: Concurrent submission workers
//! - `BATCHLINE_RETRY_BASE_INTERVAL_MS`: Backoff base interval (required)
//! - `BATCHLINE_RETRY_MAX_CONNECTION`: Connection retry budget (required)
//! - `BATCHLINE_RETRY_MAX_TIMEOUT`: Timeout retry budget (required)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./batchline.toml` or `./batchline.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names in the parent directory
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use batchline_domain::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_POOL_SIZE, DEFAULT_REQUEST_TIMEOUT_MS,
};
use batchline_domain::{
    BatchingConfig, BatchlineConfig, BatchlineError, ConsistencyLevel, EndpointConfig, Result,
    RetryPolicy,
};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["batchline.toml", "batchline.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `BatchlineError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or fail validation
pub fn load() -> Result<BatchlineConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Could not load .env file"),
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// See module documentation for the complete list. Optional variables fall
/// back to the crate defaults.
///
/// # Errors
/// Returns `BatchlineError::Config` if required variables are missing
/// or any value is invalid.
pub fn load_from_env() -> Result<BatchlineConfig> {
    let base_url = env_var("BATCHLINE_ENDPOINT_URL")?;
    let api_key = std::env::var("BATCHLINE_API_KEY").ok().filter(|key| !key.is_empty());
    let timeout_ms = env_parsed_or("BATCHLINE_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
    let consistency_level = std::env::var("BATCHLINE_CONSISTENCY_LEVEL")
        .ok()
        .map(|s| ConsistencyLevel::from_str(&s))
        .transpose()
        .map_err(BatchlineError::Config)?;

    let batch_size = env_parsed_or("BATCHLINE_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
    let pool_size = env_parsed_or("BATCHLINE_POOL_SIZE", DEFAULT_POOL_SIZE)?;

    let base_interval_ms: u64 = env_parsed("BATCHLINE_RETRY_BASE_INTERVAL_MS")?;
    let max_connection_retries: u32 = env_parsed("BATCHLINE_RETRY_MAX_CONNECTION")?;
    let max_timeout_retries: u32 = env_parsed("BATCHLINE_RETRY_MAX_TIMEOUT")?;

    let config = BatchlineConfig {
        endpoint: EndpointConfig { base_url, api_key, timeout_ms, consistency_level },
        batching: BatchingConfig { batch_size, pool_size },
        retry: RetryPolicy::new(
            Duration::from_millis(base_interval_ms),
            max_connection_retries,
            max_timeout_retries,
        ),
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `BatchlineError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or required fields are missing
/// - The loaded configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<BatchlineConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BatchlineError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BatchlineError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BatchlineError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<BatchlineConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BatchlineError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BatchlineError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(BatchlineError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory and its parent, then the
/// executable's directory, for the names listed in the module docs.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    probe_in(&roots)
}

fn probe_in(roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        BatchlineError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse a required environment variable.
fn env_parsed<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)?
        .trim()
        .parse()
        .map_err(|e| BatchlineError::Config(format!("Invalid value for {key}: {e}")))
}

/// Parse an optional environment variable, using `default` when unset.
fn env_parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(_) => env_parsed(key),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::{Builder, TempDir};

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 9] = [
        "BATCHLINE_ENDPOINT_URL",
        "BATCHLINE_API_KEY",
        "BATCHLINE_TIMEOUT_MS",
        "BATCHLINE_CONSISTENCY_LEVEL",
        "BATCHLINE_BATCH_SIZE",
        "BATCHLINE_POOL_SIZE",
        "BATCHLINE_RETRY_BASE_INTERVAL_MS",
        "BATCHLINE_RETRY_MAX_CONNECTION",
        "BATCHLINE_RETRY_MAX_TIMEOUT",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn set_required_env() {
        std::env::set_var("BATCHLINE_ENDPOINT_URL", "http://localhost:8080");
        std::env::set_var("BATCHLINE_RETRY_BASE_INTERVAL_MS", "400");
        std::env::set_var("BATCHLINE_RETRY_MAX_CONNECTION", "2");
        std::env::set_var("BATCHLINE_RETRY_MAX_TIMEOUT", "3");
    }

    fn write_config(extension: &str, contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let mut file = Builder::new().suffix(extension).tempfile_in(dir.path()).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let (_, path) = file.keep().unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_from_env_required_only() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required_env();

        let config = load_from_env().expect("config from env");
        assert_eq!(config.endpoint.base_url, "http://localhost:8080");
        assert_eq!(config.endpoint.api_key, None);
        assert_eq!(config.endpoint.timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert_eq!(config.batching, BatchingConfig::default());
        assert_eq!(config.retry, RetryPolicy::new(Duration::from_millis(400), 2, 3));

        clear_env();
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required_env();
        std::env::set_var("BATCHLINE_API_KEY", "secret");
        std::env::set_var("BATCHLINE_TIMEOUT_MS", "1500");
        std::env::set_var("BATCHLINE_CONSISTENCY_LEVEL", "QUORUM");
        std::env::set_var("BATCHLINE_BATCH_SIZE", "64");
        std::env::set_var("BATCHLINE_POOL_SIZE", "4");

        let config = load_from_env().expect("config from env");
        assert_eq!(config.endpoint.api_key.as_deref(), Some("secret"));
        assert_eq!(config.endpoint.timeout_ms, 1500);
        assert_eq!(config.endpoint.consistency_level, Some(ConsistencyLevel::Quorum));
        assert_eq!(config.batching, BatchingConfig { batch_size: 64, pool_size: 4 });

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_retry_policy() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("BATCHLINE_ENDPOINT_URL", "http://localhost:8080");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, BatchlineError::Config(msg) if msg.contains("RETRY")));

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_values() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required_env();

        std::env::set_var("BATCHLINE_POOL_SIZE", "not-a-number");
        assert!(matches!(load_from_env(), Err(BatchlineError::Config(_))));

        std::env::set_var("BATCHLINE_POOL_SIZE", "0");
        assert!(matches!(load_from_env(), Err(BatchlineError::Config(_))));

        std::env::set_var("BATCHLINE_POOL_SIZE", "2");
        std::env::set_var("BATCHLINE_CONSISTENCY_LEVEL", "most");
        assert!(matches!(load_from_env(), Err(BatchlineError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_from_file_toml() {
        let (_dir, path) = write_config(
            ".toml",
            r#"
[endpoint]
base_url = "http://db.internal:8080"
timeout_ms = 2000
consistency_level = "all"

[batching]
batch_size = 20
pool_size = 3

[retry]
base_interval_ms = 250
max_connection_retries = 1
max_timeout_retries = 4
"#,
        );

        let config = load_from_file(Some(path)).expect("config from TOML");
        assert_eq!(config.endpoint.base_url, "http://db.internal:8080");
        assert_eq!(config.endpoint.consistency_level, Some(ConsistencyLevel::All));
        assert_eq!(config.batching.pool_size, 3);
        assert_eq!(config.retry.base_interval, Duration::from_millis(250));
        assert_eq!(config.retry.max_timeout_retries, 4);
    }

    #[test]
    fn test_load_from_file_json_uses_batching_defaults() {
        let (_dir, path) = write_config(
            ".json",
            r#"{
                "endpoint": { "base_url": "http://localhost:8080" },
                "retry": {
                    "base_interval_ms": 400,
                    "max_connection_retries": 3,
                    "max_timeout_retries": 3
                }
            }"#,
        );

        let config = load_from_file(Some(path)).expect("config from JSON");
        assert_eq!(config.batching, BatchingConfig::default());
        assert_eq!(config.endpoint.timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn test_load_from_file_requires_retry_section() {
        let (_dir, path) =
            write_config(".toml", "[endpoint]\nbase_url = \"http://localhost:8080\"\n");

        let err = load_from_file(Some(path)).unwrap_err();
        assert!(matches!(err, BatchlineError::Config(msg) if msg.contains("retry")));
    }

    #[test]
    fn test_load_from_file_rejects_invalid_batching() {
        let (_dir, path) = write_config(
            ".toml",
            r#"
[endpoint]
base_url = "http://localhost:8080"

[batching]
batch_size = 0
pool_size = 1

[retry]
base_interval_ms = 400
max_connection_retries = 3
max_timeout_retries = 3
"#,
        );

        assert!(matches!(load_from_file(Some(path)), Err(BatchlineError::Config(_))));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/batchline.toml")));
        assert!(matches!(result, Err(BatchlineError::Config(_))));
    }

    #[test]
    fn test_probe_prefers_batchline_over_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        std::fs::write(dir.path().join("batchline.toml"), "").unwrap();

        let found = probe_in(&[dir.path().to_path_buf()]);
        assert_eq!(found, Some(dir.path().join("batchline.toml")));

        let empty = TempDir::new().unwrap();
        assert_eq!(probe_in(&[empty.path().to_path_buf()]), None);
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
