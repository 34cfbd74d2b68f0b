//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `DAYBOOK_DB_PATH`: SQLite database file path (required)
//! - `DAYBOOK_DB_POOL_SIZE`: Connection pool size (default 4)
//! - `DAYBOOK_ANTHROPIC_API_KEY`: Anthropic API key (required)
//! - `DAYBOOK_CLASSIFIER_MODEL`: Model used for intent classification
//! - `DAYBOOK_RECAP_MODEL`: Model used for daily recaps
//! - `DAYBOOK_HOST`: HTTP bind address (default 127.0.0.1)
//! - `DAYBOOK_PORT`: HTTP bind port (default 3000)
//! - `DAYBOOK_TELNYX_API_KEY`: Telnyx API key (optional, enables SMS replies)
//! - `DAYBOOK_TELNYX_FROM_NUMBER`: Sending phone number (required with the
//!   Telnyx key)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./daybook.json` or `./daybook.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use daybook_domain::config::{
    ClassifierConfig, DatabaseConfig, DaybookConfig, MessagingConfig, ServerConfig,
};
use daybook_domain::constants::{CLASSIFIER_MODEL, RECAP_MODEL};
use daybook_domain::{DaybookError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `DaybookError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<DaybookConfig> {
    // Try loading from environment first
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            // Fall back to file
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `DAYBOOK_DB_PATH` and `DAYBOOK_ANTHROPIC_API_KEY` must be present; every
/// other variable falls back to a default. The Telnyx pair is all-or-nothing:
/// setting only one of key and from-number is a configuration error rather
/// than a silently disabled integration.
///
/// # Errors
/// Returns `DaybookError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<DaybookConfig> {
    let db_path = env_var("DAYBOOK_DB_PATH")?;
    let db_pool_size = match std::env::var("DAYBOOK_DB_POOL_SIZE") {
        Ok(s) => s
            .parse::<u32>()
            .map_err(|e| DaybookError::Config(format!("Invalid pool size: {}", e)))?,
        Err(_) => 4,
    };

    let api_key = env_var("DAYBOOK_ANTHROPIC_API_KEY")?;
    let model = std::env::var("DAYBOOK_CLASSIFIER_MODEL")
        .unwrap_or_else(|_| CLASSIFIER_MODEL.to_string());
    let recap_model =
        std::env::var("DAYBOOK_RECAP_MODEL").unwrap_or_else(|_| RECAP_MODEL.to_string());

    let host = std::env::var("DAYBOOK_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = match std::env::var("DAYBOOK_PORT") {
        Ok(s) => {
            s.parse::<u16>().map_err(|e| DaybookError::Config(format!("Invalid port: {}", e)))?
        }
        Err(_) => 3000,
    };

    let telnyx_key = std::env::var("DAYBOOK_TELNYX_API_KEY").ok();
    let telnyx_from = std::env::var("DAYBOOK_TELNYX_FROM_NUMBER").ok();
    let messaging = match (telnyx_key, telnyx_from) {
        (Some(api_key), Some(from_number)) => Some(MessagingConfig { api_key, from_number }),
        (None, None) => None,
        _ => {
            return Err(DaybookError::Config(
                "DAYBOOK_TELNYX_API_KEY and DAYBOOK_TELNYX_FROM_NUMBER must be set together"
                    .to_string(),
            ))
        }
    };

    Ok(DaybookConfig {
        server: ServerConfig { host, port },
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        classifier: ClassifierConfig { api_key, model, recap_model },
        messaging,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `DaybookError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<DaybookConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DaybookError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DaybookError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DaybookError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `DaybookError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<DaybookConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DaybookError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DaybookError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(DaybookError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./daybook.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    // Try current working directory
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("daybook.json"),
            cwd.join("daybook.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("daybook.json"),
                exe_dir.join("daybook.toml"),
            ]);
        }
    }

    // Return first existing candidate
    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `DaybookError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| DaybookError::Config(format!("Missing required environment variable: {}", key)))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::Builder;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 9] = [
        "DAYBOOK_DB_PATH",
        "DAYBOOK_DB_POOL_SIZE",
        "DAYBOOK_ANTHROPIC_API_KEY",
        "DAYBOOK_CLASSIFIER_MODEL",
        "DAYBOOK_RECAP_MODEL",
        "DAYBOOK_HOST",
        "DAYBOOK_PORT",
        "DAYBOOK_TELNYX_API_KEY",
        "DAYBOOK_TELNYX_FROM_NUMBER",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("DAYBOOK_DB_PATH", "/tmp/daybook-test.db");
        std::env::set_var("DAYBOOK_DB_POOL_SIZE", "2");
        std::env::set_var("DAYBOOK_ANTHROPIC_API_KEY", "sk-ant-test");
        std::env::set_var("DAYBOOK_CLASSIFIER_MODEL", "claude-3-haiku-20240307");
        std::env::set_var("DAYBOOK_RECAP_MODEL", "claude-sonnet-4-20250514");
        std::env::set_var("DAYBOOK_HOST", "0.0.0.0");
        std::env::set_var("DAYBOOK_PORT", "8080");
        std::env::set_var("DAYBOOK_TELNYX_API_KEY", "KEY-telnyx");
        std::env::set_var("DAYBOOK_TELNYX_FROM_NUMBER", "+15550001111");

        let config = load_from_env().expect("config loads from env");
        assert_eq!(config.database.path, "/tmp/daybook-test.db");
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.classifier.api_key, "sk-ant-test");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        let messaging = config.messaging.expect("messaging configured");
        assert_eq!(messaging.from_number, "+15550001111");

        clear_env();
    }

    #[test]
    fn test_load_from_env_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("DAYBOOK_DB_PATH", "/tmp/daybook-test.db");
        std::env::set_var("DAYBOOK_ANTHROPIC_API_KEY", "sk-ant-test");

        let config = load_from_env().expect("config loads with defaults");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.classifier.model, CLASSIFIER_MODEL);
        assert_eq!(config.classifier.recap_model, RECAP_MODEL);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(config.messaging.is_none());

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_required() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("DAYBOOK_ANTHROPIC_API_KEY", "sk-ant-test");

        let err = load_from_env().expect_err("missing db path should fail");
        assert!(err.to_string().contains("DAYBOOK_DB_PATH"));

        clear_env();
    }

    #[test]
    fn test_load_from_env_rejects_partial_telnyx_pair() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("DAYBOOK_DB_PATH", "/tmp/daybook-test.db");
        std::env::set_var("DAYBOOK_ANTHROPIC_API_KEY", "sk-ant-test");
        std::env::set_var("DAYBOOK_TELNYX_API_KEY", "KEY-telnyx");

        let err = load_from_env().expect_err("half-configured messaging should fail");
        assert!(err.to_string().contains("must be set together"));

        clear_env();
    }

    #[test]
    fn test_load_from_toml_file() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        let mut file = Builder::new().suffix(".toml").tempfile().expect("temp file");
        writeln!(
            file,
            r#"
[server]
host = "0.0.0.0"
port = 8080

[database]
path = "/tmp/daybook.db"

[classifier]
api_key = "sk-ant-file"

[messaging]
api_key = "KEY-telnyx"
from_number = "+15550002222"
"#
        )
        .expect("write config");

        let config = load_from_file(Some(file.path().to_path_buf())).expect("config loads");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "/tmp/daybook.db");
        // pool_size and models come from serde defaults
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.classifier.model, CLASSIFIER_MODEL);
        assert!(config.messaging.is_some());
    }

    #[test]
    fn test_load_from_json_file() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        let mut file = Builder::new().suffix(".json").tempfile().expect("temp file");
        write!(
            file,
            r#"{{
  "database": {{ "path": "/tmp/daybook.db", "pool_size": 8 }},
  "classifier": {{ "api_key": "sk-ant-json" }}
}}"#
        )
        .expect("write config");

        let config = load_from_file(Some(file.path().to_path_buf())).expect("config loads");
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.classifier.api_key, "sk-ant-json");
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.messaging.is_none());
    }

    #[test]
    fn test_load_from_file_missing_path() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        let err = load_from_file(Some(PathBuf::from("/nonexistent/daybook.toml")))
            .expect_err("missing file should fail");
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_extension() {
        let err = parse_config("database:", Path::new("config.yaml"))
            .expect_err("unsupported format should fail");
        assert!(err.to_string().contains("Unsupported config format"));
    }
}
