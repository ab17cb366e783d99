//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the environment names no host, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. When neither source exists, returns the built-in defaults
//!
//! ## Environment Variables
//! - `CAPSYNC_ENVIRONMENT_HOST`: host serving cluster resolution (required
//!   for environment-based loading)
//! - `CAPSYNC_ACCOUNT`: account identity for token acquisition
//! - `CAPSYNC_SYNC_PATH_TEMPLATE`: synchronize endpoint path template
//! - `CAPSYNC_HTTP_TIMEOUT_SECONDS`: HTTP request timeout
//! - `CAPSYNC_POLL_INTERVAL_SECONDS`: default polling interval
//! - `CAPSYNC_RETRY_INTERVAL_SECONDS`: wait between failed-poll retries
//! - `CAPSYNC_RETRY_MAX_ATTEMPTS`: retry budget per polling URL
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.toml` or `./config.json` (current working directory)
//! 2. `./capsync.toml` or `./capsync.json` (current working directory)
//! 3. Parent directories (up to 2 levels)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use capsync_domain::{CapSyncError, Config, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the environment is
/// not configured there, falls back to a probed config file, and finally to
/// the built-in defaults (callers can still override per invocation).
///
/// # Errors
/// Returns `CapSyncError::Config` if a config file exists but cannot be
/// parsed, or an environment variable has an invalid value.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(CapSyncError::Config(message)) if message.contains("Missing") => {
            tracing::debug!("Environment not configured, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path)),
                None => {
                    tracing::info!("No configuration found; using built-in defaults");
                    Ok(Config::default())
                }
            }
        }
        Err(err) => Err(err),
    }
}

/// Load configuration from environment variables
///
/// `CAPSYNC_ENVIRONMENT_HOST` must be present; every other variable falls
/// back to its default value.
///
/// # Errors
/// Returns `CapSyncError::Config` if the host is missing or any present
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.environment.host = env_var("CAPSYNC_ENVIRONMENT_HOST")?;
    config.account = std::env::var("CAPSYNC_ACCOUNT").ok();

    if let Ok(template) = std::env::var("CAPSYNC_SYNC_PATH_TEMPLATE") {
        config.environment.sync_path_template = template;
    }

    if let Some(timeout) = env_u64("CAPSYNC_HTTP_TIMEOUT_SECONDS")? {
        config.http.timeout_seconds = timeout;
    }
    if let Some(interval) = env_u64("CAPSYNC_POLL_INTERVAL_SECONDS")? {
        config.polling.poll_interval_seconds = interval;
    }
    if let Some(interval) = env_u64("CAPSYNC_RETRY_INTERVAL_SECONDS")? {
        config.polling.retry_interval_seconds = interval;
    }
    if let Some(attempts) = env_u64("CAPSYNC_RETRY_MAX_ATTEMPTS")? {
        config.polling.retry_max_attempts = u32::try_from(attempts)
            .map_err(|_| CapSyncError::Config("Invalid retry attempt count".to_string()))?;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CapSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CapSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CapSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CapSyncError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CapSyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CapSyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CapSyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    // Try current working directory
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.toml"),
            cwd.join("config.json"),
            cwd.join("capsync.toml"),
            cwd.join("capsync.json"),
            cwd.join("../config.toml"),
            cwd.join("../config.json"),
            cwd.join("../../config.toml"),
            cwd.join("../../config.json"),
        ]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.toml"),
                exe_dir.join("config.json"),
                exe_dir.join("capsync.toml"),
                exe_dir.join("capsync.json"),
            ]);
        }
    }

    // Return first existing candidate
    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CapSyncError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional numeric environment variable
fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|e| CapSyncError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}
