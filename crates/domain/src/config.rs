//! Configuration management

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account identity used when acquiring access tokens
    pub account: Option<String>,
    pub environment: EnvironmentConfig,
    pub http: HttpConfig,
    pub polling: PollingConfig,
}

/// Environment endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Host serving the cluster-resolution endpoint, e.g.
    /// `westus.pbidedicated.windows.net`
    pub host: String,
    /// Path template for the synchronize endpoint on the resolved cluster.
    /// `{capacity}` and `{database}` are substituted per request.
    pub sync_path_template: String,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
}

/// Status polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Wait before the first status request when the server supplies no
    /// `Retry-After` value
    pub poll_interval_seconds: u64,
    /// Wait between retries of a failed status request
    pub retry_interval_seconds: u64,
    /// Retry budget per polling URL; resets when the server redirects
    pub retry_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: None,
            environment: EnvironmentConfig::default(),
            http: HttpConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            sync_path_template: "/webapi/capacities/{capacity}/databases/{database}/sync"
                .to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { poll_interval_seconds: 30, retry_interval_seconds: 10, retry_max_attempts: 3 }
    }
}
