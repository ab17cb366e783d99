//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for CapSync
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CapSyncError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cluster resolution failed: {0}")]
    Resolution(String),

    #[error("Wrong endpoint: {0}")]
    WrongEndpoint(String),

    #[error("Sync submission failed: {0}")]
    Submit(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for CapSync operations
pub type Result<T> = std::result::Result<T, CapSyncError>;
