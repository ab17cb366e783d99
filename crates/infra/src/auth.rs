//! Access token acquisition
//!
//! The authentication subsystem proper (interactive login, token caches,
//! refresh) lives outside this client; it is consumed through the
//! [`AccessTokenProvider`] port. The provider here reads a caller-supplied
//! bearer token from the process environment, which is how operators hand a
//! pre-acquired token to the CLI.

use async_trait::async_trait;
use capsync_core::AccessTokenProvider;
use capsync_domain::{CapSyncError, Result};
use tracing::debug;

/// Default environment variable holding the bearer token
pub const ACCESS_TOKEN_VAR: &str = "CAPSYNC_ACCESS_TOKEN";

/// Token provider backed by an environment variable
pub struct EnvTokenProvider {
    variable: String,
}

impl EnvTokenProvider {
    /// Create a provider reading [`ACCESS_TOKEN_VAR`]
    pub fn new() -> Self {
        Self { variable: ACCESS_TOKEN_VAR.to_string() }
    }

    /// Create a provider reading a custom environment variable
    pub fn with_variable(variable: impl Into<String>) -> Self {
        Self { variable: variable.into() }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccessTokenProvider for EnvTokenProvider {
    async fn access_token(&self, account: &str, environment: &str) -> Result<String> {
        debug!(account, environment, "reading access token from environment");
        match std::env::var(&self.variable) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(CapSyncError::Auth(format!(
                "not authenticated for environment '{environment}': set {} to a valid bearer token",
                self.variable
            ))),
        }
    }
}
