//! Explicit session value passed into the orchestrator
//!
//! Callers construct a [`Session`] per logical login and pass it into every
//! operation, so independent operations can run concurrently and tests can
//! supply deterministic values. There is no process-wide session state.

use serde::{Deserialize, Serialize};

/// Account and environment a synchronization operation runs under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Account identity handed to the token provider
    pub account: String,
    /// Environment host serving cluster resolution for this session
    pub environment: String,
}

impl Session {
    /// Create a new session value
    pub fn new(account: impl Into<String>, environment: impl Into<String>) -> Self {
        Self { account: account.into(), environment: environment.into() }
    }
}
