//! Capacity reference parsing and validation

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{CapSyncError, Result};

/// Suffix marking the read-write (management) endpoint of a capacity.
/// Any other suffix addresses a read-only replica.
pub const READ_WRITE_SUFFIX: &str = ":rw";

/// Logical reference to a capacity, as supplied by the caller.
///
/// Two input forms are accepted: the bare capacity name with its access-mode
/// suffix (`contosocapacity:rw`), or a full capacity URI
/// (`pbidedicated://westus.pbidedicated.windows.net/contosocapacity:rw`). In
/// the URI form the host names the environment the capacity lives in and must
/// match the session's environment host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityReference {
    name: String,
    environment_host: Option<String>,
}

impl CapacityReference {
    /// Parse a caller-supplied capacity reference.
    ///
    /// # Errors
    /// Returns `CapSyncError::Usage` when the input is empty or the URI form
    /// is missing a host or capacity name.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CapSyncError::Usage("capacity reference must not be empty".to_string()));
        }

        let Some((_, remainder)) = trimmed.split_once("://") else {
            return Ok(Self { name: trimmed.to_string(), environment_host: None });
        };

        let (host, path) = remainder.split_once('/').ok_or_else(|| {
            CapSyncError::Usage(format!("capacity URI '{trimmed}' is missing a capacity name"))
        })?;
        let name = path.trim_matches('/');
        if host.is_empty() || name.is_empty() {
            return Err(CapSyncError::Usage(format!(
                "capacity URI '{trimmed}' must have the form <scheme>://<environment-host>/<name>{READ_WRITE_SUFFIX}"
            )));
        }

        Ok(Self { name: name.to_string(), environment_host: Some(host.to_string()) })
    }

    /// Capacity name including its access-mode suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Environment host extracted from the URI form, if the reference was
    /// given as a URI.
    pub fn environment_host(&self) -> Option<&str> {
        self.environment_host.as_deref()
    }

    /// Whether this reference addresses the read-write endpoint.
    pub fn is_read_write(&self) -> bool {
        self.name.ends_with(READ_WRITE_SUFFIX)
    }

    /// Fail unless the reference addresses the read-write endpoint.
    ///
    /// Synchronization is a management operation; it must never be submitted
    /// against a read-only replica.
    ///
    /// # Errors
    /// Returns `CapSyncError::Usage` for any non-`:rw` suffix.
    pub fn ensure_read_write(&self) -> Result<()> {
        if self.is_read_write() {
            Ok(())
        } else {
            Err(CapSyncError::Usage(format!(
                "capacity '{}' is not a read-write reference; sync requests require the '{READ_WRITE_SUFFIX}' suffix",
                self.name
            )))
        }
    }

    /// Fail unless a URI-form reference names the session's environment.
    ///
    /// # Errors
    /// Returns `CapSyncError::Usage` when the URI host differs from
    /// `environment_host` (case-insensitive). Bare references always pass.
    pub fn ensure_environment(&self, environment_host: &str) -> Result<()> {
        match &self.environment_host {
            Some(host) if !host.eq_ignore_ascii_case(environment_host) => {
                Err(CapSyncError::Usage(format!(
                    "capacity reference targets environment '{host}' but the session is for '{environment_host}'"
                )))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for CapacityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.environment_host {
            Some(host) => write!(f, "{}/{}", host, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_reference() {
        let reference = CapacityReference::parse("contosocapacity:rw").unwrap();
        assert_eq!(reference.name(), "contosocapacity:rw");
        assert_eq!(reference.environment_host(), None);
        assert!(reference.is_read_write());
    }

    #[test]
    fn parses_uri_reference() {
        let reference = CapacityReference::parse(
            "pbidedicated://westus.pbidedicated.windows.net/contosocapacity:rw",
        )
        .unwrap();
        assert_eq!(reference.name(), "contosocapacity:rw");
        assert_eq!(reference.environment_host(), Some("westus.pbidedicated.windows.net"));
    }

    #[test]
    fn read_only_suffix_is_a_usage_error() {
        let reference = CapacityReference::parse("contosocapacity:ro").unwrap();
        let err = reference.ensure_read_write().unwrap_err();
        assert!(matches!(err, CapSyncError::Usage(_)));
    }

    #[test]
    fn missing_suffix_is_a_usage_error() {
        let reference = CapacityReference::parse("contosocapacity").unwrap();
        assert!(reference.ensure_read_write().is_err());
    }

    #[test]
    fn environment_check_is_case_insensitive() {
        let reference =
            CapacityReference::parse("pbidedicated://WestUS.Example.Net/contoso:rw").unwrap();
        assert!(reference.ensure_environment("westus.example.net").is_ok());
    }

    #[test]
    fn environment_mismatch_is_a_usage_error() {
        let reference =
            CapacityReference::parse("pbidedicated://eastus.example.net/contoso:rw").unwrap();
        let err = reference.ensure_environment("westus.example.net").unwrap_err();
        assert!(matches!(err, CapSyncError::Usage(_)));
    }

    #[test]
    fn bare_reference_passes_environment_check() {
        let reference = CapacityReference::parse("contoso:rw").unwrap();
        assert!(reference.ensure_environment("westus.example.net").is_ok());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(CapacityReference::parse("  ").is_err());
    }

    #[test]
    fn uri_without_capacity_name_is_rejected() {
        assert!(CapacityReference::parse("pbidedicated://westus.example.net/").is_err());
        assert!(CapacityReference::parse("pbidedicated://westus.example.net").is_err());
    }
}
