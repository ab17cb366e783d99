//! Conversions from external infrastructure errors into domain errors.

use capsync_domain::CapSyncError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CapSyncError);

impl From<InfraError> for CapSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CapSyncError> for InfraError {
    fn from(value: CapSyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCapSyncError {
    fn into_capsync(self) -> CapSyncError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CapSyncError */
/* -------------------------------------------------------------------------- */

impl IntoCapSyncError for HttpError {
    fn into_capsync(self) -> CapSyncError {
        if self.is_timeout() {
            return CapSyncError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return CapSyncError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => CapSyncError::Auth(message),
                _ => CapSyncError::Network(message),
            };
        }

        CapSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_capsync())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → CapSyncError */
/* -------------------------------------------------------------------------- */

impl IntoCapSyncError for JsonError {
    fn into_capsync(self) -> CapSyncError {
        CapSyncError::Parse(format!("invalid JSON payload: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_capsync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
