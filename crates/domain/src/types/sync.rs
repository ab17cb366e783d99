//! Synchronization operation data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of resolving a capacity name to its serving cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResolution {
    /// Capacity name as the environment knows it, including access suffix
    pub resolved_capacity_name: String,
    /// Hostname of the cluster that must serve requests for this capacity
    pub cluster_hostname: String,
}

/// Diagnostic trace headers issued by the server on the submit response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerTrace {
    pub root_activity_id: String,
    pub server_time: String,
}

/// Correlation identifiers threaded through one synchronization operation.
///
/// The correlation id is generated client-side at operation start; the two
/// server-issued fields stay empty until the submit response is observed.
#[derive(Debug, Clone)]
pub struct CorrelationContext {
    pub correlation_id: Uuid,
    pub root_activity_id: String,
    pub server_time: String,
}

impl CorrelationContext {
    /// Start a new operation context with a fresh correlation id
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            root_activity_id: String::new(),
            server_time: String::new(),
        }
    }

    /// Capture the server-issued trace headers from the submit response
    pub fn record_trace(&mut self, trace: &ServerTrace) {
        self.root_activity_id = trace.root_activity_id.clone();
        self.server_time = trace.server_time.clone();
    }

    /// Render the context for inclusion in failure details, so any outcome
    /// can be correlated with server-side logs.
    pub fn diagnostic(&self) -> String {
        format!(
            "CorrelationId: {}, RootActivityId: {}, Date Time UTC: {}",
            self.correlation_id, self.root_activity_id, self.server_time
        )
    }
}

impl Default for CorrelationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal state of a synchronization operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    Completed,
    Invalid,
}

/// Sync result body returned by a terminal status response.
///
/// Timestamps are optional on the wire; callers fall back to the client
/// clock when the server omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSyncResult {
    pub database: String,
    pub sync_state: SyncState,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DatabaseSyncResult {
    /// Placeholder error result seeded on the first failed status request,
    /// so the poll loop always terminates with a meaningful detail.
    pub fn error_placeholder(database: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            sync_state: SyncState::Invalid,
            details: details.into(),
            started_at: None,
            updated_at: None,
        }
    }
}

/// Terminal record returned to the caller for every synchronization attempt.
///
/// Success and failure are both represented here; callers inspect `state`
/// rather than matching on error types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub correlation_id: Uuid,
    pub database: String,
    pub state: SyncState,
    pub detail: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncOutcome {
    /// Terminal outcome for an operation that finished without polling or
    /// whose polled result reported completion.
    pub fn completed(
        correlation_id: Uuid,
        database: impl Into<String>,
        detail: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            correlation_id,
            database: database.into(),
            state: SyncState::Completed,
            detail: detail.into(),
            started_at,
            updated_at: Utc::now(),
        }
    }

    /// Terminal outcome for a failed operation
    pub fn invalid(
        correlation_id: Uuid,
        database: impl Into<String>,
        detail: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            correlation_id,
            database: database.into(),
            state: SyncState::Invalid,
            detail: detail.into(),
            started_at,
            updated_at: Utc::now(),
        }
    }

    /// Build the outcome from a polled sync result, falling back to the
    /// client clock for timestamps the server omitted.
    pub fn from_result(
        result: DatabaseSyncResult,
        correlation_id: Uuid,
        fallback_started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            correlation_id,
            database: result.database,
            state: result.sync_state,
            detail: result.details,
            started_at: result.started_at.unwrap_or(fallback_started_at),
            updated_at: result.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_resolution_deserializes_from_camel_case() {
        let json = r#"{"resolvedCapacityName":"contoso:rw","clusterHostname":"cluster1.example.net"}"#;
        let resolution: ClusterResolution = serde_json::from_str(json).unwrap();
        assert_eq!(resolution.resolved_capacity_name, "contoso:rw");
        assert_eq!(resolution.cluster_hostname, "cluster1.example.net");
    }

    #[test]
    fn sync_result_tolerates_missing_optional_fields() {
        let json = r#"{"database":"adventureworks","syncState":"Completed"}"#;
        let result: DatabaseSyncResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.sync_state, SyncState::Completed);
        assert!(result.details.is_empty());
        assert!(result.started_at.is_none());
    }

    #[test]
    fn fresh_contexts_get_distinct_correlation_ids() {
        let first = CorrelationContext::new();
        let second = CorrelationContext::new();
        assert_ne!(first.correlation_id, second.correlation_id);
        assert!(first.root_activity_id.is_empty());
    }

    #[test]
    fn diagnostic_embeds_recorded_trace() {
        let mut context = CorrelationContext::new();
        context.record_trace(&ServerTrace {
            root_activity_id: "raid-1".to_string(),
            server_time: "2026-01-01T00:00:00Z".to_string(),
        });
        let diagnostic = context.diagnostic();
        assert!(diagnostic.contains("raid-1"));
        assert!(diagnostic.contains(&context.correlation_id.to_string()));
    }

    #[test]
    fn outcome_from_result_falls_back_to_client_clock() {
        let started = Utc::now();
        let result = DatabaseSyncResult::error_placeholder("adventureworks", "Http Error code: 500.");
        let outcome = SyncOutcome::from_result(result, Uuid::new_v4(), started);
        assert_eq!(outcome.state, SyncState::Invalid);
        assert_eq!(outcome.started_at, started);
        assert!(outcome.detail.contains("500"));
    }

    #[test]
    fn outcome_serializes_to_camel_case() {
        let outcome = SyncOutcome::completed(Uuid::new_v4(), "db", "done", Utc::now());
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("correlationId"));
        assert!(json.contains("startedAt"));
        assert!(json.contains("\"state\":\"Completed\""));
    }
}
