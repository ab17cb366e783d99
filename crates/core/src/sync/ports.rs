//! Port interfaces for the synchronization pipeline

use std::time::Duration;

use async_trait::async_trait;
use capsync_domain::{ClusterResolution, DatabaseSyncResult, Result, ServerTrace};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
/// Implementations must be safe for concurrent reads; independent operations
/// may request tokens at the same time.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a valid bearer token for the given account and environment
    async fn access_token(&self, account: &str, environment: &str) -> Result<String>;
}

/// Trait for resolving a capacity name to the cluster that serves it
#[async_trait]
pub trait ClusterResolver: Send + Sync {
    /// Resolve `capacity_name` against the environment's resolution endpoint.
    ///
    /// Resolution failures indicate a naming or environment mismatch, never
    /// transient load; implementations must not retry.
    async fn resolve(
        &self,
        environment_host: &str,
        capacity_name: &str,
        access_token: &str,
        correlation_id: Uuid,
    ) -> Result<ClusterResolution>;
}

/// How the server disposed of a synchronization submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitDisposition {
    /// Non-success status; the submission was not accepted and is not retried
    Rejected { status: u16, body: String },
    /// Success without "Accepted": nothing to replicate, operation already done
    Synchronized { status: u16 },
    /// Accepted (202); the operation runs server-side and must be polled
    Accepted { poll_url: String, poll_interval: Duration },
}

/// Initial response to a synchronization submission
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    /// Diagnostic trace headers, captured regardless of disposition
    pub trace: ServerTrace,
    pub disposition: SubmitDisposition,
}

/// Trait for submitting the synchronization request to a cluster
#[async_trait]
pub trait SyncSubmitter: Send + Sync {
    /// POST the sync request for `(capacity_name, database)` and classify
    /// the immediate response.
    async fn submit(
        &self,
        cluster_host: &str,
        capacity_name: &str,
        database: &str,
        access_token: &str,
        correlation_id: Uuid,
    ) -> Result<SubmitResponse>;
}

/// Polling URL and initial wait handed from the submit step to the poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTarget {
    pub url: String,
    pub interval: Duration,
}

/// Trait for driving the status poll loop to a terminal result
#[async_trait]
pub trait StatusPoller: Send + Sync {
    /// Poll `target` until the operation reaches a terminal state.
    ///
    /// Returns the terminal sync result, which may itself report failure;
    /// transport and parse errors are returned as `Err` for the orchestrator
    /// to fold. Cancelling `cancel` aborts the current wait or request.
    async fn poll(
        &self,
        database: &str,
        target: PollTarget,
        access_token: &str,
        correlation_id: Uuid,
        cancel: CancellationToken,
    ) -> Result<DatabaseSyncResult>;
}
