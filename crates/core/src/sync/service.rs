//! Sync orchestrator - composes resolution, submission, and polling
//!
//! The service owns the one catch-all conversion point: every failure past
//! the pre-flight stages is folded into a terminal [`SyncOutcome`] rather
//! than surfaced as an error. Callers distinguish success from failure by
//! inspecting `SyncOutcome::state`.

use std::future::Future;
use std::sync::Arc;

use capsync_domain::{
    CapSyncError, CapacityReference, CorrelationContext, Result, Session, SyncOutcome,
    READ_WRITE_SUFFIX,
};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ports::{
    AccessTokenProvider, ClusterResolver, PollTarget, StatusPoller, SubmitDisposition,
    SyncSubmitter,
};

/// Orchestrates one synchronization operation end to end.
///
/// Pre-flight failures (bad reference, not authenticated, resolution errors,
/// wrong endpoint) surface as hard errors before any outcome exists. Every
/// later failure is folded into an `Invalid` outcome carrying the correlation
/// context gathered so far.
pub struct SyncService {
    tokens: Arc<dyn AccessTokenProvider>,
    resolver: Arc<dyn ClusterResolver>,
    submitter: Arc<dyn SyncSubmitter>,
    poller: Arc<dyn StatusPoller>,
}

impl SyncService {
    /// Create a new sync service from its ports
    pub fn new(
        tokens: Arc<dyn AccessTokenProvider>,
        resolver: Arc<dyn ClusterResolver>,
        submitter: Arc<dyn SyncSubmitter>,
        poller: Arc<dyn StatusPoller>,
    ) -> Self {
        Self { tokens, resolver, submitter, poller }
    }

    /// Synchronize `database` on the capacity named by `reference`.
    ///
    /// # Errors
    /// Returns `CapSyncError::Usage`, `Auth`, `Resolution`, or
    /// `WrongEndpoint` for pre-flight failures. All other failure modes are
    /// folded into the returned outcome.
    pub async fn synchronize(
        &self,
        session: &Session,
        reference: &CapacityReference,
        database: &str,
        cancel: CancellationToken,
    ) -> Result<SyncOutcome> {
        reference.ensure_read_write()?;
        reference.ensure_environment(&session.environment)?;

        let token = self.tokens.access_token(&session.account, &session.environment).await?;

        let started_at = Utc::now();
        let mut correlation = CorrelationContext::new();
        info!(
            correlation_id = %correlation.correlation_id,
            capacity = %reference,
            database,
            "sending sync request"
        );

        let resolution = match guarded(
            &cancel,
            self.resolver.resolve(
                &session.environment,
                reference.name(),
                &token,
                correlation.correlation_id,
            ),
        )
        .await
        {
            Ok(resolution) => resolution,
            Err(err @ CapSyncError::Cancelled(_)) => {
                return Ok(self.fold(&correlation, database, started_at, &err));
            }
            Err(err) => return Err(err),
        };

        if resolution.resolved_capacity_name != reference.name()
            || !resolution.resolved_capacity_name.ends_with(READ_WRITE_SUFFIX)
        {
            return Err(CapSyncError::WrongEndpoint(format!(
                "resolved capacity '{}' does not match the requested management endpoint '{}'",
                resolution.resolved_capacity_name,
                reference.name()
            )));
        }
        debug!(cluster = %resolution.cluster_hostname, "capacity resolved");

        let submit = match guarded(
            &cancel,
            self.submitter.submit(
                &resolution.cluster_hostname,
                &resolution.resolved_capacity_name,
                database,
                &token,
                correlation.correlation_id,
            ),
        )
        .await
        {
            Ok(submit) => submit,
            Err(err) => return Ok(self.fold(&correlation, database, started_at, &err)),
        };
        correlation.record_trace(&submit.trace);

        match submit.disposition {
            SubmitDisposition::Rejected { status, body } => {
                warn!(status, "sync submission rejected");
                Ok(SyncOutcome::invalid(
                    correlation.correlation_id,
                    database,
                    format!(
                        "Sync request rejected with HTTP status code {status}. {body} [{}]",
                        correlation.diagnostic()
                    ),
                    started_at,
                ))
            }
            SubmitDisposition::Synchronized { status } => {
                info!(status, "nothing to replicate; sync already complete");
                Ok(SyncOutcome::completed(
                    correlation.correlation_id,
                    database,
                    format!(
                        "Http status code: {status}. No read-only replicas found to replicate databases."
                    ),
                    started_at,
                ))
            }
            SubmitDisposition::Accepted { poll_url, poll_interval } => {
                debug!(poll_url, ?poll_interval, "sync accepted; polling for completion");
                let target = PollTarget { url: poll_url, interval: poll_interval };
                match self
                    .poller
                    .poll(database, target, &token, correlation.correlation_id, cancel)
                    .await
                {
                    Ok(result) => Ok(SyncOutcome::from_result(
                        result,
                        correlation.correlation_id,
                        started_at,
                    )),
                    Err(err) => Ok(self.fold(&correlation, database, started_at, &err)),
                }
            }
        }
    }

    /// The single catch-all conversion from an error into a terminal outcome
    fn fold(
        &self,
        correlation: &CorrelationContext,
        database: &str,
        started_at: chrono::DateTime<Utc>,
        err: &CapSyncError,
    ) -> SyncOutcome {
        warn!(error = %err, "folding failure into terminal outcome");
        SyncOutcome::invalid(
            correlation.correlation_id,
            database,
            format!("{err} [{}]", correlation.diagnostic()),
            started_at,
        )
    }
}

/// Run `operation` unless `cancel` fires first.
async fn guarded<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    if cancel.is_cancelled() {
        return Err(CapSyncError::Cancelled("synchronization cancelled by caller".to_string()));
    }
    tokio::select! {
        () = cancel.cancelled() => {
            Err(CapSyncError::Cancelled("synchronization cancelled by caller".to_string()))
        }
        result = operation => result,
    }
}
