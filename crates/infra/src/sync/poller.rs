//! Status polling state machine
//!
//! Drives the long-running operation's status URL to a terminal result.
//! Each attempt moves through three named states:
//!
//! - `Waiting` - about to poll the current URL, either for the first time or
//!   after a transient failure
//! - `Redirected` - the server answered "still running" (303) and supplied a
//!   new URL and interval; the per-URL retry budget resets
//! - `Resolved` - a terminal response was observed (parsed body, client
//!   error, or an exhausted retry budget)
//!
//! Transient failures are retried against the same URL up to the configured
//! budget, waiting the short retry interval (equal-jittered) instead of the
//! operation's own polling interval. Client errors (4xx) are never retried.
//! The error result seeded on the first failure is kept even if later
//! failures report something different, so the terminal detail names the
//! original symptom. There is no wall-clock ceiling: a server that keeps
//! redirecting keeps being polled.

use std::time::Duration;

use async_trait::async_trait;
use capsync_core::{PollTarget, StatusPoller};
use capsync_domain::{CapSyncError, DatabaseSyncResult, PollingConfig, Result};
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::errors::InfraError;
use crate::http::{HttpClient, HttpResponse};

/// Retry policy for the poll loop
#[derive(Debug, Clone)]
pub struct PollingPolicy {
    /// Wait between retries of a failed status request (jittered)
    pub retry_interval: Duration,
    /// Retry budget per polling URL; resets on redirect
    pub max_attempts_per_url: u32,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self { retry_interval: Duration::from_secs(10), max_attempts_per_url: 3 }
    }
}

impl From<&PollingConfig> for PollingPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            retry_interval: Duration::from_secs(config.retry_interval_seconds),
            max_attempts_per_url: config.retry_max_attempts.max(1),
        }
    }
}

/// Poll loop state. `Waiting` and `Redirected` both carry the URL and
/// interval for the next attempt; `Resolved` is terminal.
#[derive(Debug)]
enum PollState {
    Waiting(PollTarget),
    Redirected(PollTarget),
    Resolved(DatabaseSyncResult),
}

/// Failure bookkeeping carried across attempts (and across redirects).
#[derive(Default)]
struct PollProgress {
    attempts: u32,
    first_error: Option<DatabaseSyncResult>,
}

/// HTTP implementation of the [`StatusPoller`] port
pub struct HttpStatusPoller {
    http: HttpClient,
    policy: PollingPolicy,
}

impl HttpStatusPoller {
    /// Create a poller with the given retry policy
    pub fn new(http: HttpClient, policy: PollingPolicy) -> Self {
        Self { http, policy }
    }

    /// Compute the next state from one poll response.
    fn transition(
        &self,
        database: &str,
        current: PollTarget,
        response: &HttpResponse,
        progress: &mut PollProgress,
    ) -> Result<PollState> {
        let status = response.status;

        if status == StatusCode::SEE_OTHER {
            let location = response.location().ok_or_else(|| {
                CapSyncError::Parse(
                    "status redirect carried no Location header to follow".to_string(),
                )
            })?;
            let next_url = Url::parse(&location).map_err(|err| {
                CapSyncError::Parse(format!("redirect target '{location}' is not a valid URL: {err}"))
            })?;
            // Forward progress: the retry budget belongs to the URL, so it
            // starts over for the new one.
            progress.attempts = 0;
            let interval = response.retry_after().unwrap_or(current.interval);
            debug!(url = %next_url, ?interval, "operation still running; following redirect");
            return Ok(PollState::Redirected(PollTarget { url: String::from(next_url), interval }));
        }

        if status.is_success() {
            let result: DatabaseSyncResult =
                serde_json::from_str(&response.body).map_err(|err| {
                    let infra: InfraError = err.into();
                    CapSyncError::from(infra)
                })?;
            return Ok(PollState::Resolved(result));
        }

        progress.attempts += 1;
        if progress.first_error.is_none() {
            progress.first_error = Some(DatabaseSyncResult::error_placeholder(
                database,
                format!("Http Error code: {}. {}", status.as_u16(), response.body),
            ));
        }

        let exhausted = progress.attempts >= self.policy.max_attempts_per_url;
        if status.is_client_error() || exhausted {
            let result = progress.first_error.take().unwrap_or_else(|| {
                DatabaseSyncResult::error_placeholder(
                    database,
                    format!("Http Error code: {}.", status.as_u16()),
                )
            });
            warn!(status = status.as_u16(), attempts = progress.attempts, "status polling ended in failure");
            return Ok(PollState::Resolved(result));
        }

        warn!(
            status = status.as_u16(),
            attempt = progress.attempts,
            budget = self.policy.max_attempts_per_url,
            "status request failed; retrying"
        );
        Ok(PollState::Waiting(current))
    }

    /// Wait before the next attempt: the operation-supplied interval for a
    /// fresh URL, the jittered retry interval after a failure.
    async fn wait(
        &self,
        progress: &PollProgress,
        interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let delay = if progress.attempts == 0 {
            interval
        } else {
            equal_jitter(self.policy.retry_interval)
        };
        if delay.is_zero() {
            return Ok(());
        }
        debug!(?delay, "waiting before next status request");
        tokio::select! {
            () = cancel.cancelled() => {
                Err(CapSyncError::Cancelled("status polling cancelled by caller".to_string()))
            }
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

#[async_trait]
impl StatusPoller for HttpStatusPoller {
    async fn poll(
        &self,
        database: &str,
        target: PollTarget,
        access_token: &str,
        correlation_id: Uuid,
        cancel: CancellationToken,
    ) -> Result<DatabaseSyncResult> {
        let mut progress = PollProgress::default();
        let mut state = PollState::Waiting(target);

        loop {
            let current = match state {
                PollState::Resolved(result) => return Ok(result),
                PollState::Waiting(target) | PollState::Redirected(target) => target,
            };

            self.wait(&progress, current.interval, &cancel).await?;

            let response = tokio::select! {
                () = cancel.cancelled() => {
                    return Err(CapSyncError::Cancelled(
                        "status polling cancelled by caller".to_string(),
                    ))
                }
                response = self.http.get(&current.url, access_token, correlation_id) => response?,
            };

            state = self.transition(database, current, &response, &mut progress)?;
        }
    }
}

/// Equal jitter: the waited delay lands in `[delay/2, delay]`.
fn equal_jitter(delay: Duration) -> Duration {
    let millis = delay.as_millis() as u64;
    if millis < 2 {
        return delay;
    }
    let half = millis / 2;
    Duration::from_millis(half + random_below(millis - half + 1))
}

/// Pseudo-random value below `max` from a timing-seeded LCG. Distribution is
/// good enough for jitter without an external dependency.
fn random_below(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| u64::from(elapsed.subsec_nanos()))
        .unwrap_or_default();

    // Simple Linear Congruential Generator (LCG) constants from Numerical
    // Recipes
    let mut seed = nanos.wrapping_mul(1664525).wrapping_add(1013904223);
    seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    seed % max
}
