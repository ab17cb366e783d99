//! Sync request submission
//!
//! Builds and sends the initial synchronization POST and classifies the
//! immediate response. The diagnostic trace headers are captured before any
//! status handling so they are available to failure details no matter how
//! the submission is disposed of.

use std::time::Duration;

use async_trait::async_trait;
use capsync_core::{SubmitDisposition, SubmitResponse, SyncSubmitter};
use capsync_domain::{CapSyncError, Result, ServerTrace};
use reqwest::StatusCode;
use tracing::debug;
use uuid::Uuid;

use crate::http::{base_url, HttpClient, CURRENT_UTC_DATE_HEADER, ROOT_ACTIVITY_ID_HEADER};

/// HTTP implementation of the [`SyncSubmitter`] port
pub struct HttpSyncSubmitter {
    http: HttpClient,
    sync_path_template: String,
    default_poll_interval: Duration,
}

impl HttpSyncSubmitter {
    /// Create a submitter for the given sync endpoint template.
    ///
    /// `default_poll_interval` is used when an accepted response carries no
    /// `Retry-After` header.
    pub fn new(
        http: HttpClient,
        sync_path_template: impl Into<String>,
        default_poll_interval: Duration,
    ) -> Self {
        Self { http, sync_path_template: sync_path_template.into(), default_poll_interval }
    }

    fn sync_url(&self, cluster_host: &str, capacity_name: &str, database: &str) -> String {
        let path = self
            .sync_path_template
            .replace("{capacity}", capacity_name)
            .replace("{database}", database);
        format!("{}{}", base_url(cluster_host), path)
    }
}

#[async_trait]
impl SyncSubmitter for HttpSyncSubmitter {
    async fn submit(
        &self,
        cluster_host: &str,
        capacity_name: &str,
        database: &str,
        access_token: &str,
        correlation_id: Uuid,
    ) -> Result<SubmitResponse> {
        let url = self.sync_url(cluster_host, capacity_name, database);
        debug!(url, database, "submitting sync request");

        let response = self.http.post(&url, access_token, correlation_id).await?;

        // Trace headers are captured in every case, including rejections.
        let trace = ServerTrace {
            root_activity_id: response.header(ROOT_ACTIVITY_ID_HEADER).unwrap_or_default(),
            server_time: response.header(CURRENT_UTC_DATE_HEADER).unwrap_or_default(),
        };

        let status = response.status;
        let disposition = if !status.is_success() {
            SubmitDisposition::Rejected { status: status.as_u16(), body: response.body }
        } else if status != StatusCode::ACCEPTED {
            SubmitDisposition::Synchronized { status: status.as_u16() }
        } else {
            let poll_url = response.location().ok_or_else(|| {
                CapSyncError::Submit(
                    "sync request was accepted but the response named no status URL".to_string(),
                )
            })?;
            let poll_interval = response.retry_after().unwrap_or(self.default_poll_interval);
            SubmitDisposition::Accepted { poll_url, poll_interval }
        };

        Ok(SubmitResponse { trace, disposition })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const SYNC_PATH: &str = "/webapi/capacities/contoso:rw/databases/adventureworks/sync";

    fn submitter() -> HttpSyncSubmitter {
        HttpSyncSubmitter::new(
            HttpClient::builder().build(),
            "/webapi/capacities/{capacity}/databases/{database}/sync",
            Duration::from_secs(30),
        )
    }

    async fn submit(server: &MockServer) -> Result<SubmitResponse> {
        submitter()
            .submit(&server.uri(), "contoso:rw", "adventureworks", "token", Uuid::new_v4())
            .await
    }

    #[tokio::test]
    async fn accepted_response_yields_poll_target_and_trace() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .and(header("authorization", "Bearer token"))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Location", "https://cluster1.example.net/operations/7")
                    .insert_header("Retry-After", "5")
                    .insert_header(ROOT_ACTIVITY_ID_HEADER, "raid-7")
                    .insert_header(CURRENT_UTC_DATE_HEADER, "2026-02-03T04:05:06Z"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = submit(&server).await.unwrap();

        assert_eq!(response.trace.root_activity_id, "raid-7");
        assert_eq!(response.trace.server_time, "2026-02-03T04:05:06Z");
        assert_eq!(
            response.disposition,
            SubmitDisposition::Accepted {
                poll_url: "https://cluster1.example.net/operations/7".to_string(),
                poll_interval: Duration::from_secs(5),
            }
        );
    }

    #[tokio::test]
    async fn accepted_without_retry_after_uses_the_default_interval() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Location", "https://cluster1.example.net/operations/8"),
            )
            .mount(&server)
            .await;

        let response = submit(&server).await.unwrap();

        match response.disposition {
            SubmitDisposition::Accepted { poll_interval, .. } => {
                assert_eq!(poll_interval, Duration::from_secs(30));
            }
            other => panic!("expected accepted disposition, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn plain_success_means_nothing_to_replicate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let response = submit(&server).await.unwrap();

        assert_eq!(response.disposition, SubmitDisposition::Synchronized { status: 200 });
    }

    #[tokio::test]
    async fn rejection_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string("forbidden")
                    .insert_header(ROOT_ACTIVITY_ID_HEADER, "raid-9"),
            )
            .mount(&server)
            .await;

        let response = submit(&server).await.unwrap();

        assert_eq!(
            response.disposition,
            SubmitDisposition::Rejected { status: 403, body: "forbidden".to_string() }
        );
        // Trace is captured even when the submission is rejected
        assert_eq!(response.trace.root_activity_id, "raid-9");
    }

    #[tokio::test]
    async fn accepted_without_location_is_a_submit_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let err = submit(&server).await.unwrap_err();
        assert!(matches!(err, CapSyncError::Submit(_)));
    }
}
