//! Cluster resolution client
//!
//! Maps a logical capacity name to the cluster that must serve requests for
//! it. Resolution failures are never retried: a non-success status means the
//! name or environment is wrong, not that the service is loaded.

use async_trait::async_trait;
use capsync_core::ClusterResolver;
use capsync_domain::{CapSyncError, ClusterResolution, Result};
use tracing::debug;
use uuid::Uuid;

use crate::errors::InfraError;
use crate::http::{base_url, HttpClient};

const CLUSTER_RESOLVE_PATH: &str = "/webapi/clusterResolve";

/// HTTP implementation of the [`ClusterResolver`] port
pub struct ClusterResolveClient {
    http: HttpClient,
}

impl ClusterResolveClient {
    /// Create a new resolution client over the shared transport
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ClusterResolver for ClusterResolveClient {
    async fn resolve(
        &self,
        environment_host: &str,
        capacity_name: &str,
        access_token: &str,
        correlation_id: Uuid,
    ) -> Result<ClusterResolution> {
        let url = format!("{}{CLUSTER_RESOLVE_PATH}", base_url(environment_host));
        let body = format!("CapacityName={capacity_name}");

        let response = self.http.post_form(&url, access_token, correlation_id, body).await?;

        if !response.status.is_success() {
            return Err(CapSyncError::Resolution(format!(
                "cluster resolution for '{capacity_name}' returned HTTP {}: {}",
                response.status.as_u16(),
                response.body
            )));
        }

        let resolution: ClusterResolution = serde_json::from_str(&response.body).map_err(|err| {
            let infra: InfraError = err.into();
            CapSyncError::from(infra)
        })?;

        debug!(
            capacity = capacity_name,
            cluster = %resolution.cluster_hostname,
            "resolved capacity to cluster"
        );
        Ok(resolution)
    }
}
