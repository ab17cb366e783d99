use std::time::Duration;

use capsync_domain::CapSyncError;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use tracing::debug;
use uuid::Uuid;

use crate::errors::InfraError;

/// Header carrying the client-generated correlation id on every request.
pub const CORRELATION_ID_HEADER: &str = "x-ms-correlation-id";

/// Server-issued trace id header, captured for diagnostics.
pub const ROOT_ACTIVITY_ID_HEADER: &str = "x-ms-root-activity-id";

/// Server-issued timestamp header, captured for diagnostics.
pub const CURRENT_UTC_DATE_HEADER: &str = "x-ms-current-utc-date";

/// Normalize a host into a base URL, defaulting to https.
///
/// Hosts that already carry a scheme pass through unchanged (minus any
/// trailing slash), so resolved cluster values may be full URLs.
pub fn base_url(host: &str) -> String {
    let trimmed = host.trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Captured response of a single HTTP round trip.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    /// Read a response header as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).and_then(|value| value.to_str().ok()).map(ToString::to_string)
    }

    /// The `Location` header, used for poll URLs and redirects.
    pub fn location(&self) -> Option<String> {
        self.header("location")
    }

    /// The `Retry-After` header parsed as delta seconds.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after").and_then(|value| value.trim().parse::<u64>().ok()).map(Duration::from_secs)
    }
}

/// HTTP client issuing bearer-authorized, correlation-tagged requests.
///
/// Every send builds a fresh connection and releases it once the body is
/// consumed. Connections and redirect state must not leak between attempts,
/// so there is no pooling across calls. Retry policy lives with the callers;
/// this layer never retries.
#[derive(Clone)]
pub struct HttpClient {
    timeout: Duration,
    user_agent: Option<String>,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// POST with an empty body.
    pub async fn post(
        &self,
        url: &str,
        access_token: &str,
        correlation_id: Uuid,
    ) -> Result<HttpResponse, CapSyncError> {
        self.send(Method::POST, url, access_token, correlation_id, None).await
    }

    /// POST a form-encoded body.
    pub async fn post_form(
        &self,
        url: &str,
        access_token: &str,
        correlation_id: Uuid,
        body: String,
    ) -> Result<HttpResponse, CapSyncError> {
        self.send(Method::POST, url, access_token, correlation_id, Some(body)).await
    }

    /// GET with redirect following disabled.
    pub async fn get(
        &self,
        url: &str,
        access_token: &str,
        correlation_id: Uuid,
    ) -> Result<HttpResponse, CapSyncError> {
        self.send(Method::GET, url, access_token, correlation_id, None).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        access_token: &str,
        correlation_id: Uuid,
        form_body: Option<String>,
    ) -> Result<HttpResponse, CapSyncError> {
        let client = self.fresh_client()?;

        let mut request = client
            .request(method.clone(), url)
            .bearer_auth(access_token)
            .header(CORRELATION_ID_HEADER, correlation_id.to_string());

        if let Some(body) = form_body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body);
        }

        debug!(%method, url, %correlation_id, "sending HTTP request");

        let response = request.send().await.map_err(|err| {
            let infra: InfraError = err.into();
            CapSyncError::from(infra)
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|err| {
            let infra: InfraError = err.into();
            CapSyncError::from(infra)
        })?;

        debug!(%method, url, %status, "received HTTP response");

        Ok(HttpResponse { status, headers, body })
    }

    /// Build a new connection for a single request. The server relies on the
    /// client not carrying redirect or keep-alive state across attempts.
    fn fresh_client(&self) -> Result<ReqwestClient, CapSyncError> {
        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy();

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            CapSyncError::from(infra)
        })
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), user_agent: None }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> HttpClient {
        HttpClient { timeout: self.timeout, user_agent: self.user_agent }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client() -> HttpClient {
        HttpClient::builder().timeout(Duration::from_secs(5)).build()
    }

    #[test]
    fn base_url_prefixes_https_for_bare_hosts() {
        assert_eq!(base_url("cluster1.example.net"), "https://cluster1.example.net");
        assert_eq!(base_url("http://127.0.0.1:9000/"), "http://127.0.0.1:9000");
    }

    #[tokio::test]
    async fn sends_bearer_and_correlation_headers() {
        let server = MockServer::start().await;
        let correlation_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer secret-token"))
            .and(header(CORRELATION_ID_HEADER, correlation_id.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let response = client().get(&server.uri(), "secret-token", correlation_id).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "ok");
    }

    #[tokio::test]
    async fn does_not_follow_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(303)
                    .insert_header("Location", "https://elsewhere.example.net/next")
                    .insert_header("Retry-After", "5"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client().get(&server.uri(), "token", Uuid::new_v4()).await.unwrap();

        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location().as_deref(), Some("https://elsewhere.example.net/next"));
        assert_eq!(response.retry_after(), Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn form_posts_carry_urlencoded_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let response = client()
            .post_form(&server.uri(), "token", Uuid::new_v4(), "CapacityName=contoso:rw".into())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_retry_after_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(303).insert_header("Retry-After", "soon"))
            .mount(&server)
            .await;

        let response = client().get(&server.uri(), "token", Uuid::new_v4()).await.unwrap();
        assert_eq!(response.retry_after(), None);
    }
}
