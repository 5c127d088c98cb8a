//! Issue tracker REST client.
//!
//! Two calls are needed: an existence check (`GET /issues/{key}`) and remote
//! link creation (`POST /issues/{key}/remotelinks`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::TrackerError;
use crate::tickets::TicketKey;

/// Relationship type of created remote links.
pub const LINK_RELATIONSHIP: &str = "relates";

/// Operations the linker needs from the issue tracker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackerGateway: Send + Sync {
    /// Whether the issue exists. `Ok(false)` when the tracker does not know it.
    async fn issue_exists(&self, key: &TicketKey) -> Result<bool, TrackerError>;

    /// Create a remote link from the issue to a GitLab artifact path.
    async fn link_issue(&self, key: &TicketKey, path: &str) -> Result<(), TrackerError>;
}

/// Remote link request body.
#[derive(Debug, Serialize)]
struct RemoteLinkRequest<'a> {
    origin: &'a str,
    relationship: &'a str,
    key: &'a str,
}

/// HTTP client for the tracker REST API.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    client: reqwest::Client,
    base_url: String,
    link_origin: String,
}

impl TrackerClient {
    /// Create a tracker client.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://api.tracker.yandex.net/v2`
    /// * `token` - API token, sent as a bearer token
    /// * `link_origin` - Origin label stored with created remote links
    /// * `timeout` - Upper bound for each request
    pub fn new(
        base_url: &str,
        token: &str,
        link_origin: &str,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let mut headers = HeaderMap::new();
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| TrackerError::InvalidToken)?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            link_origin: link_origin.to_string(),
        })
    }

    /// API root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn issue_url(&self, key: &TicketKey) -> String {
        format!("{}/issues/{key}", self.base_url)
    }
}

#[async_trait]
impl TrackerGateway for TrackerClient {
    #[instrument(skip_all, fields(issue = %key))]
    async fn issue_exists(&self, key: &TicketKey) -> Result<bool, TrackerError> {
        let response = self.client.get(self.issue_url(key)).send().await?;

        let status = response.status();
        if status.is_success() {
            debug!("Issue exists");
            return Ok(true);
        }
        if status == StatusCode::NOT_FOUND {
            debug!("Issue not found");
            return Ok(false);
        }

        let body = response.text().await.unwrap_or_default();
        Err(TrackerError::UnexpectedStatus { status, body })
    }

    #[instrument(skip_all, fields(issue = %key, path = %path))]
    async fn link_issue(&self, key: &TicketKey, path: &str) -> Result<(), TrackerError> {
        let request = RemoteLinkRequest {
            origin: &self.link_origin,
            relationship: LINK_RELATIONSHIP,
            key: path,
        };

        let response = self
            .client
            .post(format!("{}/remotelinks", self.issue_url(key)))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("Remote link created");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TrackerError::UnexpectedStatus { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn key(raw: &str) -> TicketKey {
        TicketKey::parse(raw).unwrap()
    }

    fn client(server: &MockServer) -> TrackerClient {
        TrackerClient::new(
            &format!("{}/v2/", server.uri()),
            "secret",
            "ru.example.gitlab",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = TrackerClient::new(
            "https://tracker.example/v2/",
            "secret",
            "origin",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://tracker.example/v2");
        assert_eq!(
            client.issue_url(&key("ABC-1")),
            "https://tracker.example/v2/issues/ABC-1"
        );
    }

    #[test]
    fn test_invalid_token_rejected() {
        let result = TrackerClient::new(
            "https://tracker.example/v2",
            "bad\ntoken",
            "origin",
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(TrackerError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_issue_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/issues/ABC-1"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "ABC-1"})))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client(&server).issue_exists(&key("ABC-1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_issue_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/issues/ABC-2"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(!client(&server).issue_exists(&key("ABC-2")).await.unwrap());
    }

    #[tokio::test]
    async fn test_issue_exists_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/issues/ABC-3"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client(&server)
            .issue_exists(&key("ABC-3"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::UnexpectedStatus { status, ref body }
                if status == StatusCode::SERVICE_UNAVAILABLE && body == "maintenance"
        ));
    }

    #[tokio::test]
    async fn test_link_issue() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/issues/ABC-1/remotelinks"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({
                "origin": "ru.example.gitlab",
                "relationship": "relates",
                "key": "alvassin/example/-/merge_requests/1"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .link_issue(&key("ABC-1"), "alvassin/example/-/merge_requests/1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_link_issue_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/issues/ABC-1/remotelinks"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = client(&server)
            .link_issue(&key("ABC-1"), "alvassin/example/-/commit/1")
            .await;
        assert!(matches!(
            result,
            Err(TrackerError::UnexpectedStatus { status, .. })
                if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Nothing listens on the discard port
        let client = TrackerClient::new(
            "http://127.0.0.1:9",
            "secret",
            "origin",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(matches!(
            client.issue_exists(&key("ABC-1")).await,
            Err(TrackerError::Http(_))
        ));
    }
}
