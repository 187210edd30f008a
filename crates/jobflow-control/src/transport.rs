//! The network boundary.
//!
//! A [`Transport`] sends one signed request and hands back the status and
//! body. It applies no retries; interpreting the status is left to the
//! caller.

use std::time::Duration;

use async_trait::async_trait;
use jobflow_auth::SignedRequest;
use thiserror::Error;

/// Default overall request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends signed requests.
///
/// This trait abstracts the HTTP client, allowing for recording
/// implementations in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `request` and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received.
    async fn post(&self, request: &SignedRequest) -> Result<TransportResponse, TransportError>;
}

/// Status and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl TransportResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }
}

/// Failures of the network boundary itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The request failed before a response arrived.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a status that is neither success nor a
    /// client error.
    #[error("service returned status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

/// [`Transport`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom overall timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create a transport around an existing reqwest client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &SignedRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            // reqwest derives Host from the URL.
            if name.eq_ignore_ascii_case("host") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Request(format!("failed to read response body: {e}")))?;

        tracing::debug!(
            operation = %request.operation,
            status,
            "Received response"
        );

        Ok(TransportResponse { status, body })
    }
}

#[cfg(any(test, feature = "test-utils"))]
type QueuedResponse = Result<TransportResponse, TransportError>;

/// A transport that records requests and replays queued responses.
///
/// When the queue is empty it answers `200` with an empty JSON object.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct RecordingTransport {
    requests: parking_lot::Mutex<Vec<SignedRequest>>,
    responses: parking_lot::Mutex<std::collections::VecDeque<QueuedResponse>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingTransport {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request.
    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .push_back(Ok(TransportResponse::new(status, body)));
    }

    /// Queue a failure for the next request.
    pub fn push_error(&self, error: TransportError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Every request seen so far.
    #[must_use]
    pub fn requests(&self) -> Vec<SignedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests seen so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, request: &SignedRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse::new(200, "{}")))
    }
}

#[cfg(test)]
mod tests {
    use jobflow_auth::Operation;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn signed(url: String) -> SignedRequest {
        SignedRequest {
            operation: Operation::DescribeCluster,
            url,
            headers: vec![
                ("Host".to_string(), "elasticmapreduce.us-east-1.amazonaws.com".to_string()),
                (
                    "X-Amz-Target".to_string(),
                    "ElasticMapReduce.DescribeCluster".to_string(),
                ),
            ],
            body: r#"{"ClusterId":"j-1"}"#.to_string(),
        }
    }

    #[test]
    fn status_classes() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(!TransportResponse::new(302, "").is_success());
        assert!(TransportResponse::new(404, "").is_client_error());
        assert!(!TransportResponse::new(503, "").is_client_error());
    }

    #[tokio::test]
    async fn http_transport_posts_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("X-Amz-Target", "ElasticMapReduce.DescribeCluster"))
            .and(body_string(r#"{"ClusterId":"j-1"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Cluster":{}}"#))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let response = transport
            .post(&signed(format!("{}/", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"Cluster":{}}"#);
    }

    #[tokio::test]
    async fn http_transport_returns_error_statuses_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let response = transport.post(&signed(server.uri())).await.unwrap();

        assert_eq!(response, TransportResponse::new(400, "bad"));
    }

    #[tokio::test]
    async fn http_transport_reports_connection_failures() {
        let transport = HttpTransport::new().unwrap();
        let err = transport
            .post(&signed("http://127.0.0.1:1".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Request(_)));
    }

    #[tokio::test]
    async fn recording_transport_replays_in_order() {
        let transport = RecordingTransport::new();
        transport.push_response(200, "first");
        transport.push_error(TransportError::Request("reset".into()));

        let request = signed("http://localhost".to_string());
        assert_eq!(transport.post(&request).await.unwrap().body, "first");
        assert!(transport.post(&request).await.is_err());
        assert_eq!(transport.post(&request).await.unwrap().body, "{}");
        assert_eq!(transport.request_count(), 3);
    }
}
