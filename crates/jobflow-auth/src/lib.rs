//! Credentials and request signing for jobflow.
//!
//! This crate turns a snake_case parameter tree into a signed request for
//! the cluster service, using one of two schemes:
//!
//! - Legacy query signing: flattened `Key.member.N` form parameters with a
//!   base64 HMAC-SHA256 signature appended to the body
//! - Version 4 header signing: a camelized JSON body with a derived signing
//!   key and an `Authorization` header
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │  ServiceRequest  │────▶│  RequestSigner   │
//! │  (op + params)   │     │  (creds + host)  │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                      ┌────────────┴────────────┐
//!                      │                         │
//!             ┌────────▼─────────┐      ┌────────▼─────────┐
//!             │  legacy::sign    │      │  SigV4Request    │
//!             │  (form body)     │      │  (JSON body)     │
//!             └────────┬─────────┘      └────────┬─────────┘
//!                      └────────────┬────────────┘
//!                          ┌────────▼─────────┐
//!                          │  SignedRequest   │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use jobflow_auth::{
//!     Credentials, EndpointConfig, Operation, RequestSigner, ServiceRequest, SignatureScheme,
//! };
//!
//! let signer = RequestSigner::new(
//!     Credentials::new("AKIDEXAMPLE", "secret"),
//!     EndpointConfig::default(),
//! );
//! let request = ServiceRequest::new(Operation::DescribeCluster, serde_json::Map::new());
//! let signed = signer.sign(&request, SignatureScheme::V4).unwrap();
//!
//! assert!(signed.header("Authorization").is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod credentials;
mod digest;
pub mod error;
pub mod legacy;
pub mod request;
pub mod signer;
pub mod sigv4;

use serde::Deserialize;

pub use credentials::{Credentials, ACCESS_KEY_ENV, SECRET_KEY_ENV, SESSION_TOKEN_ENV};
pub use error::{AuthError, Result};
pub use request::{Operation, ServiceRequest, SignedRequest};
pub use signer::{RequestSigner, SignatureScheme};
pub use sigv4::SigV4Request;

/// Where requests are sent and how they identify themselves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointConfig {
    /// Service region, e.g. `us-east-1`.
    #[serde(default = "EndpointConfig::default_region")]
    pub region: String,
    /// Service name used in the host and the credential scope.
    #[serde(default = "EndpointConfig::default_service")]
    pub service: String,
    /// Domain the host lives under.
    #[serde(default = "EndpointConfig::default_domain")]
    pub domain: String,
    /// Use HTTPS.
    #[serde(default = "EndpointConfig::default_secure")]
    pub secure: bool,
    /// Sent as `User-Agent` and included in the v4 signature.
    #[serde(default = "EndpointConfig::default_user_agent")]
    pub user_agent: String,
    /// Prefix of the `X-Amz-Target` header.
    #[serde(default = "EndpointConfig::default_target_prefix")]
    pub target_prefix: String,
    /// Overrides the computed URL. The host used for signing is still derived
    /// from region, service and domain.
    #[serde(default)]
    pub url_override: Option<String>,
}

impl EndpointConfig {
    fn default_region() -> String {
        "us-east-1".to_string()
    }

    fn default_service() -> String {
        "elasticmapreduce".to_string()
    }

    fn default_domain() -> String {
        "amazonaws.com".to_string()
    }

    const fn default_secure() -> bool {
        true
    }

    fn default_user_agent() -> String {
        concat!("jobflow/", env!("CARGO_PKG_VERSION")).to_string()
    }

    fn default_target_prefix() -> String {
        "ElasticMapReduce".to_string()
    }

    /// Create a config for `region` with every other field defaulted.
    #[must_use]
    pub fn for_region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    /// Point requests at `url` instead of the computed endpoint.
    #[must_use]
    pub fn with_url_override(mut self, url: impl Into<String>) -> Self {
        self.url_override = Some(url.into());
        self
    }

    /// `<service>.<region>.<domain>`.
    #[must_use]
    pub fn host(&self) -> String {
        format!("{}.{}.{}", self.service, self.region, self.domain)
    }

    /// Full request URL.
    #[must_use]
    pub fn url(&self) -> String {
        if let Some(url) = &self.url_override {
            return url.clone();
        }
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}", self.host())
    }

    /// `X-Amz-Target` value for `operation`.
    #[must_use]
    pub fn target(&self, operation: Operation) -> String {
        format!("{}.{operation}", self.target_prefix)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            region: Self::default_region(),
            service: Self::default_service(),
            domain: Self::default_domain(),
            secure: Self::default_secure(),
            user_agent: Self::default_user_agent(),
            target_prefix: Self::default_target_prefix(),
            url_override: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EndpointConfig::default();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.service, "elasticmapreduce");
        assert!(config.secure);
        assert!(config.user_agent.starts_with("jobflow/"));
    }

    #[test]
    fn config_urls() {
        let config = EndpointConfig::for_region("eu-west-1");
        assert_eq!(config.host(), "elasticmapreduce.eu-west-1.amazonaws.com");
        assert_eq!(config.url(), "https://elasticmapreduce.eu-west-1.amazonaws.com");
        assert_eq!(
            config.target(Operation::RunJobFlow),
            "ElasticMapReduce.RunJobFlow"
        );

        let insecure = EndpointConfig {
            secure: false,
            ..EndpointConfig::default()
        };
        assert_eq!(insecure.url(), "http://elasticmapreduce.us-east-1.amazonaws.com");

        let local = EndpointConfig::default().with_url_override("http://127.0.0.1:8080");
        assert_eq!(local.url(), "http://127.0.0.1:8080");
        assert_eq!(local.host(), "elasticmapreduce.us-east-1.amazonaws.com");
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EndpointConfig = serde_json::from_str(r#"{"region": "ap-south-1"}"#).unwrap();
        assert_eq!(config.region, "ap-south-1");
        assert_eq!(config.target_prefix, "ElasticMapReduce");
        assert_eq!(config.url_override, None);
    }

    #[test]
    fn configuration_errors() {
        assert!(AuthError::MissingAccessKey(ACCESS_KEY_ENV).is_configuration());
        assert!(!AuthError::InvalidKey("x".into()).is_configuration());
    }
}
