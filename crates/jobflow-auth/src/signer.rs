//! Scheme selection and the signing entry point.

use chrono::{DateTime, Utc};

use crate::credentials::Credentials;
use crate::error::Result;
use crate::legacy;
use crate::request::{ServiceRequest, SignedRequest};
use crate::sigv4::SigV4Request;
use crate::EndpointConfig;

/// Which signing scheme to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureScheme {
    /// Query-string signing with a form-encoded body (version 2).
    #[default]
    Legacy,
    /// Header signing with a JSON body (version 4).
    V4,
}

impl SignatureScheme {
    /// Clusters launched from a release label speak the JSON protocol; older
    /// AMI-versioned clusters use the legacy query protocol.
    #[must_use]
    pub const fn for_release_label(has_release_label: bool) -> Self {
        if has_release_label {
            Self::V4
        } else {
            Self::Legacy
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "v2",
            Self::V4 => "v4",
        }
    }
}

/// Signs requests for one endpoint with one set of credentials.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: Credentials,
    endpoint: EndpointConfig,
}

impl RequestSigner {
    /// Create a signer.
    #[must_use]
    pub const fn new(credentials: Credentials, endpoint: EndpointConfig) -> Self {
        Self {
            credentials,
            endpoint,
        }
    }

    /// The endpoint requests are signed for.
    #[must_use]
    pub const fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// The credentials requests are signed with.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Sign `request` with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized or an HMAC key
    /// cannot be initialised.
    pub fn sign(&self, request: &ServiceRequest, scheme: SignatureScheme) -> Result<SignedRequest> {
        self.sign_at(request, scheme, Utc::now())
    }

    /// Sign `request` as of `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized or an HMAC key
    /// cannot be initialised.
    pub fn sign_at(
        &self,
        request: &ServiceRequest,
        scheme: SignatureScheme,
        timestamp: DateTime<Utc>,
    ) -> Result<SignedRequest> {
        tracing::debug!(
            operation = %request.operation,
            scheme = scheme.as_str(),
            host = %self.endpoint.host(),
            "Signing request"
        );

        match scheme {
            SignatureScheme::Legacy => {
                legacy::sign(&self.credentials, &self.endpoint, request, timestamp)
            }
            SignatureScheme::V4 => {
                SigV4Request::new(&self.credentials, &self.endpoint, request, timestamp)?
                    .into_signed()
            }
        }
    }
}
