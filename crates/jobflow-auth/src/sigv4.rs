//! Header-based request signing (signature version 4).
//!
//! The signature covers a canonical request built from the method, path,
//! signed headers and payload hash. A signing key is derived by chaining
//! HMAC-SHA256 over the date, region, service and the `aws4_request`
//! terminator, seeded with `AWS4` followed by the secret key.
//!
//! Every header value and scope component is derived from the single
//! timestamp captured when a [`SigV4Request`] is created.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use jobflow_core::to_wire_tree;

use crate::credentials::Credentials;
use crate::digest::{hmac_sha256, sha256_hex};
use crate::error::Result;
use crate::request::{Operation, ServiceRequest, SignedRequest};
use crate::EndpointConfig;

/// Signing algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
/// Content type of the JSON payload.
pub const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
/// Final component of every credential scope.
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// A request being signed with signature version 4.
#[derive(Debug, Clone)]
pub struct SigV4Request<'a> {
    credentials: &'a Credentials,
    endpoint: &'a EndpointConfig,
    operation: Operation,
    payload: String,
    timestamp: DateTime<Utc>,
}

impl<'a> SigV4Request<'a> {
    /// Prepare `request` for signing at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn new(
        credentials: &'a Credentials,
        endpoint: &'a EndpointConfig,
        request: &ServiceRequest,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let tree = to_wire_tree(&Value::Object(request.params.clone()), true);
        Ok(Self {
            credentials,
            endpoint,
            operation: request.operation,
            payload: serde_json::to_string(&tree)?,
            timestamp,
        })
    }

    /// The JSON body.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// `YYYYMMDD'T'HHMMSS'Z'` form of the captured timestamp.
    #[must_use]
    pub fn amz_date(&self) -> String {
        self.timestamp.format("%Y%m%dT%H%M%SZ").to_string()
    }

    fn date_stamp(&self) -> String {
        self.timestamp.format("%Y%m%d").to_string()
    }

    /// `<date>/<region>/<service>/aws4_request`.
    #[must_use]
    pub fn credential_scope(&self) -> String {
        format!(
            "{}/{}/{}/{SCOPE_TERMINATOR}",
            self.date_stamp(),
            self.endpoint.region,
            self.endpoint.service
        )
    }

    /// Hex SHA-256 of the payload.
    #[must_use]
    pub fn payload_hash(&self) -> String {
        sha256_hex(self.payload.as_bytes())
    }

    /// Signed headers keyed by lowercase name, in sorted order.
    #[must_use]
    pub fn canonical_headers(&self) -> BTreeMap<&'static str, String> {
        let mut headers = BTreeMap::new();
        headers.insert("content-type", JSON_CONTENT_TYPE.to_string());
        headers.insert("host", self.endpoint.host());
        headers.insert("user-agent", self.endpoint.user_agent.clone());
        headers.insert("x-amz-content-sha256", self.payload_hash());
        headers.insert("x-amz-date", self.amz_date());
        headers.insert("x-amz-target", self.endpoint.target(self.operation));
        if let Some(token) = self.credentials.session_token() {
            headers.insert("x-amz-security-token", token.to_string());
        }
        headers
    }

    /// Semicolon-joined signed header names.
    #[must_use]
    pub fn signed_headers(&self) -> String {
        self.canonical_headers()
            .keys()
            .copied()
            .collect::<Vec<_>>()
            .join(";")
    }

    /// The canonical request: method, path, empty query, header lines, a
    /// blank line, the signed header list and the payload hash.
    #[must_use]
    pub fn canonical_request(&self) -> String {
        let mut lines = vec!["POST".to_string(), "/".to_string(), String::new()];
        lines.extend(
            self.canonical_headers()
                .iter()
                .map(|(name, value)| format!("{name}:{}", value.trim())),
        );
        lines.push(String::new());
        lines.push(self.signed_headers());
        lines.push(self.payload_hash());
        lines.join("\n")
    }

    /// Algorithm, timestamp, scope and hashed canonical request.
    #[must_use]
    pub fn string_to_sign(&self) -> String {
        [
            ALGORITHM.to_string(),
            self.amz_date(),
            self.credential_scope(),
            sha256_hex(self.canonical_request().as_bytes()),
        ]
        .join("\n")
    }

    /// The derived signing key for this request's date, region and service.
    ///
    /// # Errors
    ///
    /// Returns an error if an HMAC key cannot be initialised.
    pub fn signing_key(&self) -> Result<Vec<u8>> {
        derive_signing_key(
            self.credentials.secret_key(),
            &self.date_stamp(),
            &self.endpoint.region,
            &self.endpoint.service,
        )
    }

    /// Hex signature over the string to sign.
    ///
    /// # Errors
    ///
    /// Returns an error if an HMAC key cannot be initialised.
    pub fn signature(&self) -> Result<String> {
        let key = self.signing_key()?;
        Ok(hex::encode(hmac_sha256(
            &key,
            self.string_to_sign().as_bytes(),
        )?))
    }

    /// The `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns an error if an HMAC key cannot be initialised.
    pub fn authorization(&self) -> Result<String> {
        Ok(format!(
            "{ALGORITHM} Credential={}/{}, SignedHeaders={}, Signature={}",
            self.credentials.access_key(),
            self.credential_scope(),
            self.signed_headers(),
            self.signature()?
        ))
    }

    /// Produce the signed request.
    ///
    /// # Errors
    ///
    /// Returns an error if an HMAC key cannot be initialised.
    pub fn into_signed(self) -> Result<SignedRequest> {
        let mut headers = vec![("Authorization".to_string(), self.authorization()?)];
        headers.extend(
            self.canonical_headers()
                .into_iter()
                .map(|(name, value)| (display_name(name).to_string(), value)),
        );

        Ok(SignedRequest {
            operation: self.operation,
            url: self.endpoint.url(),
            headers,
            body: self.payload,
        })
    }
}

/// Chain HMAC-SHA256 over date, region, service and `aws4_request`.
///
/// # Errors
///
/// Returns an error if an HMAC key cannot be initialised.
pub fn derive_signing_key(
    secret_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>> {
    let seed = format!("AWS4{secret_key}");
    let date_key = hmac_sha256(seed.as_bytes(), date_stamp.as_bytes())?;
    let region_key = hmac_sha256(&date_key, region.as_bytes())?;
    let service_key = hmac_sha256(&region_key, service.as_bytes())?;
    hmac_sha256(&service_key, SCOPE_TERMINATOR.as_bytes())
}

fn display_name(name: &str) -> &str {
    match name {
        "content-type" => "Content-Type",
        "host" => "Host",
        "user-agent" => "User-Agent",
        "x-amz-content-sha256" => "X-Amz-Content-SHA256",
        "x-amz-date" => "X-Amz-Date",
        "x-amz-target" => "X-Amz-Target",
        "x-amz-security-token" => "X-Amz-Security-Token",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    const SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
    const PAYLOAD_HASH: &str = "15a9cb5f4cdbc5944490287189a268787a8e4843d230ded729b1fe1d696f6915";

    fn endpoint() -> EndpointConfig {
        EndpointConfig {
            user_agent: "jobflow/test".to_string(),
            ..EndpointConfig::default()
        }
    }

    fn describe() -> ServiceRequest {
        ServiceRequest::new(
            Operation::DescribeCluster,
            json!({"cluster_id": "j-ABC123"}).as_object().cloned().unwrap(),
        )
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap()
    }

    #[test]
    fn signing_key_matches_published_example() {
        let key = derive_signing_key(SECRET, "20120215", "us-east-1", "iam").unwrap();
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn payload_is_camelized_json() {
        let credentials = Credentials::new("AKIDEXAMPLE", SECRET);
        let endpoint = endpoint();
        let request = SigV4Request::new(&credentials, &endpoint, &describe(), timestamp()).unwrap();
        assert_eq!(request.payload(), r#"{"ClusterId":"j-ABC123"}"#);
        assert_eq!(request.payload_hash(), PAYLOAD_HASH);
    }

    #[test]
    fn golden_canonical_request() {
        let credentials = Credentials::new("AKIDEXAMPLE", SECRET);
        let endpoint = endpoint();
        let request = SigV4Request::new(&credentials, &endpoint, &describe(), timestamp()).unwrap();

        let expected = format!(
            "POST\n/\n\n\
             content-type:application/x-amz-json-1.1\n\
             host:elasticmapreduce.us-east-1.amazonaws.com\n\
             user-agent:jobflow/test\n\
             x-amz-content-sha256:{PAYLOAD_HASH}\n\
             x-amz-date:20150830T123600Z\n\
             x-amz-target:ElasticMapReduce.DescribeCluster\n\
             \n\
             content-type;host;user-agent;x-amz-content-sha256;x-amz-date;x-amz-target\n\
             {PAYLOAD_HASH}"
        );
        assert_eq!(request.canonical_request(), expected);
    }

    #[test]
    fn golden_string_to_sign_and_signature() {
        let credentials = Credentials::new("AKIDEXAMPLE", SECRET);
        let endpoint = endpoint();
        let request = SigV4Request::new(&credentials, &endpoint, &describe(), timestamp()).unwrap();

        assert_eq!(
            request.string_to_sign(),
            "AWS4-HMAC-SHA256\n\
             20150830T123600Z\n\
             20150830/us-east-1/elasticmapreduce/aws4_request\n\
             58644d5cd334ba6d15ed3613edf8288313fd3ee309fe2f2eb147922db8fa2312"
        );
        assert_eq!(
            request.signature().unwrap(),
            "46edcc1718c66c0db32519498ecbef5d94462baea48ead1236d9beb000fa7aa6"
        );
    }

    #[test]
    fn session_token_joins_signed_headers() {
        let credentials =
            Credentials::new("AKIDEXAMPLE", SECRET).with_session_token("SESSIONTOKEN");
        let endpoint = endpoint();
        let request = SigV4Request::new(&credentials, &endpoint, &describe(), timestamp()).unwrap();

        assert_eq!(
            request.signed_headers(),
            "content-type;host;user-agent;x-amz-content-sha256;x-amz-date;x-amz-security-token;x-amz-target"
        );
        assert_eq!(
            request.signature().unwrap(),
            "2311f676a3055a0ef9ee3f5cdcd25b1e496fc0e493a020794a00f381b84bce2d"
        );
    }

    #[test]
    fn signed_request_headers_share_one_timestamp() {
        let credentials = Credentials::new("AKIDEXAMPLE", SECRET);
        let endpoint = endpoint();
        let signed = SigV4Request::new(&credentials, &endpoint, &describe(), timestamp())
            .unwrap()
            .into_signed()
            .unwrap();

        assert_eq!(signed.header("X-Amz-Date"), Some("20150830T123600Z"));
        assert_eq!(
            signed.header("Authorization"),
            Some(
                "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/elasticmapreduce/aws4_request, \
                 SignedHeaders=content-type;host;user-agent;x-amz-content-sha256;x-amz-date;x-amz-target, \
                 Signature=46edcc1718c66c0db32519498ecbef5d94462baea48ead1236d9beb000fa7aa6"
            )
        );
        assert_eq!(signed.header("X-Amz-Content-SHA256"), Some(PAYLOAD_HASH));
        assert_eq!(
            signed.header("X-Amz-Target"),
            Some("ElasticMapReduce.DescribeCluster")
        );
        assert_eq!(signed.body, r#"{"ClusterId":"j-ABC123"}"#);
    }
}
