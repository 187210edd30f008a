//! Legacy query-string signing (signature version 2).
//!
//! The parameter tree is flattened into `Key.member.N` pairs, the
//! authentication parameters are appended, and the whole set is signed as a
//! sorted, percent-encoded query string. The signature travels as one more
//! parameter in the form-encoded body.

use std::borrow::Cow;
use std::collections::BTreeMap;

use base64::prelude::*;
use chrono::{DateTime, Utc};

use jobflow_core::flatten_legacy;

use crate::credentials::Credentials;
use crate::digest::hmac_sha256;
use crate::error::Result;
use crate::request::{ServiceRequest, SignedRequest};
use crate::EndpointConfig;

/// Value of the `SignatureVersion` parameter.
pub const SIGNATURE_VERSION: &str = "2";
/// Value of the `SignatureMethod` parameter.
pub const SIGNATURE_METHOD: &str = "HmacSHA256";
/// Content type of the signed body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Percent-encode a value per RFC 3986: everything but `A-Z a-z 0-9 - _ . ~`
/// is escaped, and spaces become `%20`.
#[must_use]
pub fn escape(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Timestamp format of the `Timestamp` parameter.
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S.000Z").to_string()
}

/// The full parameter set that gets signed, sorted by key.
///
/// Later entries overwrite earlier ones, so the authentication parameters
/// always win over anything of the same name in the request.
#[must_use]
pub fn signed_params(
    credentials: &Credentials,
    request: &ServiceRequest,
    timestamp: DateTime<Utc>,
) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert(
        "Operation".to_string(),
        request.operation.as_str().to_string(),
    );
    params.extend(flatten_legacy(&request.params));
    params.insert(
        "AWSAccessKeyId".to_string(),
        credentials.access_key().to_string(),
    );
    params.insert("Timestamp".to_string(), format_timestamp(timestamp));
    params.insert(
        "SignatureVersion".to_string(),
        SIGNATURE_VERSION.to_string(),
    );
    params.insert("SignatureMethod".to_string(), SIGNATURE_METHOD.to_string());
    if let Some(token) = credentials.session_token() {
        params.insert("SecurityToken".to_string(), token.to_string());
    }
    params
}

/// `k=v` pairs, escaped and `&`-joined in key order.
#[must_use]
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", escape(k), escape(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// The string the signature is computed over.
#[must_use]
pub fn string_to_sign(host: &str, canonical_query: &str) -> String {
    format!("POST\n{}\n/\n{canonical_query}", host.to_lowercase())
}

/// Base64 HMAC-SHA256 of the string to sign, percent-encoded.
///
/// # Errors
///
/// Returns an error if the HMAC key cannot be initialised.
pub fn signature(secret_key: &str, string_to_sign: &str) -> Result<String> {
    let mac = hmac_sha256(secret_key.as_bytes(), string_to_sign.as_bytes())?;
    Ok(escape(&BASE64_STANDARD.encode(mac)).into_owned())
}

/// Sign `request` with the legacy scheme.
///
/// # Errors
///
/// Returns an error if the HMAC key cannot be initialised.
pub fn sign(
    credentials: &Credentials,
    endpoint: &EndpointConfig,
    request: &ServiceRequest,
    timestamp: DateTime<Utc>,
) -> Result<SignedRequest> {
    let params = signed_params(credentials, request, timestamp);
    let canonical = canonical_query(&params);
    let encoded = signature(
        credentials.secret_key(),
        &string_to_sign(&endpoint.host(), &canonical),
    )?;

    Ok(SignedRequest {
        operation: request.operation,
        url: endpoint.url(),
        headers: vec![("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string())],
        body: format!("{canonical}&Signature={encoded}"),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::request::Operation;

    fn fixture() -> (Credentials, EndpointConfig, ServiceRequest, DateTime<Utc>) {
        let credentials =
            Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
        let request = ServiceRequest::new(
            Operation::TerminateJobFlows,
            json!({"job_flow_ids": ["j-ABC123"]})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let timestamp = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
        (credentials, EndpointConfig::default(), request, timestamp)
    }

    #[test]
    fn escapes_reserved_characters() {
        assert_eq!(escape("a b+c/d~e*f"), "a%20b%2Bc%2Fd~e%2Af");
        assert_eq!(escape("Safe-_.~09AZaz"), "Safe-_.~09AZaz");
        assert_eq!(escape("="), "%3D");
    }

    #[test]
    fn timestamp_has_fixed_millis() {
        let (_, _, _, timestamp) = fixture();
        assert_eq!(format_timestamp(timestamp), "2015-08-30T12:36:00.000Z");
    }

    #[test]
    fn canonical_query_is_sorted() {
        let (credentials, _, request, timestamp) = fixture();
        let params = signed_params(&credentials, &request, timestamp);
        assert_eq!(
            canonical_query(&params),
            "AWSAccessKeyId=AKIDEXAMPLE\
             &JobFlowIds.member.1=j-ABC123\
             &Operation=TerminateJobFlows\
             &SignatureMethod=HmacSHA256\
             &SignatureVersion=2\
             &Timestamp=2015-08-30T12%3A36%3A00.000Z"
        );
    }

    #[test]
    fn string_to_sign_lowercases_host() {
        assert_eq!(
            string_to_sign("ElasticMapReduce.US-EAST-1.amazonaws.com", "A=1"),
            "POST\nelasticmapreduce.us-east-1.amazonaws.com\n/\nA=1"
        );
    }

    #[test]
    fn golden_signature() {
        let (credentials, endpoint, request, timestamp) = fixture();
        let signed = sign(&credentials, &endpoint, &request, timestamp).unwrap();

        assert_eq!(signed.url, "https://elasticmapreduce.us-east-1.amazonaws.com");
        assert_eq!(signed.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert!(signed
            .body
            .ends_with("&Signature=%2FTZsCG%2BdBNmWYalGsrXpf8jGsZg8B3i8vnrmx4rOTTk%3D"));
    }

    #[test]
    fn session_token_is_signed() {
        let (credentials, _, request, timestamp) = fixture();
        let credentials = credentials.with_session_token("TOKEN");
        let params = signed_params(&credentials, &request, timestamp);
        assert_eq!(params.get("SecurityToken").map(String::as_str), Some("TOKEN"));
    }
}
