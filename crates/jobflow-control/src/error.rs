//! Error types for job flow control.
//!
//! Lower layers chain in through `#[from]`: validation failures from the
//! resource rules, configuration failures from credential resolution, and
//! transport failures from the network boundary.

use jobflow_auth::Operation;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::lifecycle::LifecyclePhase;
use crate::transport::TransportError;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur while configuring, submitting or managing a job flow.
#[derive(Debug, Error)]
pub enum ControlError {
    /// A resource or cluster setting broke a validation rule.
    #[error("validation failed: {0}")]
    Validation(#[from] jobflow_core::ValidationError),

    /// Credentials are missing or a request could not be signed.
    #[error("signing failed: {0}")]
    Auth(#[from] jobflow_auth::AuthError),

    /// The operation is not allowed in the job flow's current phase.
    #[error("cannot {operation}: job flow is {actual}, expected {}", phase_list(.expected))]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// Phases in which the operation is allowed.
        expected: &'static [LifecyclePhase],
        /// The phase the job flow was in.
        actual: LifecyclePhase,
    },

    /// The service rejected the request with a 4xx status.
    #[error("{operation} rejected with status {status}: {message}")]
    RemoteRejection {
        /// The operation that was rejected.
        operation: Operation,
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
        /// The raw response body.
        body: String,
        /// The parameters that were sent.
        params: Map<String, Value>,
    },

    /// The request never got a usable answer.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A successful response did not carry what the operation expects.
    #[error("unexpected {operation} response: {reason}")]
    InvalidResponse {
        /// The operation whose response was malformed.
        operation: Operation,
        /// What was missing or malformed.
        reason: String,
    },

    /// A document could not be converted to request parameters.
    #[error("failed to serialize request: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ControlError {
    /// Returns the closest HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Auth(_) => 401,
            Self::InvalidState { .. } => 409,
            Self::RemoteRejection { status, .. } => *status,
            Self::Transport(_) | Self::InvalidResponse { .. } => 502,
            Self::Serialization(_) => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    ///
    /// Only transport failures qualify. Retrying `run` after a transport
    /// failure can still leave an orphaned cluster if the first attempt
    /// reached the service.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

fn phase_list(phases: &[LifecyclePhase]) -> String {
    let names: Vec<&str> = phases.iter().map(|p| p.as_str()).collect();
    match names.split_last() {
        None => "nothing".to_string(),
        Some((last, [])) => (*last).to_string(),
        Some((last, rest)) => format!("{} or {last}", rest.join(", ")),
    }
}
