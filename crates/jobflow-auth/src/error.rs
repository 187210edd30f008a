//! Credential and signing error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while resolving credentials or signing a request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No access key was passed and none was found in the environment.
    #[error("missing access key: pass one explicitly or set {0}")]
    MissingAccessKey(&'static str),

    /// No secret key was passed and none was found in the environment.
    #[error("missing secret key: pass one explicitly or set {0}")]
    MissingSecretKey(&'static str),

    /// The HMAC key could not be initialised.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// The request payload could not be serialized.
    #[error("failed to serialize request payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuthError {
    /// Returns `true` for configuration problems that no retry will fix.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingAccessKey(_) | Self::MissingSecretKey(_))
    }
}
