//! Access credentials and their discovery.
//!
//! Keys are taken from explicit arguments first and the environment second.
//! A missing access or secret key is fatal; a missing session token is not.

use std::fmt;

use crate::error::{AuthError, Result};

/// Environment variable consulted for the access key.
pub const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable consulted for the secret key.
pub const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
/// Environment variable consulted for the session token.
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// Immutable signing credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create credentials from an access and secret key.
    #[must_use]
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token: None,
        }
    }

    /// Attach a temporary session token.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Resolve credentials from explicit values, falling back to the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `MissingAccessKey` or `MissingSecretKey` if a key is found in
    /// neither place.
    pub fn resolve(
        access_key: Option<String>,
        secret_key: Option<String>,
        session_token: Option<String>,
    ) -> Result<Self> {
        Self::resolve_with(access_key, secret_key, session_token, |name| {
            std::env::var(name).ok()
        })
    }

    /// Resolve credentials from explicit values, falling back to `lookup`.
    ///
    /// Empty strings count as absent.
    ///
    /// # Errors
    ///
    /// Returns `MissingAccessKey` or `MissingSecretKey` if a key is found in
    /// neither place.
    pub fn resolve_with<F>(
        access_key: Option<String>,
        secret_key: Option<String>,
        session_token: Option<String>,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |explicit: Option<String>, name: &str| {
            explicit
                .filter(|v| !v.is_empty())
                .or_else(|| lookup(name).filter(|v| !v.is_empty()))
        };

        let access_key =
            pick(access_key, ACCESS_KEY_ENV).ok_or(AuthError::MissingAccessKey(ACCESS_KEY_ENV))?;
        let secret_key =
            pick(secret_key, SECRET_KEY_ENV).ok_or(AuthError::MissingSecretKey(SECRET_KEY_ENV))?;
        let session_token = pick(session_token, SESSION_TOKEN_ENV);

        tracing::debug!(
            access_key = %access_key,
            session_token = session_token.is_some(),
            "Resolved credentials"
        );

        Ok(Self {
            access_key,
            secret_key,
            session_token,
        })
    }

    /// The access key id.
    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// The secret key.
    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// The session token, if any.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
