//! Identifier types for jobflow.
//!
//! The service assigns a job flow identifier once a cluster has been created.
//! Holding a [`JobFlowId`] is what distinguishes a started job flow from one
//! that is still being configured.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier the service hands back for a created cluster.
///
/// Service identifiers usually look like `j-2AXXXXXXGAPLF`, but the format
/// is not checked: whatever the service returns is kept verbatim.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobFlowId(String);

impl JobFlowId {
    /// Parse a `JobFlowId`.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty or only whitespace.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.trim().is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(s.to_string()))
    }

    /// Return the identifier as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for JobFlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobFlowId({})", self.0)
    }
}

impl fmt::Display for JobFlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobFlowId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for JobFlowId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<JobFlowId> for String {
    fn from(id: JobFlowId) -> Self {
        id.0
    }
}

impl AsRef<str> for JobFlowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier is empty or only whitespace.
    #[error("job flow id must not be empty")]
    Empty,
}
