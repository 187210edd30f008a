//! Unsigned and signed request envelopes.

use std::fmt;

use serde_json::{Map, Value};

/// Service operations this client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a cluster and queue its initial steps.
    RunJobFlow,
    /// Queue steps on a running cluster.
    AddJobFlowSteps,
    /// Shut a cluster down.
    TerminateJobFlows,
    /// Fetch a cluster's current status.
    DescribeCluster,
}

impl Operation {
    /// The operation name as the service spells it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunJobFlow => "RunJobFlow",
            Self::AddJobFlowSteps => "AddJobFlowSteps",
            Self::TerminateJobFlows => "TerminateJobFlows",
            Self::DescribeCluster => "DescribeCluster",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation and its snake_case parameter tree, ready to be signed.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    /// The operation to invoke.
    pub operation: Operation,
    /// Parameters in snake_case, converted to wire form at signing time.
    pub params: Map<String, Value>,
}

impl ServiceRequest {
    /// Create a request.
    #[must_use]
    pub const fn new(operation: Operation, params: Map<String, Value>) -> Self {
        Self { operation, params }
    }
}

/// A fully signed request, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// The operation being invoked.
    pub operation: Operation,
    /// Target URL.
    pub url: String,
    /// Headers in the order they were produced.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: String,
}

impl SignedRequest {
    /// Look up a header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
