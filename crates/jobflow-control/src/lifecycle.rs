//! Job flow lifecycle state machine.
//!
//! A job flow is configured locally, submitted once, and shut down once.
//! The cluster id returned by the service is the only thing distinguishing
//! a started job flow from one that is still being configured.
//!
//! # State Machine
//!
//! ```text
//!     ┌──────────────┐   run()    ┌──────────────┐  shutdown()  ┌──────────────┐
//!     │  NotStarted  │───────────▶│   Running    │─────────────▶│  Terminated  │
//!     └──────────────┘            └──────────────┘              └──────────────┘
//!       configure                    add_step                     status
//!       add_bootstrap_action         status
//!       add_step (queued)
//! ```

use std::fmt;

use jobflow_core::JobFlowId;

use crate::error::{ControlError, Result};

/// Lifecycle phase of a job flow, without its cluster id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// Configuration is still being assembled locally.
    NotStarted,
    /// The cluster has been created.
    Running,
    /// The cluster has been shut down.
    Terminated,
}

impl LifecyclePhase {
    /// The phase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::Running => "Running",
            Self::Terminated => "Terminated",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of a job flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobFlowState {
    /// Not yet submitted.
    #[default]
    NotStarted,
    /// Submitted; carries the id the service assigned.
    Running(JobFlowId),
    /// Shut down; keeps the id for status queries.
    Terminated(JobFlowId),
}

impl JobFlowState {
    /// The phase of this state.
    #[must_use]
    pub const fn phase(&self) -> LifecyclePhase {
        match self {
            Self::NotStarted => LifecyclePhase::NotStarted,
            Self::Running(_) => LifecyclePhase::Running,
            Self::Terminated(_) => LifecyclePhase::Terminated,
        }
    }

    /// The cluster id, once the job flow has been submitted.
    #[must_use]
    pub const fn job_flow_id(&self) -> Option<&JobFlowId> {
        match self {
            Self::NotStarted => None,
            Self::Running(id) | Self::Terminated(id) => Some(id),
        }
    }
}

/// Check if a phase transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: LifecyclePhase, to: LifecyclePhase) -> bool {
    use LifecyclePhase::{NotStarted, Running, Terminated};

    matches!((from, to), (NotStarted, Running) | (Running, Terminated))
}

/// Validates a phase transition and returns the target phase if valid.
///
/// # Errors
///
/// Returns `ControlError::InvalidState` naming the phase the operation
/// requires if the transition is not allowed.
pub fn validate_transition(
    operation: &'static str,
    from: LifecyclePhase,
    to: LifecyclePhase,
) -> Result<LifecyclePhase> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(ControlError::InvalidState {
            operation,
            expected: valid_sources(to),
            actual: from,
        })
    }
}

/// Fails unless `actual` is one of `allowed`.
///
/// # Errors
///
/// Returns `ControlError::InvalidState` if `actual` is not allowed.
pub fn require(
    operation: &'static str,
    actual: LifecyclePhase,
    allowed: &'static [LifecyclePhase],
) -> Result<()> {
    if allowed.contains(&actual) {
        Ok(())
    } else {
        Err(ControlError::InvalidState {
            operation,
            expected: allowed,
            actual,
        })
    }
}

/// Phases from which `to` can be reached.
#[must_use]
pub const fn valid_sources(to: LifecyclePhase) -> &'static [LifecyclePhase] {
    match to {
        LifecyclePhase::NotStarted => &[],
        LifecyclePhase::Running => &[LifecyclePhase::NotStarted],
        LifecyclePhase::Terminated => &[LifecyclePhase::Running],
    }
}

/// Phases in which local configuration may change.
pub const CONFIGURABLE: &[LifecyclePhase] = &[LifecyclePhase::NotStarted];

/// Phases in which steps may be added.
pub const ACCEPTS_STEPS: &[LifecyclePhase] = &[LifecyclePhase::NotStarted, LifecyclePhase::Running];

/// Phases in which the cluster can be described.
pub const DESCRIBABLE: &[LifecyclePhase] = &[LifecyclePhase::Running, LifecyclePhase::Terminated];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use LifecyclePhase::*;

        assert!(is_valid_transition(NotStarted, Running));
        assert!(is_valid_transition(Running, Terminated));
    }

    #[test]
    fn invalid_transitions() {
        use LifecyclePhase::*;

        // No second run
        assert!(!is_valid_transition(Running, Running));
        assert!(!is_valid_transition(Terminated, Running));
        // No shutdown before run
        assert!(!is_valid_transition(NotStarted, Terminated));
        // No restart
        assert!(!is_valid_transition(Terminated, NotStarted));
        assert!(!is_valid_transition(Terminated, Terminated));
    }

    #[test]
    fn transition_error_names_expected_phase() {
        let err = validate_transition("run", LifecyclePhase::Running, LifecyclePhase::Running)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot run: job flow is Running, expected NotStarted"
        );
    }

    #[test]
    fn require_lists_allowed_phases() {
        assert!(require("add step", LifecyclePhase::Running, ACCEPTS_STEPS).is_ok());

        let err = require("add step", LifecyclePhase::Terminated, ACCEPTS_STEPS).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot add step: job flow is Terminated, expected NotStarted or Running"
        );
    }

    #[test]
    fn state_carries_id_once_started() {
        let id = JobFlowId::parse("j-ABC123").unwrap();
        assert_eq!(JobFlowState::NotStarted.job_flow_id(), None);
        assert_eq!(JobFlowState::Running(id.clone()).job_flow_id(), Some(&id));
        assert_eq!(
            JobFlowState::Terminated(id.clone()).phase(),
            LifecyclePhase::Terminated
        );
    }
}
