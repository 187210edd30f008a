//! The job flow: a cluster builder bound to a signer and a transport.
//!
//! Before `run` every change is local. `run` submits the assembled document
//! once and keeps the cluster id; from then on steps are submitted
//! incrementally and configuration is frozen.

use jobflow_auth::{Operation, RequestSigner, ServiceRequest, SignatureScheme};
use jobflow_core::{InstanceFleet, InstanceGroup, JobFlowId};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::builder::{to_params, ClusterConfigBuilder};
use crate::error::{ControlError, Result};
use crate::lifecycle::{
    self, JobFlowState, LifecyclePhase, ACCEPTS_STEPS, CONFIGURABLE, DESCRIBABLE,
};
use crate::response::{parse_cluster_status, parse_error_response, parse_job_flow_id};
use crate::steps::{BootstrapAction, Step};
use crate::transport::{Transport, TransportError, TransportResponse};
use crate::types::{ClusterSettings, ClusterStatus, WireStep};

#[derive(Serialize)]
struct AddStepsParams<'a> {
    job_flow_id: &'a str,
    steps: &'a [WireStep],
}

#[derive(Serialize)]
struct TerminateParams<'a> {
    job_flow_ids: [&'a str; 1],
}

#[derive(Serialize)]
struct DescribeParams<'a> {
    cluster_id: &'a str,
}

/// A job flow and its lifecycle.
#[derive(Debug)]
pub struct JobFlow<T> {
    builder: ClusterConfigBuilder,
    signer: RequestSigner,
    transport: T,
    state: JobFlowState,
}

impl<T: Transport> JobFlow<T> {
    /// Create a job flow with default settings.
    #[must_use]
    pub fn new(signer: RequestSigner, transport: T) -> Self {
        Self::with_builder(ClusterConfigBuilder::new(), signer, transport)
    }

    /// Create a job flow from a prepared builder.
    #[must_use]
    pub const fn with_builder(
        builder: ClusterConfigBuilder,
        signer: RequestSigner,
        transport: T,
    ) -> Self {
        Self {
            builder,
            signer,
            transport,
            state: JobFlowState::NotStarted,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &JobFlowState {
        &self.state
    }

    /// The cluster id, once running.
    #[must_use]
    pub const fn job_flow_id(&self) -> Option<&JobFlowId> {
        self.state.job_flow_id()
    }

    /// The underlying builder.
    #[must_use]
    pub const fn builder(&self) -> &ClusterConfigBuilder {
        &self.builder
    }

    /// The transport requests are sent through.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Signing scheme for every request of this job flow.
    #[must_use]
    pub const fn scheme(&self) -> SignatureScheme {
        SignatureScheme::for_release_label(self.builder.settings().release_label.is_some())
    }

    /// Mutable access to the cluster settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once the job flow has been run.
    pub fn settings_mut(&mut self) -> Result<&mut ClusterSettings> {
        lifecycle::require("configure", self.state.phase(), CONFIGURABLE)?;
        Ok(self.builder.settings_mut())
    }

    /// Add an instance group.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once the job flow has been run, or
    /// `TopologyConflict` if fleets are configured.
    pub fn set_instance_group(&mut self, group: InstanceGroup) -> Result<()> {
        lifecycle::require("set instance group", self.state.phase(), CONFIGURABLE)?;
        self.builder.set_instance_group(group)
    }

    /// Add an instance fleet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once the job flow has been run, or
    /// `TopologyConflict` if groups are configured.
    pub fn set_instance_fleet(&mut self, fleet: InstanceFleet) -> Result<()> {
        lifecycle::require("set instance fleet", self.state.phase(), CONFIGURABLE)?;
        self.builder.set_instance_fleet(fleet)
    }

    /// Add a bootstrap action.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once the job flow has been run.
    pub fn add_bootstrap_action(&mut self, action: impl BootstrapAction + 'static) -> Result<()> {
        lifecycle::require("add bootstrap action", self.state.phase(), CONFIGURABLE)?;
        self.builder.add_bootstrap_action(Box::new(action));
        Ok(())
    }

    /// Add one step. See [`JobFlow::add_steps`].
    ///
    /// # Errors
    ///
    /// See [`JobFlow::add_steps`].
    pub async fn add_step(&mut self, step: impl Step + 'static) -> Result<()> {
        self.add_steps(vec![Box::new(step)]).await
    }

    /// Add steps.
    ///
    /// Before `run` the steps are queued for the initial submission. While
    /// running they are submitted right away, preceded by any installation
    /// steps the cluster has not seen yet. An empty list is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` after shutdown, or a signing, rejection or
    /// transport error from the incremental submission.
    pub async fn add_steps(&mut self, steps: Vec<Box<dyn Step>>) -> Result<()> {
        lifecycle::require("add steps", self.state.phase(), ACCEPTS_STEPS)?;

        if steps.is_empty() {
            return Ok(());
        }

        let Some(id) = self.state.job_flow_id().cloned() else {
            tracing::debug!(count = steps.len(), "Queued steps");
            for step in steps {
                self.builder.add_step(step);
            }
            return Ok(());
        };

        let batch = self.builder.expand_steps(&steps);
        let params = to_params(&AddStepsParams {
            job_flow_id: id.as_str(),
            steps: &batch.steps,
        })?;

        self.send(Operation::AddJobFlowSteps, params).await?;
        self.builder.commit_installed(&batch.newly_installed);

        tracing::info!(
            job_flow_id = %id,
            steps = batch.steps.len(),
            "Submitted steps"
        );
        Ok(())
    }

    /// Assemble and submit the cluster, moving to `Running`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if already run, a validation error if the
    /// configuration is incomplete, or a signing, rejection, transport or
    /// response error from the submission.
    pub async fn run(&mut self) -> Result<JobFlowId> {
        lifecycle::validate_transition("run", self.state.phase(), LifecyclePhase::Running)?;

        let assembled = self.builder.assemble()?;
        let params = assembled.to_params()?;

        tracing::info!(
            name = %assembled.document.name,
            scheme = self.scheme().as_str(),
            "Running job flow"
        );

        let response = self.send(Operation::RunJobFlow, params).await?;
        let raw = parse_job_flow_id(&response.body).ok_or_else(|| {
            ControlError::InvalidResponse {
                operation: Operation::RunJobFlow,
                reason: "no JobFlowId in response".to_string(),
            }
        })?;
        let id = JobFlowId::parse(&raw).map_err(|e| ControlError::InvalidResponse {
            operation: Operation::RunJobFlow,
            reason: e.to_string(),
        })?;

        self.builder.commit_installed(&assembled.newly_installed);
        self.state = JobFlowState::Running(id.clone());

        tracing::info!(job_flow_id = %id, "Job flow running");
        Ok(id)
    }

    /// Terminate the cluster, moving to `Terminated`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless running, or a signing, rejection or
    /// transport error from the request.
    pub async fn shutdown(&mut self) -> Result<()> {
        let id = self.started_id(
            "shut down",
            lifecycle::valid_sources(LifecyclePhase::Terminated),
        )?;

        let params = to_params(&TerminateParams {
            job_flow_ids: [id.as_str()],
        })?;
        self.send(Operation::TerminateJobFlows, params).await?;

        tracing::info!(job_flow_id = %id, "Job flow terminated");
        self.state = JobFlowState::Terminated(id);
        Ok(())
    }

    /// Fetch the cluster's current status.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before `run`, or a signing, rejection,
    /// transport or response error from the request.
    pub async fn status(&self) -> Result<ClusterStatus> {
        let id = self.started_id("describe", DESCRIBABLE)?;

        let params = to_params(&DescribeParams {
            cluster_id: id.as_str(),
        })?;
        let response = self.send(Operation::DescribeCluster, params).await?;

        parse_cluster_status(&response.body).ok_or_else(|| ControlError::InvalidResponse {
            operation: Operation::DescribeCluster,
            reason: "no cluster id, name and state in response".to_string(),
        })
    }

    fn started_id(
        &self,
        operation: &'static str,
        allowed: &'static [LifecyclePhase],
    ) -> Result<JobFlowId> {
        lifecycle::require(operation, self.state.phase(), allowed)?;
        self.state
            .job_flow_id()
            .cloned()
            .ok_or(ControlError::InvalidState {
                operation,
                expected: allowed,
                actual: self.state.phase(),
            })
    }

    async fn send(
        &self,
        operation: Operation,
        params: Map<String, Value>,
    ) -> Result<TransportResponse> {
        let request = ServiceRequest::new(operation, params);
        let signed = self.signer.sign(&request, self.scheme())?;
        let response = self.transport.post(&signed).await?;

        if response.is_success() {
            return Ok(response);
        }

        if response.is_client_error() {
            let message = parse_error_response(&response.body);
            tracing::warn!(
                operation = %operation,
                status = response.status,
                message = %message,
                "Request rejected"
            );
            return Err(ControlError::RemoteRejection {
                operation,
                status: response.status,
                message,
                body: response.body,
                params: request.params,
            });
        }

        tracing::error!(
            operation = %operation,
            status = response.status,
            "Unexpected response status"
        );
        Err(TransportError::UnexpectedStatus {
            status: response.status,
            body: response.body,
        }
        .into())
    }
}
