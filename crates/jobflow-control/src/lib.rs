//! Cluster configuration assembly and job flow lifecycle for jobflow.
//!
//! This crate builds the cluster description from instance topology, steps
//! and bootstrap actions, and drives a job flow through its lifecycle,
//! signing every request and handing it to a [`Transport`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          JobFlow                            │
//! │  ┌─────────────────────┐ ┌─────────────────────────────┐    │
//! │  │ ClusterConfigBuilder│ │   Lifecycle State Machine   │    │
//! │  │ (topology + steps)  │ │ (NotStarted → Terminated)   │    │
//! │  └─────────────────────┘ └─────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        ┌──────────────┐              ┌──────────────┐
//!        │ RequestSigner│─────────────▶│  Transport   │
//!        │ (v2 / v4)    │ SignedRequest│  (reqwest)   │
//!        └──────────────┘              └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use jobflow_auth::{Credentials, EndpointConfig, RequestSigner};
//! use jobflow_control::{CustomJarStep, HttpTransport, JobFlow};
//! use jobflow_core::{InstanceGroup, InstanceRole};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::resolve(None, None, None)?;
//! let signer = RequestSigner::new(credentials, EndpointConfig::default());
//! let mut job_flow = JobFlow::new(signer, HttpTransport::new()?);
//!
//! job_flow.settings_mut()?.release_label = Some("emr-5.0.0".to_string());
//!
//! let mut master = InstanceGroup::new();
//! master.set_role(InstanceRole::Master);
//! job_flow.set_instance_group(master)?;
//!
//! job_flow
//!     .add_step(CustomJarStep::new("s3://bucket/wordcount.jar"))
//!     .await?;
//!
//! let id = job_flow.run().await?;
//! println!("Started cluster: {id}");
//! # Ok(())
//! # }
//! ```
//!
//! # State Machine
//!
//! - `NotStarted` → `Running` (`run`)
//! - `Running` → `Terminated` (`shutdown`)
//!
//! Configuration and bootstrap actions can only change while `NotStarted`.
//! Steps added while `Running` are submitted immediately.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builder;
pub mod error;
pub mod job_flow;
pub mod lifecycle;
pub mod response;
pub mod steps;
pub mod transport;
pub mod types;

pub use builder::{AssembledCluster, ClusterConfigBuilder, StepBatch};
pub use error::{ControlError, Result};
pub use job_flow::JobFlow;
pub use lifecycle::{JobFlowState, LifecyclePhase};
pub use response::parse_error_response;
pub use steps::{BootstrapAction, CustomJarStep, HiveStep, ScriptBootstrapAction, Step};
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
pub use types::{
    ActionOnFailure, Application, ClusterDocument, ClusterSettings, ClusterStatus, Tag,
    WireBootstrapAction, WireStep,
};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::RecordingTransport;
