//! Core types and utilities for jobflow.
//!
//! This crate provides the foundational pieces shared by the signer and the
//! cluster builder:
//!
//! - **Identifiers**: the strongly-typed [`JobFlowId`] handed back by the service
//! - **Wire codec**: conversion of snake_case configuration trees into the
//!   query-parameter and camel-cased JSON forms the service expects
//! - **Resources**: validated instance groups, instance fleets, instance type
//!   configs and EBS configurations
//! - **Error types**: [`ValidationError`] raised by every resource setter
//!
//! # Example
//!
//! ```
//! use jobflow_core::{InstanceGroup, InstanceRole};
//!
//! let mut group = InstanceGroup::new();
//! group.set_count(4).unwrap();
//! group.set_role(InstanceRole::Master);
//!
//! // A master group is always a single instance.
//! assert_eq!(group.count(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod error;
pub mod ids;
pub mod resources;

pub use codec::{camelize, flatten_legacy, to_wire_tree, UNCONVERTED_KEY};
pub use error::{Result, ValidationError};
pub use ids::{IdError, JobFlowId};
pub use resources::{
    EbsConfiguration, EbsOptions, InstanceFleet, InstanceFleetConfig, InstanceGroup,
    InstanceGroupConfig, InstanceRole, InstanceTypeConfig, Market, SpotTimeoutAction, VolumeType,
};
