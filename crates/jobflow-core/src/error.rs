//! Validation errors for cluster resources.
//!
//! Every variant carries the offending value and the constraint it broke, so
//! the message alone is enough to fix the call site.

use thiserror::Error;

/// A result type using `ValidationError`.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Errors raised while building or validating cluster resources.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// One or more of the required EBS options was not supplied.
    #[error("missing EBS parameters: {missing} (size, optimized flag, volume type and volume count are all required)")]
    MissingEbsParameters {
        /// Comma-separated names of the absent options.
        missing: String,
    },

    /// The EBS volume size is zero or negative.
    #[error("EBS size must be greater than 0 to add an EBS volume ({0} requested)")]
    EbsSizeNotPositive(i64),

    /// The EBS volume size reached the maximum allowed size.
    #[error("EBS size must be less than {limit} to add an EBS volume ({requested} requested)")]
    EbsSizeTooLarge {
        /// The requested size in GB.
        requested: i64,
        /// The exclusive upper bound in GB.
        limit: i64,
    },

    /// Fewer than one EBS volume was requested.
    #[error("must have at least one EBS volume ({0} requested)")]
    EbsVolumeCount(i64),

    /// EBS-optimized volumes below the minimum size.
    #[error("EBS size must be at least {minimum} if ebs_optimized ({requested} requested)")]
    EbsOptimizedTooSmall {
        /// The requested size in GB.
        requested: i64,
        /// The minimum size in GB for optimized volumes.
        minimum: i64,
    },

    /// The volume type is not one of the supported types.
    #[error("EBS volume type is not a supported type ({requested} requested, expected one of {allowed})")]
    UnsupportedVolumeType {
        /// The requested volume type.
        requested: String,
        /// The supported types.
        allowed: String,
    },

    /// Provisioned-IOPS volumes were requested without an IOPS value.
    #[error("{0} volume type requires iops to be set")]
    IopsRequired(String),

    /// An IOPS value was given for a volume type that does not take one.
    #[error("iops not supported with {0} volume type")]
    IopsNotSupported(String),

    /// The role is not one of MASTER, CORE or TASK.
    #[error("role must be one of MASTER, CORE or TASK ({0} was requested)")]
    UnknownRole(String),

    /// The market is not one of ON_DEMAND or SPOT.
    #[error("market must be one of ON_DEMAND or SPOT ({0} was requested)")]
    UnknownMarket(String),

    /// An instance group was given fewer than one instance.
    #[error("instance groups require at least 1 instance ({0} requested)")]
    GroupCountNotPositive(i64),

    /// A MASTER instance group was given more than one instance.
    #[error("MASTER instance groups can only have 1 instance ({0} requested)")]
    MasterGroupCount(i64),

    /// A spot bid price that is negative or not a finite number.
    #[error("the bid price for spot instances should be a finite number of at least 0 ({0} requested)")]
    InvalidBidPrice(f64),

    /// A fleet target capacity was zero or negative.
    #[error("instance fleets require capacity at least 1 ({0} requested)")]
    FleetCapacityNotPositive(i64),

    /// A MASTER fleet target capacity other than 1.
    #[error("MASTER instance fleets can only have capacity 1 ({0} requested)")]
    MasterFleetCapacity(i64),

    /// A MASTER fleet whose combined capacities are not exactly one on-demand or one spot.
    #[error("capacity must be set to one for MASTER instance fleet (on-demand {on_demand}, spot {spot} requested; expected exactly one of them to be 1 and the other 0)")]
    MasterFleetCapacityMix {
        /// Target on-demand capacity at assembly time.
        on_demand: i64,
        /// Target spot capacity at assembly time.
        spot: i64,
    },

    /// The spot timeout action is not one of the allowed actions.
    #[error("timeout action must be one of SWITCH_TO_ON_DEMAND, TERMINATE_CLUSTER ({0} was requested)")]
    UnknownTimeoutAction(String),

    /// The spot provisioning timeout is outside the allowed range.
    #[error("timeout minutes must be in [{min}, {max}] ({requested} was requested)")]
    TimeoutMinutesOutOfRange {
        /// The requested timeout.
        requested: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// The spot block duration is not one of the allowed durations.
    #[error("block duration minutes must be one of {allowed} ({requested} was requested)")]
    InvalidBlockDuration {
        /// The requested duration.
        requested: i64,
        /// The allowed durations.
        allowed: String,
    },

    /// A spot specification was partially configured.
    #[error("provisioning timeout and timeout action are required for spot fleet launch specification (timeout minutes: {timeout_minutes:?}, timeout action: {timeout_action:?})")]
    IncompleteSpotSpecification {
        /// The configured timeout, if any.
        timeout_minutes: Option<i64>,
        /// The configured action, if any.
        timeout_action: Option<String>,
    },

    /// Too many instance type configs on one fleet.
    #[error("only {limit} instance types allowed per instance fleet ({requested} requested)")]
    TooManyInstanceTypes {
        /// The number of configs the add would produce.
        requested: usize,
        /// The maximum allowed.
        limit: usize,
    },

    /// Instance groups and instance fleets were mixed in one cluster.
    #[error("cannot add instance {requested} to a cluster already configured with instance {configured}; groups and fleets are mutually exclusive")]
    TopologyConflict {
        /// The topology the call tried to use.
        requested: &'static str,
        /// The topology already configured.
        configured: &'static str,
    },

    /// No instance groups or fleets were configured.
    #[error("no instance groups or instance fleets configured; at least a MASTER group or fleet is required")]
    MissingTopology,

    /// Instances were configured but none with the MASTER role.
    #[error("no MASTER instance {0} configured; a MASTER role is required")]
    MissingMasterRole(&'static str),
}

