//! Capacity-targeted instance fleets spanning several instance types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::resources::type_config::{InstanceTypeConfig, InstanceTypeWireConfig};
use crate::resources::InstanceRole;

/// Maximum number of instance type configs per fleet.
pub const MAX_INSTANCE_TYPES: usize = 5;

/// Inclusive bounds on the spot provisioning timeout, in minutes.
pub const PROVISIONING_TIMEOUT_MINUTES: (i64, i64) = (5, 1440);

/// Allowed spot block durations, in minutes.
pub const VALID_BLOCK_DURATION_MINUTES: [i64; 6] = [60, 120, 180, 240, 300, 360];

/// What to do when spot capacity cannot be provisioned in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpotTimeoutAction {
    /// Fall back to on-demand capacity.
    SwitchToOnDemand,
    /// Give up and terminate the cluster.
    TerminateCluster,
}

impl SpotTimeoutAction {
    /// The wire spelling of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SwitchToOnDemand => "SWITCH_TO_ON_DEMAND",
            Self::TerminateCluster => "TERMINATE_CLUSTER",
        }
    }
}

impl fmt::Display for SpotTimeoutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpotTimeoutAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SWITCH_TO_ON_DEMAND" => Ok(Self::SwitchToOnDemand),
            "TERMINATE_CLUSTER" => Ok(Self::TerminateCluster),
            other => Err(ValidationError::UnknownTimeoutAction(other.to_string())),
        }
    }
}

/// A fleet of instances meeting on-demand and spot capacity targets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstanceFleet {
    role: InstanceRole,
    name: Option<String>,
    target_on_demand_capacity: i64,
    target_spot_capacity: i64,
    instance_type_configs: Vec<InstanceTypeConfig>,
    spot_block_duration_minutes: Option<i64>,
    spot_timeout_action: Option<SpotTimeoutAction>,
    spot_timeout_minutes: Option<i64>,
}

/// Wire form of an instance fleet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceFleetConfig {
    /// Role in the cluster.
    pub instance_fleet_type: InstanceRole,
    /// Instance types the fleet may launch.
    pub instance_type_configs: Vec<InstanceTypeWireConfig>,
    /// Fleet name.
    pub name: String,
    /// On-demand capacity target.
    pub target_on_demand_capacity: i64,
    /// Spot capacity target.
    pub target_spot_capacity: i64,
    /// Spot launch behaviour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_specifications: Option<LaunchSpecifications>,
}

/// Launch specifications for a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchSpecifications {
    /// Spot provisioning behaviour.
    pub spot_specification: SpotSpecification,
}

/// Spot provisioning behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpotSpecification {
    /// Defined duration for spot blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_duration_minutes: Option<i64>,
    /// Action taken when the timeout elapses.
    pub timeout_action: SpotTimeoutAction,
    /// Provisioning timeout.
    pub timeout_duration_minutes: i64,
}

impl InstanceFleet {
    /// An empty CORE fleet with zero capacity targets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Role in the cluster.
    #[must_use]
    pub const fn role(&self) -> InstanceRole {
        self.role
    }

    /// On-demand capacity target.
    #[must_use]
    pub const fn target_on_demand_capacity(&self) -> i64 {
        self.target_on_demand_capacity
    }

    /// Spot capacity target.
    #[must_use]
    pub const fn target_spot_capacity(&self) -> i64 {
        self.target_spot_capacity
    }

    /// Instance type configs added so far.
    #[must_use]
    pub fn instance_type_configs(&self) -> &[InstanceTypeConfig] {
        &self.instance_type_configs
    }

    /// Set the role.
    pub fn set_role(&mut self, role: InstanceRole) {
        self.role = role;
    }

    /// Set the fleet name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    fn check_capacity(&self, capacity: i64) -> Result<()> {
        if capacity <= 0 {
            return Err(ValidationError::FleetCapacityNotPositive(capacity));
        }
        if self.role == InstanceRole::Master && capacity != 1 {
            return Err(ValidationError::MasterFleetCapacity(capacity));
        }
        Ok(())
    }

    /// Set the on-demand capacity target.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is below 1, or is not 1 on a `MASTER` fleet.
    pub fn set_target_on_demand_capacity(&mut self, capacity: i64) -> Result<()> {
        self.check_capacity(capacity)?;
        self.target_on_demand_capacity = capacity;
        Ok(())
    }

    /// Set the spot capacity target.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is below 1, or is not 1 on a `MASTER` fleet.
    pub fn set_target_spot_capacity(&mut self, capacity: i64) -> Result<()> {
        self.check_capacity(capacity)?;
        self.target_spot_capacity = capacity;
        Ok(())
    }

    /// Set the action taken when spot provisioning times out.
    pub fn set_spot_timeout_action(&mut self, action: SpotTimeoutAction) {
        self.spot_timeout_action = Some(action);
    }

    /// Set the spot provisioning timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `minutes` is outside `[5, 1440]`.
    pub fn set_spot_timeout_minutes(&mut self, minutes: i64) -> Result<()> {
        let (min, max) = PROVISIONING_TIMEOUT_MINUTES;
        if !(min..=max).contains(&minutes) {
            return Err(ValidationError::TimeoutMinutesOutOfRange {
                requested: minutes,
                min,
                max,
            });
        }
        self.spot_timeout_minutes = Some(minutes);
        Ok(())
    }

    /// Set the spot block duration.
    ///
    /// # Errors
    ///
    /// Returns an error unless `minutes` is a whole number of hours from 1 to 6.
    pub fn set_spot_block_duration_minutes(&mut self, minutes: i64) -> Result<()> {
        if !VALID_BLOCK_DURATION_MINUTES.contains(&minutes) {
            return Err(ValidationError::InvalidBlockDuration {
                requested: minutes,
                allowed: VALID_BLOCK_DURATION_MINUTES
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        self.spot_block_duration_minutes = Some(minutes);
        Ok(())
    }

    /// Add an instance type the fleet may launch.
    ///
    /// # Errors
    ///
    /// Returns an error if the fleet already has the maximum number of types.
    pub fn add_instance_type_config(&mut self, config: InstanceTypeConfig) -> Result<()> {
        if self.instance_type_configs.len() >= MAX_INSTANCE_TYPES {
            return Err(ValidationError::TooManyInstanceTypes {
                requested: self.instance_type_configs.len() + 1,
                limit: MAX_INSTANCE_TYPES,
            });
        }
        self.instance_type_configs.push(config);
        Ok(())
    }

    fn spot_specification(&self) -> Result<Option<SpotSpecification>> {
        match (
            self.spot_block_duration_minutes,
            self.spot_timeout_action,
            self.spot_timeout_minutes,
        ) {
            (None, None, None) => Ok(None),
            (block_duration_minutes, Some(timeout_action), Some(timeout_duration_minutes)) => {
                Ok(Some(SpotSpecification {
                    block_duration_minutes,
                    timeout_action,
                    timeout_duration_minutes,
                }))
            }
            (_, action, minutes) => Err(ValidationError::IncompleteSpotSpecification {
                timeout_minutes: minutes,
                timeout_action: action.map(|a| a.to_string()),
            }),
        }
    }

    /// The fleet in wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if a `MASTER` fleet does not have exactly one unit of
    /// on-demand or spot capacity (and none of the other), or if a spot
    /// specification is only partially configured.
    pub fn to_wire_config(&self) -> Result<InstanceFleetConfig> {
        if self.role == InstanceRole::Master {
            let mut capacities = [self.target_on_demand_capacity, self.target_spot_capacity];
            capacities.sort_unstable();
            if capacities != [0, 1] {
                return Err(ValidationError::MasterFleetCapacityMix {
                    on_demand: self.target_on_demand_capacity,
                    spot: self.target_spot_capacity,
                });
            }
        }

        let launch_specifications = self
            .spot_specification()?
            .map(|spot_specification| LaunchSpecifications { spot_specification });

        Ok(InstanceFleetConfig {
            instance_fleet_type: self.role,
            instance_type_configs: self
                .instance_type_configs
                .iter()
                .map(InstanceTypeConfig::to_wire_config)
                .collect(),
            name: self
                .name
                .clone()
                .unwrap_or_else(|| self.role.as_str().to_string()),
            target_on_demand_capacity: self.target_on_demand_capacity,
            target_spot_capacity: self.target_spot_capacity,
            launch_specifications,
        })
    }
}
