//! Homogeneous, role-based instance groups.

use serde::Serialize;

use crate::error::{Result, ValidationError};
use crate::resources::ebs::{EbsConfiguration, EbsOptions, MAX_GROUP_VOLUME_SIZE_GB};
use crate::resources::{check_bid_price, InstanceRole, Market};

const DEFAULT_INSTANCE_TYPE: &str = "m1.small";

/// A pool of identical instances sharing one role.
///
/// A `MASTER` group always has exactly one instance: switching the role to
/// `MASTER` resets the count to 1, and setting any other count on a master
/// group is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceGroup {
    count: i64,
    instance_type: String,
    role: InstanceRole,
    market: Market,
    bid_price: Option<f64>,
    name: Option<String>,
    ebs: Option<EbsConfiguration>,
}

/// Wire form of an instance group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceGroupConfig {
    /// Purchasing market.
    pub market: Market,
    /// Number of instances.
    pub instance_count: i64,
    /// Instance type, e.g. `m1.small`.
    pub instance_type: String,
    /// Role in the cluster.
    pub instance_role: InstanceRole,
    /// Group name.
    pub name: String,
    /// Attached EBS volumes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebs_configuration: Option<EbsConfiguration>,
    /// Spot bid, present only for spot groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_price: Option<f64>,
}

impl Default for InstanceGroup {
    fn default() -> Self {
        Self {
            count: 1,
            instance_type: DEFAULT_INSTANCE_TYPE.to_string(),
            role: InstanceRole::Core,
            market: Market::OnDemand,
            bid_price: None,
            name: None,
            ebs: None,
        }
    }
}

impl InstanceGroup {
    /// A single on-demand `m1.small` CORE instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instances.
    #[must_use]
    pub const fn count(&self) -> i64 {
        self.count
    }

    /// Instance type.
    #[must_use]
    pub fn instance_type(&self) -> &str {
        &self.instance_type
    }

    /// Role in the cluster.
    #[must_use]
    pub const fn role(&self) -> InstanceRole {
        self.role
    }

    /// Purchasing market.
    #[must_use]
    pub const fn market(&self) -> Market {
        self.market
    }

    /// Spot bid, if this is a spot group.
    #[must_use]
    pub const fn bid_price(&self) -> Option<f64> {
        self.bid_price
    }

    /// Explicit group name, if set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Attached EBS configuration, if set.
    #[must_use]
    pub const fn ebs(&self) -> Option<&EbsConfiguration> {
        self.ebs.as_ref()
    }

    /// Set the number of instances.
    ///
    /// # Errors
    ///
    /// Returns an error if `count` is below 1, or is not 1 on a `MASTER` group.
    pub fn set_count(&mut self, count: i64) -> Result<()> {
        if count <= 0 {
            return Err(ValidationError::GroupCountNotPositive(count));
        }
        if self.role == InstanceRole::Master && count != 1 {
            return Err(ValidationError::MasterGroupCount(count));
        }
        self.count = count;
        Ok(())
    }

    /// Set the role. Switching to `MASTER` forces the count to 1.
    pub fn set_role(&mut self, role: InstanceRole) {
        if role == InstanceRole::Master {
            self.count = 1;
        }
        self.role = role;
    }

    /// Set the instance type.
    pub fn set_instance_type(&mut self, instance_type: impl Into<String>) {
        self.instance_type = instance_type.into();
    }

    /// Set the group name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Attach EBS volumes to every instance in the group.
    ///
    /// # Errors
    ///
    /// Returns an error if the option set is incomplete or breaks a volume
    /// rule; instance group volumes must be smaller than 1024 GB.
    pub fn set_ebs(&mut self, options: &EbsOptions) -> Result<()> {
        self.ebs = Some(EbsConfiguration::from_options_with_limit(
            options,
            MAX_GROUP_VOLUME_SIZE_GB,
        )?);
        Ok(())
    }

    /// Buy the group's capacity on the spot market.
    ///
    /// # Errors
    ///
    /// Returns an error if `bid_price` is negative, infinite or NaN.
    pub fn set_spot_instances(&mut self, bid_price: f64) -> Result<()> {
        self.bid_price = Some(check_bid_price(bid_price)?);
        self.market = Market::Spot;
        Ok(())
    }

    /// Buy the group's capacity on demand, dropping any bid.
    pub fn set_on_demand_instances(&mut self) {
        self.bid_price = None;
        self.market = Market::OnDemand;
    }

    /// The group in wire form. Unnamed groups are named after their role.
    #[must_use]
    pub fn to_wire_config(&self) -> InstanceGroupConfig {
        InstanceGroupConfig {
            market: self.market,
            instance_count: self.count,
            instance_type: self.instance_type.clone(),
            instance_role: self.role,
            name: self
                .name
                .clone()
                .unwrap_or_else(|| self.role.as_str().to_string()),
            ebs_configuration: self.ebs.clone(),
            bid_price: match self.market {
                Market::Spot => self.bid_price,
                Market::OnDemand => None,
            },
        }
    }
}
