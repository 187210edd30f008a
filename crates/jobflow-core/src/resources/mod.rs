//! Instance topology resources and their validation rules.
//!
//! Every setter validates its input and leaves the resource untouched on
//! failure. Rules that span several fields (MASTER fleet capacity, spot
//! launch specifications) are checked when the wire form is produced.

pub mod ebs;
pub mod fleet;
pub mod group;
pub mod type_config;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use ebs::{EbsConfiguration, EbsOptions, VolumeType};
pub use fleet::{InstanceFleet, InstanceFleetConfig, SpotTimeoutAction};
pub use group::{InstanceGroup, InstanceGroupConfig};
pub use type_config::InstanceTypeConfig;

/// Spot bids must be finite and not negative.
pub(crate) fn check_bid_price(bid_price: f64) -> Result<f64, ValidationError> {
    if bid_price.is_finite() && bid_price >= 0.0 {
        Ok(bid_price)
    } else {
        Err(ValidationError::InvalidBidPrice(bid_price))
    }
}

/// Role an instance group or fleet plays in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceRole {
    /// The single node running the cluster's coordinating services.
    Master,
    /// Nodes running tasks and storing data.
    #[default]
    Core,
    /// Nodes running tasks only.
    Task,
}

impl InstanceRole {
    /// All roles, in the order the service documents them.
    pub const ALL: [Self; 3] = [Self::Master, Self::Core, Self::Task];

    /// The wire spelling of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Master => "MASTER",
            Self::Core => "CORE",
            Self::Task => "TASK",
        }
    }
}

impl fmt::Display for InstanceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownRole(s.to_string()))
    }
}

/// Purchasing market for instance group capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Market {
    /// Regular on-demand pricing.
    #[default]
    OnDemand,
    /// Spot capacity bought with a bid price.
    Spot,
}

impl Market {
    /// The wire spelling of the market.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnDemand => "ON_DEMAND",
            Self::Spot => "SPOT",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ON_DEMAND" => Ok(Self::OnDemand),
            "SPOT" => Ok(Self::Spot),
            other => Err(ValidationError::UnknownMarket(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_and_display() {
        for role in InstanceRole::ALL {
            assert_eq!(role.as_str().parse::<InstanceRole>().unwrap(), role);
            assert_eq!(role.to_string(), role.as_str());
        }
    }

    #[test]
    fn unknown_role_names_the_value() {
        let err = "_".parse::<InstanceRole>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "role must be one of MASTER, CORE or TASK (_ was requested)"
        );
    }

    #[test]
    fn market_parse() {
        assert_eq!("SPOT".parse::<Market>().unwrap(), Market::Spot);
        assert_eq!("ON_DEMAND".parse::<Market>().unwrap(), Market::OnDemand);
        assert!(matches!(
            "RESERVED".parse::<Market>(),
            Err(ValidationError::UnknownMarket(m)) if m == "RESERVED"
        ));
    }

    #[test]
    fn enums_serialize_in_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&InstanceRole::Master).unwrap(),
            "\"MASTER\""
        );
        assert_eq!(
            serde_json::to_string(&Market::OnDemand).unwrap(),
            "\"ON_DEMAND\""
        );
    }
}
