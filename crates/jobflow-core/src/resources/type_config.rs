//! Weighted instance types within an instance fleet.

use serde::Serialize;

use crate::error::Result;
use crate::resources::check_bid_price;
use crate::resources::ebs::{EbsConfiguration, EbsOptions};

const DEFAULT_INSTANCE_TYPE: &str = "m1.small";

/// One instance type a fleet may launch to meet its capacity targets.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceTypeConfig {
    instance_type: String,
    bid_price: Option<f64>,
    weighted_capacity: Option<i64>,
    ebs: Option<EbsConfiguration>,
}

/// Wire form of an instance type config.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceTypeWireConfig {
    /// Instance type.
    pub instance_type: String,
    /// Attached EBS volumes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebs_configuration: Option<EbsConfiguration>,
    /// Spot bid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_price: Option<f64>,
    /// Capacity units one instance of this type contributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_capacity: Option<i64>,
}

impl Default for InstanceTypeConfig {
    fn default() -> Self {
        Self {
            instance_type: DEFAULT_INSTANCE_TYPE.to_string(),
            bid_price: None,
            weighted_capacity: None,
            ebs: None,
        }
    }
}

impl InstanceTypeConfig {
    /// An `m1.small` config with no bid, weight or volumes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A config for the given instance type.
    #[must_use]
    pub fn of_type(instance_type: impl Into<String>) -> Self {
        Self {
            instance_type: instance_type.into(),
            ..Self::default()
        }
    }

    /// Instance type.
    #[must_use]
    pub fn instance_type(&self) -> &str {
        &self.instance_type
    }

    /// Set the instance type.
    pub fn set_instance_type(&mut self, instance_type: impl Into<String>) {
        self.instance_type = instance_type.into();
    }

    /// Set the spot bid.
    ///
    /// # Errors
    ///
    /// Returns an error if `bid_price` is negative, infinite or NaN.
    pub fn set_bid_price(&mut self, bid_price: f64) -> Result<()> {
        self.bid_price = Some(check_bid_price(bid_price)?);
        Ok(())
    }

    /// Set the weighted capacity.
    pub fn set_weighted_capacity(&mut self, weighted_capacity: i64) {
        self.weighted_capacity = Some(weighted_capacity);
    }

    /// Attach EBS volumes.
    ///
    /// # Errors
    ///
    /// Returns an error if the option set is incomplete or breaks a volume rule.
    pub fn set_ebs(&mut self, options: &EbsOptions) -> Result<()> {
        self.ebs = Some(EbsConfiguration::from_options(options)?);
        Ok(())
    }

    /// The config in wire form.
    #[must_use]
    pub fn to_wire_config(&self) -> InstanceTypeWireConfig {
        InstanceTypeWireConfig {
            instance_type: self.instance_type.clone(),
            ebs_configuration: self.ebs.clone(),
            bid_price: self.bid_price,
            weighted_capacity: self.weighted_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_wire_config() {
        assert_eq!(
            serde_json::to_value(InstanceTypeConfig::new().to_wire_config()).unwrap(),
            json!({"instance_type": "m1.small"})
        );
    }

    #[test]
    fn invalid_bids_are_rejected() {
        let mut config = InstanceTypeConfig::new();
        for bid in [f64::NAN, f64::INFINITY, -0.5] {
            assert!(matches!(
                config.set_bid_price(bid),
                Err(crate::error::ValidationError::InvalidBidPrice(_))
            ));
        }
        assert_eq!(
            serde_json::to_value(config.to_wire_config()).unwrap(),
            json!({"instance_type": "m1.small"})
        );
    }

    #[test]
    fn full_wire_config() {
        let mut config = InstanceTypeConfig::of_type("m4.large");
        config.set_bid_price(0.5).unwrap();
        config.set_weighted_capacity(2);
        config.set_ebs(&EbsOptions::new(2000, false, "st1", 1)).unwrap();

        assert_eq!(
            serde_json::to_value(config.to_wire_config()).unwrap(),
            json!({
                "instance_type": "m4.large",
                "ebs_configuration": {
                    "ebs_block_device_configs": [{
                        "volumes_per_instance": 1,
                        "volume_specification": {"volume_type": "st1", "size_in_GB": 2000}
                    }],
                    "ebs_optimized": false
                },
                "bid_price": 0.5,
                "weighted_capacity": 2
            })
        );
    }
}
