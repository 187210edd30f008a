//! EBS volume configuration.
//!
//! An [`EbsConfiguration`] is never built field by field: it is derived from
//! a flat [`EbsOptions`] set, which is validated as a whole.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Exclusive upper bound on volume size, in GB (16 TiB).
pub const MAX_VOLUME_SIZE_GB: i64 = 16 * 1024;

/// Exclusive upper bound on volume size for instance group volumes, in GB.
pub const MAX_GROUP_VOLUME_SIZE_GB: i64 = 1024;

/// Smallest volume size allowed for EBS-optimized volumes, in GB.
pub const MIN_OPTIMIZED_SIZE_GB: i64 = 10;

/// Supported EBS volume types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    /// General purpose SSD.
    Gp2,
    /// Provisioned IOPS SSD.
    Io1,
    /// Magnetic.
    Standard,
    /// Cold HDD.
    Sc1,
    /// Throughput optimized HDD.
    St1,
}

impl VolumeType {
    /// All supported types.
    pub const ALL: [Self; 5] = [Self::Gp2, Self::Io1, Self::Standard, Self::Sc1, Self::St1];

    /// The wire spelling of the volume type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gp2 => "gp2",
            Self::Io1 => "io1",
            Self::Standard => "standard",
            Self::Sc1 => "sc1",
            Self::St1 => "st1",
        }
    }

    /// Whether volumes of this type are provisioned with an IOPS value.
    #[must_use]
    pub const fn requires_iops(self) -> bool {
        matches!(self, Self::Io1)
    }

    fn allowed() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedVolumeType {
                requested: s.to_string(),
                allowed: Self::allowed(),
            })
    }
}

/// Flat EBS option set, as a caller would write it.
///
/// Size, optimized flag, volume type and volume count are all required;
/// IOPS is required for provisioned-IOPS volumes and rejected otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EbsOptions {
    /// Size of each volume in GB.
    #[serde(default)]
    pub ebs_size_in_gb: Option<i64>,
    /// Whether instances are EBS-optimized.
    #[serde(default)]
    pub ebs_optimized: Option<bool>,
    /// Volume type, e.g. `gp2`.
    #[serde(default)]
    pub ebs_volume_type: Option<String>,
    /// Number of volumes per instance.
    #[serde(default)]
    pub ebs_number_of_volumes: Option<i64>,
    /// Provisioned IOPS.
    #[serde(default)]
    pub ebs_iops: Option<i64>,
}

impl EbsOptions {
    /// Create a complete option set without IOPS.
    #[must_use]
    pub fn new(
        size_in_gb: i64,
        optimized: bool,
        volume_type: impl Into<String>,
        number_of_volumes: i64,
    ) -> Self {
        Self {
            ebs_size_in_gb: Some(size_in_gb),
            ebs_optimized: Some(optimized),
            ebs_volume_type: Some(volume_type.into()),
            ebs_number_of_volumes: Some(number_of_volumes),
            ebs_iops: None,
        }
    }

    /// Set the provisioned IOPS.
    #[must_use]
    pub const fn with_iops(mut self, iops: i64) -> Self {
        self.ebs_iops = Some(iops);
        self
    }

    fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.ebs_size_in_gb.is_none() {
            missing.push("ebs_size_in_gb");
        }
        if self.ebs_optimized.is_none() {
            missing.push("ebs_optimized");
        }
        if self.ebs_volume_type.is_none() {
            missing.push("ebs_volume_type");
        }
        if self.ebs_number_of_volumes.is_none() {
            missing.push("ebs_number_of_volumes");
        }
        missing
    }
}

/// Validated EBS configuration in wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EbsConfiguration {
    /// Block device configs; always exactly one entry.
    pub ebs_block_device_configs: Vec<EbsBlockDeviceConfig>,
    /// Whether instances are EBS-optimized.
    pub ebs_optimized: bool,
}

/// Volumes attached to every instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EbsBlockDeviceConfig {
    /// Number of volumes per instance.
    pub volumes_per_instance: i64,
    /// Shape of each volume.
    pub volume_specification: VolumeSpecification,
}

/// Shape of a single EBS volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSpecification {
    /// Volume type.
    pub volume_type: VolumeType,
    /// Size in GB.
    #[serde(rename = "size_in_GB")]
    pub size_in_gb: i64,
    /// Provisioned IOPS, only for provisioned-IOPS volumes.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iops: Option<i64>,
}

impl EbsConfiguration {
    /// Validate an option set against the 16 TiB volume bound.
    ///
    /// # Errors
    ///
    /// Returns the first rule the option set breaks.
    pub fn from_options(options: &EbsOptions) -> Result<Self> {
        Self::from_options_with_limit(options, MAX_VOLUME_SIZE_GB)
    }

    /// Validate an option set, rejecting sizes at or above `size_limit_gb`.
    ///
    /// # Errors
    ///
    /// Returns the first rule the option set breaks.
    pub fn from_options_with_limit(options: &EbsOptions, size_limit_gb: i64) -> Result<Self> {
        let (Some(size), Some(optimized), Some(volume_type), Some(volumes)) = (
            options.ebs_size_in_gb,
            options.ebs_optimized,
            options.ebs_volume_type.as_deref(),
            options.ebs_number_of_volumes,
        ) else {
            return Err(ValidationError::MissingEbsParameters {
                missing: options.missing().join(", "),
            });
        };

        if size <= 0 {
            return Err(ValidationError::EbsSizeNotPositive(size));
        }
        if volumes < 1 {
            return Err(ValidationError::EbsVolumeCount(volumes));
        }
        if size >= size_limit_gb {
            return Err(ValidationError::EbsSizeTooLarge {
                requested: size,
                limit: size_limit_gb,
            });
        }
        if optimized && size < MIN_OPTIMIZED_SIZE_GB {
            return Err(ValidationError::EbsOptimizedTooSmall {
                requested: size,
                minimum: MIN_OPTIMIZED_SIZE_GB,
            });
        }

        let volume_type: VolumeType = volume_type.parse()?;
        match (volume_type.requires_iops(), options.ebs_iops) {
            (true, None) => return Err(ValidationError::IopsRequired(volume_type.to_string())),
            (false, Some(_)) => {
                return Err(ValidationError::IopsNotSupported(volume_type.to_string()))
            }
            _ => {}
        }

        Ok(Self {
            ebs_block_device_configs: vec![EbsBlockDeviceConfig {
                volumes_per_instance: volumes,
                volume_specification: VolumeSpecification {
                    volume_type,
                    size_in_gb: size,
                    iops: options.ebs_iops,
                },
            }],
            ebs_optimized: optimized,
        })
    }

    /// Recover the flat option set this configuration was derived from.
    #[must_use]
    pub fn to_options(&self) -> EbsOptions {
        let mut options = EbsOptions {
            ebs_optimized: Some(self.ebs_optimized),
            ..EbsOptions::default()
        };
        if let Some(device) = self.ebs_block_device_configs.first() {
            let volume = &device.volume_specification;
            options.ebs_size_in_gb = Some(volume.size_in_gb);
            options.ebs_volume_type = Some(volume.volume_type.to_string());
            options.ebs_number_of_volumes = Some(device.volumes_per_instance);
            options.ebs_iops = volume.iops;
        }
        options
    }
}
