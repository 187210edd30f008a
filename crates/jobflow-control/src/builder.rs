//! Cluster configuration assembly.
//!
//! The builder owns the instance topology, bootstrap actions, pending steps
//! and the set of step kinds already installed on the cluster. Topology is
//! either instance groups or instance fleets: whichever is set first locks
//! the builder into that mode.
//!
//! Assembly never mutates the builder. It reports which step kinds it
//! installed so the caller can commit them once the document has actually
//! been accepted by the service.

use std::collections::BTreeSet;

use jobflow_core::{InstanceFleet, InstanceGroup, InstanceRole, ValidationError};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ControlError, Result};
use crate::steps::{BootstrapAction, Step};
use crate::types::{ClusterDocument, ClusterSettings, InstancesDocument, Placement, WireStep};

const GROUPS: &str = "groups";
const FLEETS: &str = "fleets";

#[derive(Debug, Default)]
enum Topology {
    #[default]
    Unset,
    Groups(Vec<InstanceGroup>),
    Fleets(Vec<InstanceFleet>),
}

/// Wire steps plus the step kinds they install for the first time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepBatch {
    /// Wire steps in submission order, installation steps included.
    pub steps: Vec<WireStep>,
    /// Kinds whose installation steps this batch carries.
    pub newly_installed: Vec<&'static str>,
}

/// An assembled `RunJobFlow` document.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledCluster {
    /// The cluster description.
    pub document: ClusterDocument,
    /// Kinds whose installation steps the document carries.
    pub newly_installed: Vec<&'static str>,
}

impl AssembledCluster {
    /// The document as a request parameter tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized.
    pub fn to_params(&self) -> Result<Map<String, Value>> {
        to_params(&self.document)
    }
}

/// Serialize `value` into a parameter map.
pub(crate) fn to_params<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ControlError::Serialization(serde::ser::Error::custom(
            format!("expected a document object, got {other}"),
        ))),
    }
}

/// Builds the cluster description.
#[derive(Debug, Default)]
pub struct ClusterConfigBuilder {
    settings: ClusterSettings,
    topology: Topology,
    bootstrap_actions: Vec<Box<dyn BootstrapAction>>,
    steps: Vec<Box<dyn Step>>,
    installed: BTreeSet<&'static str>,
}

impl ClusterConfigBuilder {
    /// Create a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with the given settings.
    #[must_use]
    pub fn with_settings(settings: ClusterSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Top-level cluster settings.
    #[must_use]
    pub const fn settings(&self) -> &ClusterSettings {
        &self.settings
    }

    /// Mutable access to the top-level cluster settings.
    pub fn settings_mut(&mut self) -> &mut ClusterSettings {
        &mut self.settings
    }

    /// Add an instance group, replacing any group with the same role.
    ///
    /// # Errors
    ///
    /// Returns `TopologyConflict` if instance fleets are already configured.
    pub fn set_instance_group(&mut self, group: InstanceGroup) -> Result<()> {
        match &mut self.topology {
            Topology::Fleets(_) => Err(conflict(GROUPS, FLEETS).into()),
            Topology::Groups(groups) => {
                replace_or_push(groups, group, InstanceGroup::role);
                Ok(())
            }
            Topology::Unset => {
                tracing::debug!(mode = GROUPS, "Instance topology locked");
                self.topology = Topology::Groups(vec![group]);
                Ok(())
            }
        }
    }

    /// Add an instance fleet, replacing any fleet with the same role.
    ///
    /// # Errors
    ///
    /// Returns `TopologyConflict` if instance groups are already configured.
    pub fn set_instance_fleet(&mut self, fleet: InstanceFleet) -> Result<()> {
        match &mut self.topology {
            Topology::Groups(_) => Err(conflict(FLEETS, GROUPS).into()),
            Topology::Fleets(fleets) => {
                replace_or_push(fleets, fleet, InstanceFleet::role);
                Ok(())
            }
            Topology::Unset => {
                tracing::debug!(mode = FLEETS, "Instance topology locked");
                self.topology = Topology::Fleets(vec![fleet]);
                Ok(())
            }
        }
    }

    /// Configured instance groups.
    #[must_use]
    pub fn instance_groups(&self) -> &[InstanceGroup] {
        match &self.topology {
            Topology::Groups(groups) => groups,
            _ => &[],
        }
    }

    /// Configured instance fleets.
    #[must_use]
    pub fn instance_fleets(&self) -> &[InstanceFleet] {
        match &self.topology {
            Topology::Fleets(fleets) => fleets,
            _ => &[],
        }
    }

    /// Append a bootstrap action.
    pub fn add_bootstrap_action(&mut self, action: Box<dyn BootstrapAction>) {
        self.bootstrap_actions.push(action);
    }

    /// Append a step to the pending list.
    pub fn add_step(&mut self, step: Box<dyn Step>) {
        self.steps.push(step);
    }

    /// Steps waiting for the initial submission.
    #[must_use]
    pub fn pending_steps(&self) -> &[Box<dyn Step>] {
        &self.steps
    }

    /// Whether installation steps for `kind` have been committed.
    #[must_use]
    pub fn is_installed(&self, kind: &str) -> bool {
        self.installed.contains(kind)
    }

    /// Record `kinds` as installed on the cluster.
    pub fn commit_installed(&mut self, kinds: &[&'static str]) {
        self.installed.extend(kinds.iter().copied());
    }

    /// Expand `steps` into wire steps, placing each kind's installation
    /// steps ahead of its first step unless that kind is already installed.
    #[must_use]
    pub fn expand_steps(&self, steps: &[Box<dyn Step>]) -> StepBatch {
        let mut seen = self.installed.clone();
        let mut batch = StepBatch::default();

        for step in steps {
            let kind = step.kind();
            if !seen.contains(kind) {
                let install = step.installation_steps();
                if !install.is_empty() {
                    batch.steps.extend(install);
                    batch.newly_installed.push(kind);
                }
                seen.insert(kind);
            }
            batch.steps.push(step.to_wire_step());
        }

        batch
    }

    /// Assemble the `RunJobFlow` document from the current state.
    ///
    /// # Errors
    ///
    /// Returns `MissingTopology` if no groups or fleets are configured,
    /// `MissingMasterRole` if none of them has the MASTER role, or any
    /// fleet validation error.
    pub fn assemble(&self) -> Result<AssembledCluster> {
        let (instance_groups, instance_fleets) = match &self.topology {
            Topology::Unset => return Err(ValidationError::MissingTopology.into()),
            Topology::Groups(groups) => {
                require_master(groups.iter().map(InstanceGroup::role), GROUPS)?;
                let configs: Vec<_> = by_role(groups, InstanceGroup::role)
                    .map(InstanceGroup::to_wire_config)
                    .collect();
                (Some(configs), None)
            }
            Topology::Fleets(fleets) => {
                require_master(fleets.iter().map(InstanceFleet::role), FLEETS)?;
                let configs = by_role(fleets, InstanceFleet::role)
                    .map(InstanceFleet::to_wire_config)
                    .collect::<jobflow_core::Result<Vec<_>>>()?;
                (None, Some(configs))
            }
        };

        let settings = &self.settings;
        let batch = self.expand_steps(&self.steps);

        let document = ClusterDocument {
            name: settings.name.clone(),
            log_uri: settings.log_uri.clone(),
            release_label: settings.release_label.clone(),
            ami_version: settings
                .ami_version
                .clone()
                .filter(|_| settings.release_label.is_none()),
            instances: InstancesDocument {
                instance_groups,
                instance_fleets,
                ec2_key_name: settings.ec2_key_name.clone(),
                ec2_subnet_id: settings.ec2_subnet_id.clone(),
                placement: settings.placement.clone().map(|availability_zone| Placement {
                    availability_zone,
                }),
                keep_job_flow_alive_when_no_steps: settings.keep_job_flow_alive_when_no_steps,
                termination_protected: settings.termination_protected,
            },
            visible_to_all_users: settings.visible_to_all_users,
            job_flow_role: settings.job_flow_role.clone(),
            service_role: settings.service_role.clone(),
            security_configuration: settings.security_configuration.clone(),
            applications: settings.applications.clone(),
            configurations: settings.configurations.clone(),
            tags: settings.tags.clone(),
            additional_info: settings.additional_info.clone(),
            bootstrap_actions: self
                .bootstrap_actions
                .iter()
                .map(|action| action.to_wire_action())
                .collect(),
            steps: batch.steps,
        };

        tracing::debug!(
            name = %document.name,
            steps = document.steps.len(),
            bootstrap_actions = document.bootstrap_actions.len(),
            "Assembled cluster document"
        );

        Ok(AssembledCluster {
            document,
            newly_installed: batch.newly_installed,
        })
    }
}

const fn conflict(requested: &'static str, configured: &'static str) -> ValidationError {
    ValidationError::TopologyConflict {
        requested,
        configured,
    }
}

fn replace_or_push<T>(items: &mut Vec<T>, item: T, role: fn(&T) -> InstanceRole) {
    match items.iter_mut().find(|existing| role(existing) == role(&item)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

fn require_master(
    mut roles: impl Iterator<Item = InstanceRole>,
    mode: &'static str,
) -> Result<()> {
    if roles.any(|role| role == InstanceRole::Master) {
        Ok(())
    } else {
        Err(ValidationError::MissingMasterRole(mode).into())
    }
}

/// Items in MASTER, CORE, TASK order.
fn by_role<T>(items: &[T], role: fn(&T) -> InstanceRole) -> impl Iterator<Item = &T> {
    InstanceRole::ALL
        .into_iter()
        .filter_map(move |wanted| items.iter().find(|item| role(item) == wanted))
}

#[cfg(test)]
mod tests {
    use jobflow_core::{EbsOptions, InstanceTypeConfig};
    use serde_json::json;

    use super::*;
    use crate::steps::{CustomJarStep, HiveStep, ScriptBootstrapAction};

    fn group(role: InstanceRole, count: i64, instance_type: &str) -> InstanceGroup {
        let mut group = InstanceGroup::new();
        group.set_role(role);
        group.set_count(count).unwrap();
        group.set_instance_type(instance_type);
        group
    }

    fn master_fleet() -> InstanceFleet {
        let mut fleet = InstanceFleet::new();
        fleet.set_role(InstanceRole::Master);
        fleet.set_target_on_demand_capacity(1).unwrap();
        fleet
            .add_instance_type_config(InstanceTypeConfig::of_type("m4.large"))
            .unwrap();
        fleet
    }

    #[test]
    fn groups_lock_out_fleets() {
        let mut builder = ClusterConfigBuilder::new();
        builder
            .set_instance_group(group(InstanceRole::Master, 1, "m1.small"))
            .unwrap();

        let err = builder.set_instance_fleet(master_fleet()).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Validation(ValidationError::TopologyConflict {
                requested: "fleets",
                configured: "groups",
            })
        ));
        assert!(builder.instance_fleets().is_empty());
    }

    #[test]
    fn fleets_lock_out_groups() {
        let mut builder = ClusterConfigBuilder::new();
        builder.set_instance_fleet(master_fleet()).unwrap();

        let err = builder
            .set_instance_group(group(InstanceRole::Core, 2, "m1.small"))
            .unwrap_err();
        assert!(matches!(
            err,
            ControlError::Validation(ValidationError::TopologyConflict { .. })
        ));
        assert_eq!(builder.instance_fleets().len(), 1);
    }

    #[test]
    fn one_group_per_role() {
        let mut builder = ClusterConfigBuilder::new();
        builder
            .set_instance_group(group(InstanceRole::Core, 2, "m1.small"))
            .unwrap();
        builder
            .set_instance_group(group(InstanceRole::Core, 6, "c1.medium"))
            .unwrap();

        assert_eq!(builder.instance_groups().len(), 1);
        assert_eq!(builder.instance_groups()[0].count(), 6);
    }

    #[test]
    fn groups_are_emitted_in_role_order() {
        let mut builder = ClusterConfigBuilder::new();
        builder
            .set_instance_group(group(InstanceRole::Task, 3, "m1.small"))
            .unwrap();
        builder
            .set_instance_group(group(InstanceRole::Master, 1, "m1.small"))
            .unwrap();
        builder
            .set_instance_group(group(InstanceRole::Core, 2, "m1.small"))
            .unwrap();

        let assembled = builder.assemble().unwrap();
        let roles: Vec<_> = assembled
            .document
            .instances
            .instance_groups
            .unwrap()
            .iter()
            .map(|g| g.instance_role)
            .collect();
        assert_eq!(
            roles,
            vec![InstanceRole::Master, InstanceRole::Core, InstanceRole::Task]
        );
    }

    #[test]
    fn missing_topology_is_rejected() {
        let err = ClusterConfigBuilder::new().assemble().unwrap_err();
        assert!(matches!(
            err,
            ControlError::Validation(ValidationError::MissingTopology)
        ));
    }

    #[test]
    fn missing_master_is_rejected() {
        let mut builder = ClusterConfigBuilder::new();
        builder
            .set_instance_group(group(InstanceRole::Core, 2, "m1.small"))
            .unwrap();

        let err = builder.assemble().unwrap_err();
        assert!(matches!(
            err,
            ControlError::Validation(ValidationError::MissingMasterRole("groups"))
        ));
    }

    #[test]
    fn fleet_validation_runs_at_assembly() {
        let mut fleet = master_fleet();
        fleet.set_target_spot_capacity(1).unwrap();

        let mut builder = ClusterConfigBuilder::new();
        builder.set_instance_fleet(fleet).unwrap();

        let err = builder.assemble().unwrap_err();
        assert!(matches!(
            err,
            ControlError::Validation(ValidationError::MasterFleetCapacityMix { .. })
        ));
    }

    #[test]
    fn installation_precedes_first_step_of_kind_only() {
        let mut builder = ClusterConfigBuilder::new();
        builder.add_step(Box::new(HiveStep::new("s3://bucket/a.q")));
        builder.add_step(Box::new(CustomJarStep::new("s3://bucket/job.jar")));
        builder.add_step(Box::new(HiveStep::new("s3://bucket/b.q")));

        let batch = builder.expand_steps(builder.pending_steps());
        let names: Vec<_> = batch.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Install Hive", "Hive Step", "Custom Jar Step", "Hive Step"]
        );
        assert_eq!(batch.newly_installed, vec!["hive"]);
        assert!(!builder.is_installed("hive"));
    }

    #[test]
    fn committed_kinds_are_not_installed_again() {
        let mut builder = ClusterConfigBuilder::new();
        builder.commit_installed(&["hive"]);

        let steps: Vec<Box<dyn Step>> = vec![Box::new(HiveStep::new("s3://bucket/a.q"))];
        let batch = builder.expand_steps(&steps);
        assert_eq!(batch.steps.len(), 1);
        assert!(batch.newly_installed.is_empty());
    }

    #[test]
    fn assembled_document_carries_settings() {
        let mut builder = ClusterConfigBuilder::new();
        builder
            .set_instance_group(group(InstanceRole::Master, 1, "m1.small"))
            .unwrap();
        {
            let settings = builder.settings_mut();
            settings.name = "Nightly".to_string();
            settings.log_uri = Some("s3://bucket/logs/".to_string());
            settings.release_label = Some("emr-5.0.0".to_string());
            settings.ami_version = Some("3.11.0".to_string());
            settings.placement = Some("us-east-1a".to_string());
            settings.keep_job_flow_alive_when_no_steps = true;
        }
        builder.add_bootstrap_action(Box::new(ScriptBootstrapAction::new("s3://bucket/setup.sh")));

        let params = builder.assemble().unwrap().to_params().unwrap();
        assert_eq!(params["name"], json!("Nightly"));
        assert_eq!(params["log_uri"], json!("s3://bucket/logs/"));
        assert_eq!(params["release_label"], json!("emr-5.0.0"));
        assert!(!params.contains_key("ami_version"));
        assert_eq!(
            params["instances"]["placement"],
            json!({"availability_zone": "us-east-1a"})
        );
        assert_eq!(
            params["instances"]["keep_job_flow_alive_when_no_steps"],
            json!(true)
        );
        assert_eq!(params["bootstrap_actions"][0]["name"], json!("Bootstrap Action"));
        assert_eq!(params["steps"], json!([]));
    }

    #[test]
    fn empty_bootstrap_actions_are_omitted() {
        let mut builder = ClusterConfigBuilder::new();
        builder
            .set_instance_group(group(InstanceRole::Master, 1, "m1.small"))
            .unwrap();

        let params = builder.assemble().unwrap().to_params().unwrap();
        assert!(!params.contains_key("bootstrap_actions"));
        assert!(!params.contains_key("tags"));
    }

    #[test]
    fn group_ebs_reaches_the_document() {
        let mut core = group(InstanceRole::Core, 2, "m4.large");
        core.set_ebs(&EbsOptions::new(100, true, "gp2", 2)).unwrap();

        let mut builder = ClusterConfigBuilder::new();
        builder
            .set_instance_group(group(InstanceRole::Master, 1, "m4.large"))
            .unwrap();
        builder.set_instance_group(core).unwrap();

        let params = builder.assemble().unwrap().to_params().unwrap();
        let ebs = &params["instances"]["instance_groups"][1]["ebs_configuration"];
        assert_eq!(ebs["ebs_optimized"], json!(true));
        assert_eq!(
            ebs["ebs_block_device_configs"][0]["volume_specification"]["size_in_GB"],
            json!(100)
        );
    }
}
