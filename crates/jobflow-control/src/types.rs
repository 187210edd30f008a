//! Wire documents and settings for job flow operations.
//!
//! Field names are snake_case; the signer converts them to the service's
//! spelling. Optional fields are left out of the document entirely when
//! unset.

use jobflow_core::{InstanceFleetConfig, InstanceGroupConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default job flow name.
pub const DEFAULT_JOB_FLOW_NAME: &str = "Job Flow";

/// What the cluster does when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionOnFailure {
    /// Shut the whole cluster down (older spelling).
    #[default]
    TerminateJobFlow,
    /// Shut the whole cluster down.
    TerminateCluster,
    /// Cancel the remaining steps and wait.
    CancelAndWait,
    /// Carry on with the next step.
    Continue,
}

/// A jar invocation run by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HadoopJarStep {
    /// Location of the jar.
    pub jar: String,
    /// Main class, when the jar manifest does not name one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    /// Command line arguments.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Wire form of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireStep {
    /// Step name.
    pub name: String,
    /// Failure behaviour.
    pub action_on_failure: ActionOnFailure,
    /// The jar to run.
    pub hadoop_jar_step: HadoopJarStep,
}

/// A script run on every node before the cluster starts work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptBootstrapActionConfig {
    /// Location of the script.
    pub path: String,
    /// Script arguments.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Wire form of a bootstrap action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireBootstrapAction {
    /// Action name.
    pub name: String,
    /// The script to run.
    pub script_bootstrap_action: ScriptBootstrapActionConfig,
}

/// A key/value tag applied to the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// An application to install, e.g. `Spark`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Application name.
    pub name: String,
}

/// Availability zone placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// The availability zone to launch in.
    pub availability_zone: String,
}

/// Top-level settings passed through to the cluster document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    /// Job flow name.
    pub name: String,
    /// Where the service writes logs.
    pub log_uri: Option<String>,
    /// Release label, e.g. `emr-5.0.0`. Selects the JSON protocol.
    pub release_label: Option<String>,
    /// AMI version for clusters predating release labels. Ignored when a
    /// release label is set.
    pub ami_version: Option<String>,
    /// Key pair for SSH access.
    pub ec2_key_name: Option<String>,
    /// Subnet to launch in.
    pub ec2_subnet_id: Option<String>,
    /// Availability zone to launch in.
    pub placement: Option<String>,
    /// Keep the cluster up once all steps are done.
    pub keep_job_flow_alive_when_no_steps: bool,
    /// Protect the cluster from accidental termination.
    pub termination_protected: bool,
    /// Make the cluster visible to every user of the account.
    pub visible_to_all_users: bool,
    /// Instance profile for cluster nodes.
    pub job_flow_role: Option<String>,
    /// Role the service assumes.
    pub service_role: Option<String>,
    /// Named security configuration.
    pub security_configuration: Option<String>,
    /// Applications to install.
    pub applications: Vec<Application>,
    /// Configuration classifications, sent with their keys untouched.
    pub configurations: Vec<Value>,
    /// Cluster tags.
    pub tags: Vec<Tag>,
    /// Free-form additional info.
    pub additional_info: Option<String>,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_JOB_FLOW_NAME.to_string(),
            log_uri: None,
            release_label: None,
            ami_version: None,
            ec2_key_name: None,
            ec2_subnet_id: None,
            placement: None,
            keep_job_flow_alive_when_no_steps: false,
            termination_protected: false,
            visible_to_all_users: false,
            job_flow_role: None,
            service_role: None,
            security_configuration: None,
            applications: Vec::new(),
            configurations: Vec::new(),
            tags: Vec::new(),
            additional_info: None,
        }
    }
}

/// The `instances` section of a cluster document.
///
/// Exactly one of `instance_groups` and `instance_fleets` is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstancesDocument {
    /// Instance groups, one per role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_groups: Option<Vec<InstanceGroupConfig>>,
    /// Instance fleets, one per role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_fleets: Option<Vec<InstanceFleetConfig>>,
    /// Key pair for SSH access.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec2_key_name: Option<String>,
    /// Subnet to launch in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec2_subnet_id: Option<String>,
    /// Availability zone placement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    /// Keep the cluster up once all steps are done.
    pub keep_job_flow_alive_when_no_steps: bool,
    /// Protect the cluster from accidental termination.
    pub termination_protected: bool,
}

/// The full cluster description sent with `RunJobFlow`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterDocument {
    /// Job flow name.
    pub name: String,
    /// Where the service writes logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_uri: Option<String>,
    /// Release label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_label: Option<String>,
    /// AMI version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ami_version: Option<String>,
    /// Instance topology and placement.
    pub instances: InstancesDocument,
    /// Make the cluster visible to every user of the account.
    pub visible_to_all_users: bool,
    /// Instance profile for cluster nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_flow_role: Option<String>,
    /// Role the service assumes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_role: Option<String>,
    /// Named security configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_configuration: Option<String>,
    /// Applications to install.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<Application>,
    /// Configuration classifications.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub configurations: Vec<Value>,
    /// Cluster tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// Free-form additional info.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    /// Bootstrap actions, in the order they were added.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bootstrap_actions: Vec<WireBootstrapAction>,
    /// Steps, installation steps included.
    pub steps: Vec<WireStep>,
}

/// Current status of a cluster as reported by `DescribeCluster`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    /// Cluster id.
    pub id: String,
    /// Cluster name.
    pub name: String,
    /// State, e.g. `WAITING` or `TERMINATED`.
    pub state: String,
    /// Why the cluster last changed state, if the service said.
    pub state_change_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = ClusterSettings::default();
        assert_eq!(settings.name, "Job Flow");
        assert!(!settings.keep_job_flow_alive_when_no_steps);
        assert!(!settings.termination_protected);
        assert!(settings.release_label.is_none());
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: ClusterSettings = serde_json::from_str(
            r#"{"release_label": "emr-5.0.0", "tags": [{"key": "team", "value": "data"}]}"#,
        )
        .unwrap();

        assert_eq!(settings.name, DEFAULT_JOB_FLOW_NAME);
        assert_eq!(settings.release_label.as_deref(), Some("emr-5.0.0"));
        assert_eq!(settings.tags[0].value, "data");
    }

    #[test]
    fn action_on_failure_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&ActionOnFailure::default()).unwrap(),
            "\"TERMINATE_JOB_FLOW\""
        );
        assert_eq!(
            serde_json::to_string(&ActionOnFailure::CancelAndWait).unwrap(),
            "\"CANCEL_AND_WAIT\""
        );
    }

    #[test]
    fn empty_step_args_are_omitted() {
        let step = WireStep {
            name: "Jar".into(),
            action_on_failure: ActionOnFailure::Continue,
            hadoop_jar_step: HadoopJarStep {
                jar: "s3://bucket/job.jar".into(),
                main_class: None,
                args: Vec::new(),
            },
        };
        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            serde_json::json!({
                "name": "Jar",
                "action_on_failure": "CONTINUE",
                "hadoop_jar_step": {"jar": "s3://bucket/job.jar"}
            })
        );
    }
}
