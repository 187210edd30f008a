//! Steps and bootstrap actions.
//!
//! A [`Step`] produces its own wire document and may declare installation
//! steps that must run once, before the first step of its kind, over the
//! whole life of a cluster. The builder tracks which kinds are installed.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{
    ActionOnFailure, HadoopJarStep, ScriptBootstrapActionConfig, WireBootstrapAction, WireStep,
};

/// Jar that runs an arbitrary script as a step.
pub const SCRIPT_RUNNER_JAR: &str = "s3://elasticmapreduce/libs/script-runner/script-runner.jar";
/// Entry point for the Hive tooling.
pub const HIVE_SCRIPT: &str = "s3://elasticmapreduce/libs/hive/hive-script";
/// Where the Hive tooling lives.
pub const HIVE_BASE_PATH: &str = "s3://elasticmapreduce/libs/hive/";

/// A unit of work run on the cluster.
pub trait Step: fmt::Debug + Send + Sync {
    /// Identifies the step's kind for installation tracking.
    fn kind(&self) -> &'static str;

    /// The step's wire document.
    fn to_wire_step(&self) -> WireStep;

    /// Steps that must run once before the first step of this kind.
    fn installation_steps(&self) -> Vec<WireStep> {
        Vec::new()
    }
}

/// A script run on every node while the cluster boots.
pub trait BootstrapAction: fmt::Debug + Send + Sync {
    /// The action's wire document.
    fn to_wire_action(&self) -> WireBootstrapAction;
}

/// Runs a jar with arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomJarStep {
    /// Step name.
    pub name: String,
    /// Location of the jar.
    pub jar: String,
    /// Main class, when the jar manifest does not name one.
    pub main_class: Option<String>,
    /// Command line arguments.
    pub args: Vec<String>,
    /// Failure behaviour.
    pub action_on_failure: ActionOnFailure,
}

impl CustomJarStep {
    /// Run `jar` with no arguments.
    #[must_use]
    pub fn new(jar: impl Into<String>) -> Self {
        Self {
            name: "Custom Jar Step".to_string(),
            jar: jar.into(),
            main_class: None,
            args: Vec::new(),
            action_on_failure: ActionOnFailure::default(),
        }
    }

    /// Set the arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl Step for CustomJarStep {
    fn kind(&self) -> &'static str {
        "custom_jar"
    }

    fn to_wire_step(&self) -> WireStep {
        WireStep {
            name: self.name.clone(),
            action_on_failure: self.action_on_failure,
            hadoop_jar_step: HadoopJarStep {
                jar: self.jar.clone(),
                main_class: self.main_class.clone(),
                args: self.args.clone(),
            },
        }
    }
}

/// Runs a Hive script. Hive is installed on the cluster the first time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiveStep {
    /// Step name.
    pub name: String,
    /// Location of the script.
    pub script: String,
    /// Variables passed with `-d name=value`, in key order.
    pub variables: BTreeMap<String, String>,
    /// Failure behaviour.
    pub action_on_failure: ActionOnFailure,
}

impl HiveStep {
    /// Run the script at `script`.
    #[must_use]
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            name: "Hive Step".to_string(),
            script: script.into(),
            variables: BTreeMap::new(),
            action_on_failure: ActionOnFailure::default(),
        }
    }

    /// Add a script variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

impl Step for HiveStep {
    fn kind(&self) -> &'static str {
        "hive"
    }

    fn to_wire_step(&self) -> WireStep {
        let mut args: Vec<String> = [HIVE_SCRIPT, "--run-hive-script", "--args", "-f"]
            .iter()
            .map(ToString::to_string)
            .collect();
        args.push(self.script.clone());
        for (name, value) in &self.variables {
            args.push("-d".to_string());
            args.push(format!("{name}={value}"));
        }

        WireStep {
            name: self.name.clone(),
            action_on_failure: self.action_on_failure,
            hadoop_jar_step: HadoopJarStep {
                jar: SCRIPT_RUNNER_JAR.to_string(),
                main_class: None,
                args,
            },
        }
    }

    fn installation_steps(&self) -> Vec<WireStep> {
        vec![WireStep {
            name: "Install Hive".to_string(),
            action_on_failure: ActionOnFailure::TerminateJobFlow,
            hadoop_jar_step: HadoopJarStep {
                jar: SCRIPT_RUNNER_JAR.to_string(),
                main_class: None,
                args: [
                    HIVE_SCRIPT,
                    "--base-path",
                    HIVE_BASE_PATH,
                    "--install-hive",
                    "--hive-versions",
                    "latest",
                ]
                .iter()
                .map(ToString::to_string)
                .collect(),
            },
        }]
    }
}

/// Runs a script from a path on every node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBootstrapAction {
    /// Action name.
    pub name: String,
    /// Location of the script.
    pub path: String,
    /// Script arguments.
    pub args: Vec<String>,
}

impl ScriptBootstrapAction {
    /// Run the script at `path` with no arguments.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            name: "Bootstrap Action".to_string(),
            path: path.into(),
            args: Vec::new(),
        }
    }

    /// Set the arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl BootstrapAction for ScriptBootstrapAction {
    fn to_wire_action(&self) -> WireBootstrapAction {
        WireBootstrapAction {
            name: self.name.clone(),
            script_bootstrap_action: ScriptBootstrapActionConfig {
                path: self.path.clone(),
                args: self.args.clone(),
            },
        }
    }
}
