use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A workflow description as submitted to the workflow engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowDescription {
  pub processes: Vec<ProcessStep>,
  #[serde(default)]
  pub signals: Vec<Signal>,
  #[serde(default)]
  pub ins: Vec<String>,
  #[serde(default)]
  pub outs: Vec<String>,
}

/// A single process in the job graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStep {
  pub name: String,
  pub function: String,
  #[serde(rename = "type")]
  pub process_type: String,
  pub config: ProcessConfig,
  /// How many times the engine may fire this process.
  #[serde(
    rename = "firingLimit",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub firing_limit: Option<u32>,
  #[serde(default)]
  pub ins: Vec<String>,
  #[serde(default)]
  pub outs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessConfig {
  pub executor: ExecutorConfig,
}

/// Executable and its ordered argument list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
  pub executable: String,
  #[serde(default)]
  pub args: Vec<String>,
}

/// A named signal (data channel) between processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Vec<serde_json::Value>>,
}

impl WorkflowDescription {
  /// Get a process by name.
  pub fn process(&self, name: &str) -> Option<&ProcessStep> {
    self.processes.iter().find(|p| p.name == name)
  }

  /// Whether a signal with the given name is declared.
  pub fn has_signal(&self, name: &str) -> bool {
    self.signals.iter().any(|s| s.name == name)
  }

  /// Channel names used by processes that are neither workflow inputs or
  /// outputs nor declared signals.
  ///
  /// An empty result means the description is closed.
  pub fn dangling_channels(&self) -> Vec<String> {
    let known: HashSet<&str> = self
      .ins
      .iter()
      .chain(self.outs.iter())
      .map(String::as_str)
      .chain(self.signals.iter().map(|s| s.name.as_str()))
      .collect();

    let mut dangling: Vec<String> = Vec::new();
    for channel in self
      .processes
      .iter()
      .flat_map(|p| p.ins.iter().chain(p.outs.iter()))
    {
      if !known.contains(channel.as_str()) && !dangling.contains(channel) {
        dangling.push(channel.clone());
      }
    }
    dangling
  }
}
