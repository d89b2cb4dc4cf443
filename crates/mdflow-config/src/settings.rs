use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub engine: EngineSettings,
  pub storage: StorageSettings,
  pub cache: CacheSettings,
  pub poll: PollSettings,
  /// Workflow template to render. The bundled template is used when unset.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub template_path: Option<PathBuf>,
}

/// Workflow engine endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
  /// URL workflow descriptions are POSTed to.
  pub url: String,
  /// Upper bound on a single submission round trip.
  pub timeout_secs: u64,
}

impl Default for EngineSettings {
  fn default() -> Self {
    Self {
      url: "http://localhost:51404/apps".to_string(),
      timeout_secs: 30,
    }
  }
}

/// Object storage location of simulation artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
  pub region: String,
  pub bucket: String,
  /// Key prefix inside the bucket, e.g. "results/".
  pub path: String,
  /// Overrides the regional S3 endpoint (e.g. a local S3-compatible store).
  #[serde(skip_serializing_if = "Option::is_none")]
  pub base_url: Option<String>,
}

impl Default for StorageSettings {
  fn default() -> Self {
    Self {
      region: "eu-central-1".to_string(),
      bucket: "paasage-md-bucket".to_string(),
      path: "results/".to_string(),
      base_url: None,
    }
  }
}

/// Experiment cache retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
  pub retention_secs: u64,
}

impl Default for CacheSettings {
  fn default() -> Self {
    Self {
      retention_secs: 3600,
    }
  }
}

/// Artifact polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
  pub interval_secs: u64,
  pub probe_timeout_secs: u64,
  /// Start a background poll for every newly submitted experiment.
  pub auto_watch: bool,
}

impl Default for PollSettings {
  fn default() -> Self {
    Self {
      interval_secs: 5,
      probe_timeout_secs: 10,
      auto_watch: true,
    }
  }
}

impl Settings {
  /// Load settings from a JSON file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(&content)
  }

  /// Load settings from a JSON file if it exists, falling back to defaults.
  pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    if path.exists() {
      Self::load(path)
    } else {
      Ok(Self::default())
    }
  }

  /// Parse and validate settings from a JSON string.
  pub fn from_json(content: &str) -> Result<Self, ConfigError> {
    let settings: Settings = serde_json::from_str(content)?;
    settings.validate()?;
    Ok(settings)
  }

  /// Check values that deserialize fine but cannot be used.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.engine.url.trim().is_empty() {
      return Err(invalid("engine.url", "must not be empty"));
    }
    if self.engine.timeout_secs == 0 {
      return Err(invalid("engine.timeout_secs", "must be greater than zero"));
    }
    if self.storage.bucket.trim().is_empty() {
      return Err(invalid("storage.bucket", "must not be empty"));
    }
    if self.cache.retention_secs == 0 {
      return Err(invalid("cache.retention_secs", "must be greater than zero"));
    }
    if self.poll.interval_secs == 0 {
      return Err(invalid("poll.interval_secs", "must be greater than zero"));
    }
    if self.poll.probe_timeout_secs == 0 {
      return Err(invalid(
        "poll.probe_timeout_secs",
        "must be greater than zero",
      ));
    }
    Ok(())
  }
}

impl EngineSettings {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

impl CacheSettings {
  pub fn retention(&self) -> Duration {
    Duration::from_secs(self.retention_secs)
  }
}

impl PollSettings {
  pub fn interval(&self) -> Duration {
    Duration::from_secs(self.interval_secs)
  }

  pub fn probe_timeout(&self) -> Duration {
    Duration::from_secs(self.probe_timeout_secs)
  }
}

fn invalid(field: &'static str, message: &str) -> ConfigError {
  ConfigError::Invalid {
    field,
    message: message.to_string(),
  }
}
