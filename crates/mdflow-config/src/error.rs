use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The settings file could not be read.
  #[error("failed to read settings file '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The settings file is not valid JSON or has the wrong shape.
  #[error("failed to parse settings: {0}")]
  Parse(#[from] serde_json::Error),

  /// A field has a value the rest of the system cannot work with.
  #[error("invalid setting '{field}': {message}")]
  Invalid { field: &'static str, message: String },
}
