use thiserror::Error;

/// Errors that can occur while submitting a workflow.
#[derive(Debug, Error)]
pub enum SubmitError {
  /// The description could not be serialized.
  #[error("failed to serialize workflow description: {0}")]
  Serialize(#[from] serde_json::Error),

  /// The engine could not be reached (connection refused, DNS, timeout).
  #[error("workflow engine unreachable at '{url}': {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The engine answered with something other than 201 Created.
  #[error("workflow engine rejected submission with status {status}: {detail}")]
  Protocol { status: u16, detail: String },

  /// The engine answered 201 but without a Location header.
  #[error("workflow engine response has no Location header")]
  MissingLocation,

  /// The Location header is not a usable URL.
  #[error("workflow engine returned an invalid Location '{location}': {message}")]
  InvalidLocation { location: String, message: String },
}

impl SubmitError {
  /// Whether the engine could not be reached at all.
  pub fn is_transport(&self) -> bool {
    matches!(self, SubmitError::Transport { .. })
  }

  /// Whether the engine was reached but the exchange failed.
  pub fn is_protocol(&self) -> bool {
    matches!(
      self,
      SubmitError::Protocol { .. }
        | SubmitError::MissingLocation
        | SubmitError::InvalidLocation { .. }
    )
  }

  /// Whether the request was abandoned after the submission timeout.
  pub fn is_timeout(&self) -> bool {
    match self {
      SubmitError::Transport { source, .. } => source.is_timeout(),
      _ => false,
    }
  }
}
