use mdflow_submit::SubmitError;
use mdflow_workflow::{ValidationError, WorkflowError};
use thiserror::Error;

/// Errors surfaced to callers of the experiment service.
///
/// Each one fails only the request at hand.
#[derive(Debug, Error)]
pub enum ExperimentError {
  /// Parameters were rejected before anything was submitted.
  #[error(transparent)]
  Validation(#[from] ValidationError),

  /// The workflow description could not be produced.
  #[error(transparent)]
  Template(#[from] WorkflowError),

  /// The workflow engine could not be reached or refused the workflow.
  #[error(transparent)]
  Submission(#[from] SubmitError),

  /// No live experiment with this id.
  #[error("experiment not found: {0}")]
  NotFound(String),

  /// The service could not be constructed from its settings.
  #[error("failed to set up experiment service: {message}")]
  Setup { message: String },
}
