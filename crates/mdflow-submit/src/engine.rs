use async_trait::async_trait;
use mdflow_workflow::WorkflowDescription;
use serde::{Deserialize, Serialize};

use crate::error::SubmitError;

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
  /// Where the engine reports progress of the new run.
  pub tracking_url: String,
}

/// A workflow engine that accepts workflow descriptions.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
  /// Submit an already serialized workflow body.
  async fn submit_raw(&self, body: String) -> Result<Submission, SubmitError>;

  /// Serialize and submit a workflow description.
  async fn submit(&self, description: &WorkflowDescription) -> Result<Submission, SubmitError> {
    let body = serde_json::to_string(description)?;
    self.submit_raw(body).await
  }
}
