use std::time::Duration;

use async_trait::async_trait;
use mdflow_store::ExperimentStatus;
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Checks whether an artifact exists.
///
/// Implementations only ever answer `Running` or `Finished`.
#[async_trait]
pub trait ArtifactProbe: Send + Sync {
  async fn probe(&self, url: &str) -> ExperimentStatus;
}

/// Probes artifacts with an HTTP `HEAD` request.
#[derive(Debug, Clone)]
pub struct HttpArtifactProbe {
  client: Client,
}

impl HttpArtifactProbe {
  pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client })
  }
}

#[async_trait]
impl ArtifactProbe for HttpArtifactProbe {
  async fn probe(&self, url: &str) -> ExperimentStatus {
    match self.client.head(url).send().await {
      Ok(response) if response.status() == StatusCode::OK => ExperimentStatus::Finished,
      Ok(response) => {
        debug!(url, status = response.status().as_u16(), "artifact not available yet");
        ExperimentStatus::Running
      }
      Err(e) => {
        debug!(url, error = %e, "artifact probe inconclusive");
        ExperimentStatus::Running
      }
    }
  }
}
