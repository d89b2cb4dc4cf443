use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONNECTION, CONTENT_TYPE, LOCATION};
use reqwest::{Client, StatusCode};
use tracing::{info, warn};
use url::Url;

use crate::engine::{Submission, WorkflowEngine};
use crate::error::SubmitError;

const MEDIA_TYPE: &str = "application/json";

/// Longest slice of an error response body carried in [`SubmitError::Protocol`].
const MAX_DETAIL_LEN: usize = 512;

/// Workflow engine reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpWorkflowEngine {
  client: Client,
  url: String,
}

impl HttpWorkflowEngine {
  /// Create a client posting to `url`, giving up on a submission after
  /// `timeout`.
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SubmitError> {
    let url = url.into();
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|source| SubmitError::Transport {
        url: url.clone(),
        source,
      })?;
    Ok(Self { client, url })
  }

  /// The endpoint submissions are posted to.
  pub fn url(&self) -> &str {
    &self.url
  }

  /// Turn a Location header value into a tracking URL.
  ///
  /// Absolute values are kept verbatim; relative ones are resolved against
  /// the engine URL.
  fn tracking_url(&self, location: &str) -> Result<String, SubmitError> {
    let location = location.trim();
    if location.is_empty() {
      return Err(SubmitError::MissingLocation);
    }

    match Url::parse(location) {
      Ok(_) => Ok(location.to_string()),
      Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&self.url)
        .and_then(|base| base.join(location))
        .map(|resolved| resolved.to_string())
        .map_err(|e| invalid_location(location, e)),
      Err(e) => Err(invalid_location(location, e)),
    }
  }
}

#[async_trait]
impl WorkflowEngine for HttpWorkflowEngine {
  async fn submit_raw(&self, body: String) -> Result<Submission, SubmitError> {
    let response = self
      .client
      .post(&self.url)
      .header(CONTENT_TYPE, MEDIA_TYPE)
      .header(CONNECTION, "close")
      .body(body)
      .send()
      .await
      .map_err(|source| {
        warn!(url = %self.url, error = %source, "workflow engine unreachable");
        SubmitError::Transport {
          url: self.url.clone(),
          source,
        }
      })?;

    let status = response.status();
    if status != StatusCode::CREATED {
      let detail = error_detail(status, response.text().await.unwrap_or_default());
      warn!(url = %self.url, status = status.as_u16(), %detail, "workflow engine rejected submission");
      return Err(SubmitError::Protocol {
        status: status.as_u16(),
        detail,
      });
    }

    let location = match response.headers().get(LOCATION) {
      Some(value) => value.to_str().map_err(|e| SubmitError::InvalidLocation {
        location: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        message: e.to_string(),
      })?,
      None => return Err(SubmitError::MissingLocation),
    };
    let tracking_url = self.tracking_url(location)?;

    info!(url = %self.url, tracking_url = %tracking_url, "workflow submitted");
    Ok(Submission { tracking_url })
  }
}

fn invalid_location(location: &str, error: url::ParseError) -> SubmitError {
  SubmitError::InvalidLocation {
    location: location.to_string(),
    message: error.to_string(),
  }
}

fn error_detail(status: StatusCode, body: String) -> String {
  let body = body.trim();
  if body.is_empty() {
    return status
      .canonical_reason()
      .unwrap_or("no response body")
      .to_string();
  }
  match body.char_indices().nth(MAX_DETAIL_LEN) {
    Some((end, _)) => format!("{}...", &body[..end]),
    None => body.to_string(),
  }
}
