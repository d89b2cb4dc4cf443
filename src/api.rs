//! JSON API over the experiment service.
//!
//! - POST /experiments - submit a simulation
//! - GET /experiments - experiments still remembered, most recent first
//! - GET /experiments/:id - one experiment
//! - GET /experiments/:id/status - probe one experiment
//! - GET /status?resource=<url> - probe an arbitrary artifact URL
//! - POST /workflows - submit a hand-written workflow body as is

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::{get, post},
};
use mdflow_experiments::{ExperimentError, ExperimentService};
use mdflow_store::ExperimentStatus;
use mdflow_submit::SubmitError;
use mdflow_workflow::SimulationParams;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub fn router(service: Arc<ExperimentService>) -> Router {
  Router::new()
    .route("/experiments", post(submit_experiment).get(list_experiments))
    .route("/experiments/:id", get(get_experiment))
    .route("/experiments/:id/status", get(experiment_status))
    .route("/status", get(artifact_status))
    .route("/workflows", post(submit_workflow))
    .with_state(service)
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
  resource: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusBody {
  #[serde(skip_serializing_if = "Option::is_none")]
  id: Option<String>,
  status: ExperimentStatus,
}

async fn submit_experiment(
  State(service): State<Arc<ExperimentService>>,
  payload: Result<Json<SimulationParams>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(params) = payload.map_err(|rejection| ApiError::bad_request(&rejection.body_text()))?;
  let submitted = service.submit(params).await?;
  Ok((StatusCode::CREATED, Json(submitted)))
}

async fn list_experiments(State(service): State<Arc<ExperimentService>>) -> impl IntoResponse {
  Json(service.list_active())
}

async fn get_experiment(
  State(service): State<Arc<ExperimentService>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  Ok(Json(service.get(&id)?))
}

async fn experiment_status(
  State(service): State<Arc<ExperimentService>>,
  Path(id): Path<String>,
) -> impl IntoResponse {
  let status = service.check_status(&id).await;
  Json(StatusBody {
    id: Some(id),
    status,
  })
}

async fn artifact_status(
  State(service): State<Arc<ExperimentService>>,
  Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
  let resource = query
    .resource
    .filter(|r| !r.trim().is_empty())
    .ok_or_else(|| ApiError::bad_request("missing 'resource' query parameter"))?;

  let status = service.check_artifact(&resource).await;
  Ok(Json(StatusBody { id: None, status }))
}

async fn submit_workflow(
  State(service): State<Arc<ExperimentService>>,
  body: String,
) -> Result<impl IntoResponse, ApiError> {
  let submission = service.submit_raw(body).await?;
  Ok((StatusCode::CREATED, Json(submission)))
}

/// An error response: status code plus a JSON body.
#[derive(Debug)]
pub struct ApiError {
  status: StatusCode,
  body: serde_json::Value,
}

impl ApiError {
  fn bad_request(message: &str) -> Self {
    Self {
      status: StatusCode::BAD_REQUEST,
      body: serde_json::json!({ "error": message }),
    }
  }
}

impl From<ExperimentError> for ApiError {
  fn from(err: ExperimentError) -> Self {
    let message = err.to_string();
    let (status, body) = match &err {
      ExperimentError::Validation(validation) => {
        let violations: serde_json::Map<String, serde_json::Value> = validation
          .violations
          .iter()
          .map(|(field, message)| (field.clone(), serde_json::Value::from(message.as_str())))
          .collect();
        (
          StatusCode::BAD_REQUEST,
          serde_json::json!({ "error": message, "violations": violations }),
        )
      }
      ExperimentError::NotFound(_) => (
        StatusCode::NOT_FOUND,
        serde_json::json!({ "error": message }),
      ),
      ExperimentError::Submission(SubmitError::Protocol { status, .. }) => (
        StatusCode::BAD_GATEWAY,
        serde_json::json!({ "error": message, "upstream_status": status }),
      ),
      ExperimentError::Submission(SubmitError::Serialize(_)) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        serde_json::json!({ "error": message }),
      ),
      ExperimentError::Submission(_) => (
        StatusCode::BAD_GATEWAY,
        serde_json::json!({ "error": message }),
      ),
      ExperimentError::Template(_) | ExperimentError::Setup { .. } => (
        StatusCode::INTERNAL_SERVER_ERROR,
        serde_json::json!({ "error": message }),
      ),
    };

    if status.is_server_error() {
      warn!(status = status.as_u16(), error = %message, "request failed");
    }
    Self { status, body }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status, Json(self.body)).into_response()
  }
}
