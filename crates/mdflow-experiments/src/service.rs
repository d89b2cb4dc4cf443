use std::sync::Arc;

use mdflow_config::Settings;
use mdflow_poller::{ArtifactLocator, ArtifactProbe, HttpArtifactProbe, StatusPoller};
use mdflow_store::{ExperimentRecord, ExperimentStatus, ExperimentStore};
use mdflow_submit::{HttpWorkflowEngine, Submission, WorkflowEngine};
use mdflow_workflow::{
  Filenames, SimulationParams, Stamp, ValidationError, WorkflowDescription, WorkflowTemplate,
  apply_params,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ExperimentError;

/// Text shown in an empty raw-workflow form; submitting it unchanged is
/// treated like submitting nothing.
pub const RAW_WORKFLOW_PLACEHOLDER: &str = "Please add your HyperFlow workflow description here...";

/// A simulation accepted by the workflow engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedExperiment {
  pub tracking_url: String,
  /// Where the archive will appear in object storage.
  pub artifact_url: String,
  pub record: ExperimentRecord,
}

/// Submits simulations and tracks the resulting experiments.
pub struct ExperimentService {
  template: WorkflowTemplate,
  engine: Arc<dyn WorkflowEngine>,
  store: Arc<ExperimentStore>,
  poller: StatusPoller,
  locator: ArtifactLocator,
  auto_watch: bool,
}

impl ExperimentService {
  pub fn new(
    template: WorkflowTemplate,
    engine: Arc<dyn WorkflowEngine>,
    probe: Arc<dyn ArtifactProbe>,
    store: Arc<ExperimentStore>,
    locator: ArtifactLocator,
    settings: &Settings,
  ) -> Self {
    let poller = StatusPoller::new(probe, store.clone(), settings.poll.interval());
    Self {
      template,
      engine,
      store,
      poller,
      locator,
      auto_watch: settings.poll.auto_watch,
    }
  }

  /// Build a service talking HTTP to the configured engine and object store.
  pub fn from_settings(settings: &Settings) -> Result<Self, ExperimentError> {
    let template = match &settings.template_path {
      Some(path) => WorkflowTemplate::load(path)?,
      None => WorkflowTemplate::builtin()?,
    };
    let engine = HttpWorkflowEngine::new(&settings.engine.url, settings.engine.timeout())?;
    let probe =
      HttpArtifactProbe::new(settings.poll.probe_timeout()).map_err(|e| ExperimentError::Setup {
        message: format!("failed to create artifact probe: {}", e),
      })?;
    let store = Arc::new(ExperimentStore::new(settings.cache.retention()));
    let locator = ArtifactLocator::from_settings(&settings.storage);

    info!(
      template = %template.name(),
      engine = %engine.url(),
      artifacts = %locator.prefix(),
      "experiment service configured"
    );

    Ok(Self::new(
      template,
      Arc::new(engine),
      Arc::new(probe),
      store,
      locator,
      settings,
    ))
  }

  pub fn store(&self) -> &Arc<ExperimentStore> {
    &self.store
  }

  pub fn poller(&self) -> &StatusPoller {
    &self.poller
  }

  /// Render and parameterize a workflow without submitting it.
  pub fn render_preview(
    &self,
    params: &SimulationParams,
  ) -> Result<(Filenames, WorkflowDescription), ExperimentError> {
    params.validate()?;
    let filenames = Filenames::for_stamp(Stamp::now());
    let description = self.prepare(params, &filenames)?;
    Ok((filenames, description))
  }

  fn prepare(
    &self,
    params: &SimulationParams,
    filenames: &Filenames,
  ) -> Result<WorkflowDescription, ExperimentError> {
    let rendered = self.template.render(filenames)?;
    Ok(apply_params(rendered, params, filenames))
  }

  /// Submit a new simulation and start tracking it.
  ///
  /// Nothing is recorded unless the engine accepted the workflow.
  pub async fn submit(
    &self,
    params: SimulationParams,
  ) -> Result<SubmittedExperiment, ExperimentError> {
    params.validate()?;

    let stamp = Stamp::now();
    let filenames = Filenames::for_stamp(stamp);
    let description = self.prepare(&params, &filenames)?;

    let Submission { tracking_url } = self.engine.submit(&description).await?;

    let record = ExperimentRecord::new(stamp, &params, &filenames, &tracking_url, description);
    let artifact_url = self.artifact_url(&record);

    if !self.store.record_new(record.clone()) {
      warn!(experiment_id = %record.id, "experiment id already recorded");
    }
    if self.auto_watch {
      self.poller.watch(&record.id, &artifact_url);
    }

    info!(
      experiment_id = %record.id,
      tracking_url = %tracking_url,
      molecules = %record.molecules,
      temperature = %record.temperature,
      simulation_end_time = %record.simulation_end_time,
      movie = record.video.is_some(),
      "experiment submitted"
    );

    Ok(SubmittedExperiment {
      tracking_url,
      artifact_url,
      record,
    })
  }

  /// Forward a user-written workflow body to the engine as is.
  ///
  /// No experiment is recorded for raw submissions.
  pub async fn submit_raw(&self, body: String) -> Result<Submission, ExperimentError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == RAW_WORKFLOW_PLACEHOLDER {
      return Err(ValidationError::single("workflow", "workflow description is required").into());
    }

    let submission = self.engine.submit_raw(body).await?;
    info!(tracking_url = %submission.tracking_url, "raw workflow submitted");
    Ok(submission)
  }

  /// Experiments still in the store, most recent first.
  pub fn list_active(&self) -> Vec<ExperimentRecord> {
    self.store.list_active()
  }

  pub fn get(&self, id: &str) -> Result<ExperimentRecord, ExperimentError> {
    self
      .store
      .get(id)
      .ok_or_else(|| ExperimentError::NotFound(id.to_string()))
  }

  /// Probe a stored experiment once. `Unknown` if it is no longer stored.
  pub async fn check_status(&self, id: &str) -> ExperimentStatus {
    let Some(record) = self.store.get(id) else {
      return ExperimentStatus::Unknown;
    };
    let url = self.artifact_url(&record);
    self.poller.check_experiment(id, &url).await
  }

  /// Probe an arbitrary artifact URL once.
  pub async fn check_artifact(&self, url: &str) -> ExperimentStatus {
    self.poller.check_once(url).await
  }

  pub fn artifact_url(&self, record: &ExperimentRecord) -> String {
    self.locator.url_for(&record.archive)
  }

  /// Start a background poll for a stored experiment.
  ///
  /// Returns `false` if it was already being watched.
  pub fn watch(&self, id: &str) -> Result<bool, ExperimentError> {
    let record = self.get(id)?;
    let url = self.artifact_url(&record);
    Ok(self.poller.watch(id, &url).is_some())
  }

  pub fn stop_watching(&self, id: &str) -> bool {
    self.poller.cancel(id)
  }

  /// Stop every background poll.
  pub fn shutdown(&self) {
    info!(watched = self.poller.watched().len(), "shutting down experiment service");
    self.poller.shutdown();
  }
}
