use chrono::{DateTime, Utc};
use mdflow_workflow::{Filenames, SimulationParams, Stamp, WorkflowDescription, format_end_time};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperimentStatus {
  /// Submitted, archive not yet in object storage.
  Running,
  /// Archive confirmed in object storage.
  Finished,
  /// No record (never submitted, or evicted).
  Unknown,
}

impl ExperimentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ExperimentStatus::Running => "Running",
      ExperimentStatus::Finished => "Finished",
      ExperimentStatus::Unknown => "Unknown",
    }
  }
}

impl std::fmt::Display for ExperimentStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One submitted simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
  /// The submission stamp in decimal.
  pub id: String,
  pub submitted_at: DateTime<Utc>,
  pub molecules: String,
  pub temperature: String,
  pub simulation_end_time: String,
  pub status: ExperimentStatus,
  /// Output archive filename.
  pub archive: String,
  /// Movie filename, present only when a movie was requested.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub video: Option<String>,
  /// Engine URL tracking the run.
  pub tracking_url: String,
  /// The description that was submitted.
  pub workflow: WorkflowDescription,
}

impl ExperimentRecord {
  /// Build the record of a freshly accepted submission.
  pub fn new(
    stamp: Stamp,
    params: &SimulationParams,
    filenames: &Filenames,
    tracking_url: impl Into<String>,
    workflow: WorkflowDescription,
  ) -> Self {
    let submitted_at =
      DateTime::from_timestamp_millis(stamp.as_millis() as i64).unwrap_or_else(Utc::now);

    Self {
      id: stamp.to_string(),
      submitted_at,
      molecules: params.molecules.to_string(),
      temperature: params.temperature.to_string(),
      simulation_end_time: format_end_time(params.simulation_end_time),
      status: ExperimentStatus::Running,
      archive: filenames.archive_filename.clone(),
      video: params
        .record_movie
        .then(|| filenames.video_filename.clone()),
      tracking_url: tracking_url.into(),
      workflow,
    }
  }

  /// Submission time the way the experiment table shows it, e.g.
  /// `Jun 10 06:13:20`.
  pub fn display_stamp(&self) -> String {
    self.submitted_at.format("%b %e %H:%M:%S").to_string()
  }

  pub fn is_finished(&self) -> bool {
    self.status == ExperimentStatus::Finished
  }
}
