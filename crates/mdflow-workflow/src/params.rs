use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Parameters of one molecular-dynamics simulation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
  /// Number of molecules to simulate.
  pub molecules: u32,
  /// Temperature in degrees Celsius, 0..=100.
  pub temperature: i32,
  /// Simulated end time in seconds.
  pub simulation_end_time: f64,
  /// Render a movie of the run alongside the archive.
  #[serde(default)]
  pub record_movie: bool,
}

impl Default for SimulationParams {
  fn default() -> Self {
    Self {
      molecules: 1000,
      temperature: 85,
      simulation_end_time: 5.5,
      record_movie: false,
    }
  }
}

impl SimulationParams {
  /// Check ranges before anything is rendered or submitted.
  pub fn validate(&self) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    if self.molecules == 0 {
      violations.push((
        "molecules".to_string(),
        "number of molecules is required".to_string(),
      ));
    }
    if !(0..=100).contains(&self.temperature) {
      violations.push((
        "temperature".to_string(),
        "temperature must be between 0 and 100 degrees Celsius".to_string(),
      ));
    }
    if !self.simulation_end_time.is_finite() || self.simulation_end_time <= 0.0 {
      violations.push((
        "simulation_end_time".to_string(),
        "end time of simulation is required (in seconds)".to_string(),
      ));
    }

    if violations.is_empty() {
      Ok(())
    } else {
      Err(ValidationError { violations })
    }
  }
}
