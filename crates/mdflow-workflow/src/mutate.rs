//! Writes simulation parameters into a rendered workflow description.

use std::collections::HashSet;

use tracing::debug;

use crate::description::WorkflowDescription;
use crate::filenames::Filenames;
use crate::params::SimulationParams;

/// Name prefix of the processes that run the simulation binary.
pub const RUN_PREFIX: &str = "run-cmd";

/// Name prefix of the processes that render the movie.
pub const MOVIE_PREFIX: &str = "make-movie";

/// Suffix of video artifact names.
pub const VIDEO_SUFFIX: &str = ".avi";

/// Render the simulation end time as the shortest decimal that parses back to
/// the same value (`5.5` → `"5.5"`, `5.0` → `"5"`).
pub fn format_end_time(seconds: f64) -> String {
  format!("{}", seconds)
}

/// Apply user parameters to a rendered description.
///
/// Every run step gets exactly `[molecules, end_time, temperature, archive]`
/// as its arguments. Without a movie, the movie steps, the video signals and
/// outputs, and any channel only the movie steps produced are filtered out.
///
/// Parameters are assumed to be validated already.
pub fn apply_params(
  mut description: WorkflowDescription,
  params: &SimulationParams,
  filenames: &Filenames,
) -> WorkflowDescription {
  let args = vec![
    params.molecules.to_string(),
    format_end_time(params.simulation_end_time),
    params.temperature.to_string(),
    filenames.archive_filename.clone(),
  ];

  for process in description
    .processes
    .iter_mut()
    .filter(|p| p.name.starts_with(RUN_PREFIX))
  {
    process.config.executor.args = args.clone();
  }

  if !params.record_movie {
    description = remove_movie(description);
  }

  description
}

fn remove_movie(description: WorkflowDescription) -> WorkflowDescription {
  let (removed, processes): (Vec<_>, Vec<_>) = description
    .processes
    .into_iter()
    .partition(|p| p.name.starts_with(MOVIE_PREFIX));

  // Outputs of the removed steps that nothing left behind still touches.
  let still_used: HashSet<&str> = processes
    .iter()
    .flat_map(|p| p.ins.iter().chain(p.outs.iter()))
    .map(String::as_str)
    .collect();
  let orphaned: HashSet<String> = removed
    .iter()
    .flat_map(|p| p.outs.iter())
    .filter(|name| !still_used.contains(name.as_str()))
    .cloned()
    .collect();

  let is_dropped = |name: &str| name.ends_with(VIDEO_SUFFIX) || orphaned.contains(name);

  let signals = description
    .signals
    .into_iter()
    .filter(|s| !is_dropped(&s.name))
    .collect();
  let outs = description
    .outs
    .into_iter()
    .filter(|name| !is_dropped(name))
    .collect();

  debug!(
    removed_processes = removed.len(),
    orphaned_channels = orphaned.len(),
    "removed movie generation from workflow"
  );

  WorkflowDescription {
    processes,
    signals,
    ins: description.ins,
    outs,
  }
}
