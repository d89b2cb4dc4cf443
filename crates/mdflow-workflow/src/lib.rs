//! mdflow Workflow
//!
//! This crate turns user simulation parameters into a workflow description
//! the workflow engine accepts.
//!
//! # Flow
//! 1. A [`Stamp`] is taken and expanded into [`Filenames`] for the run's
//!    output archive and video.
//! 2. [`WorkflowTemplate::render`] substitutes the filenames into the
//!    template and parses the result into a [`WorkflowDescription`].
//! 3. [`apply_params`] writes the simulation arguments into every run step
//!    and, when no movie was requested, filters out the movie step together
//!    with the video signals and outputs.
//!
//! # Template placeholders
//! - `{{ archive_filename }}` - e.g. `md-simulation-1718000000000.tgz`
//! - `{{ video_filename }}` - e.g. `md-simulation-1718000000000.avi`

mod description;
mod error;
mod filenames;
mod mutate;
mod params;
mod template;

pub use description::{ExecutorConfig, ProcessConfig, ProcessStep, Signal, WorkflowDescription};
pub use error::{ValidationError, WorkflowError};
pub use filenames::{Filenames, Stamp};
pub use mutate::{MOVIE_PREFIX, RUN_PREFIX, VIDEO_SUFFIX, apply_params, format_end_time};
pub use params::SimulationParams;
pub use template::WorkflowTemplate;
