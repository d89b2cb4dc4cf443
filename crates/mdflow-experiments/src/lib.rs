//! mdflow Experiments
//!
//! The operations a front end needs: submit a simulation, list the
//! experiments still remembered, and check or watch their status.
//!
//! ```text
//! SimulationParams ─► validate ─► WorkflowTemplate::render ─► apply_params
//!                                                                  │
//!                     ExperimentStore ◄── record ◄── WorkflowEngine::submit
//!                           ▲
//!                           └── StatusPoller (on demand / background)
//! ```
//!
//! A submission that fails at any step leaves the store untouched.

mod error;
mod service;

pub use error::ExperimentError;
pub use service::{ExperimentService, RAW_WORKFLOW_PLACEHOLDER, SubmittedExperiment};
