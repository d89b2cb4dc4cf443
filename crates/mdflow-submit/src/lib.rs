//! mdflow Submit
//!
//! Sends workflow descriptions to the workflow engine and interprets the
//! answer. The engine replies `201 Created` with a `Location` header naming
//! the tracking URL of the new run; anything else is a failed submission.
//!
//! Submissions are never retried here: the engine is not safe to call twice
//! for the same request, a duplicate would start a second run.

mod engine;
mod error;
mod http;

pub use engine::{Submission, WorkflowEngine};
pub use error::SubmitError;
pub use http::HttpWorkflowEngine;
