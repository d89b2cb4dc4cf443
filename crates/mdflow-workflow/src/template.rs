//! Workflow template rendering using minijinja.
//!
//! The template is a JSON workflow description with filename placeholders. It
//! is read and syntax-checked once; each submission renders it against fresh
//! [`Filenames`] and parses the result. Placeholders are strict: a name the
//! context does not provide fails the render instead of becoming "".

use std::fmt;
use std::path::Path;

use minijinja::{Environment, UndefinedBehavior, Value};
use tracing::debug;

use crate::description::WorkflowDescription;
use crate::error::WorkflowError;
use crate::filenames::Filenames;

const BUILTIN_NAME: &str = "workflow.json";
const BUILTIN_SOURCE: &str = include_str!("../templates/workflow.json");

/// A parsed workflow template.
pub struct WorkflowTemplate {
  name: String,
  source: String,
}

impl WorkflowTemplate {
  /// The template bundled with this crate.
  pub fn builtin() -> Result<Self, WorkflowError> {
    Self::from_source(BUILTIN_NAME, BUILTIN_SOURCE)
  }

  /// Read a template from disk.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| WorkflowError::TemplateRead {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_source(path.display().to_string(), source)
  }

  /// Build a template from its source text.
  ///
  /// Fails if the source is not valid minijinja syntax.
  pub fn from_source(
    name: impl Into<String>,
    source: impl Into<String>,
  ) -> Result<Self, WorkflowError> {
    let name = name.into();
    let source = source.into();

    environment()
      .template_from_str(&source)
      .map_err(|e| WorkflowError::TemplateSyntax {
        name: name.clone(),
        message: e.to_string(),
      })?;

    debug!(template = %name, "loaded workflow template");
    Ok(Self { name, source })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Render the template text for the given filenames.
  pub fn render_text(&self, filenames: &Filenames) -> Result<String, WorkflowError> {
    let ctx = Value::from_serialize(filenames);
    environment()
      .render_str(&self.source, ctx)
      .map_err(|e| WorkflowError::TemplateRender {
        name: self.name.clone(),
        message: e.to_string(),
      })
  }

  /// Render the template and parse it into a workflow description.
  pub fn render(&self, filenames: &Filenames) -> Result<WorkflowDescription, WorkflowError> {
    let text = self.render_text(filenames)?;
    serde_json::from_str(&text).map_err(|source| WorkflowError::InvalidDescription {
      name: self.name.clone(),
      source,
    })
  }
}

fn environment<'source>() -> Environment<'source> {
  let mut env = Environment::new();
  env.set_undefined_behavior(UndefinedBehavior::Strict);
  env
}

impl fmt::Debug for WorkflowTemplate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WorkflowTemplate")
      .field("name", &self.name)
      .finish_non_exhaustive()
  }
}
