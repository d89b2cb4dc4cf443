use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while producing a workflow description from the template.
///
/// Any of these fails the current submission; none of them is recoverable by
/// falling back to a default description.
#[derive(Debug, Error)]
pub enum WorkflowError {
  /// The template file could not be read.
  #[error("failed to read workflow template '{}': {source}", path.display())]
  TemplateRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The template is not valid minijinja syntax.
  #[error("invalid workflow template '{name}': {message}")]
  TemplateSyntax { name: String, message: String },

  /// Rendering failed, e.g. an unknown placeholder.
  #[error("failed to render workflow template '{name}': {message}")]
  TemplateRender { name: String, message: String },

  /// The rendered text is not a valid workflow description.
  #[error("rendered workflow template '{name}' is not a valid description: {source}")]
  InvalidDescription {
    name: String,
    #[source]
    source: serde_json::Error,
  },
}

/// Caller supplied parameters that cannot be submitted.
///
/// Carries every violation found, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid parameters: {}", format_violations(.violations))]
pub struct ValidationError {
  pub violations: Vec<(String, String)>,
}

impl ValidationError {
  pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      violations: vec![(field.into(), message.into())],
    }
  }

  /// Whether `field` has a violation.
  pub fn has(&self, field: &str) -> bool {
    self.violations.iter().any(|(f, _)| f == field)
  }
}

fn format_violations(violations: &[(String, String)]) -> String {
  violations
    .iter()
    .map(|(field, message)| format!("{}: {}", field, message))
    .collect::<Vec<_>>()
    .join("; ")
}
