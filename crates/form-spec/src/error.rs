use thiserror::Error;

use crate::spec::check::DefinitionIssue;

/// Failures surfaced while loading or checking a form definition.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("failed to parse form definition: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to parse form values: {0}")]
    Values(#[source] serde_json::Error),
    #[error("form definition has {} problem(s); first: {}", .0.len(), first_message(.0))]
    Definition(Vec<DefinitionIssue>),
}

fn first_message(issues: &[DefinitionIssue]) -> &str {
    issues
        .first()
        .map(|issue| issue.message.as_str())
        .unwrap_or("<none>")
}

/// Error returned by an embedding application's submission callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallbackError {
    pub message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
