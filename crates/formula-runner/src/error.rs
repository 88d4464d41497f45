//! The single error surface of the runtime.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by every runner component.
///
/// Components hand these back unchanged; the orchestrator never wraps them, so
/// the message a collaborator produced is the one the user sees.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("formula not found: {0}")]
    NotFound(String),

    #[error("formula build failed: {0}")]
    BuildFailure(String),

    #[error("input channel not recognized: {0}")]
    UnrecognizedChannel(String),

    #[error("invalid value for input '{input}': {reason}")]
    InputValidation { input: String, reason: String },

    #[error("failed to look up the active context: {0}")]
    ContextLookup(String),

    #[error("formula execution failed: {0}")]
    Execution(String),

    #[error("{action} {}: {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("container runtime failure: {0}")]
    Container(String),
}

impl RunnerError {
    pub fn filesystem(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InputValidation {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
