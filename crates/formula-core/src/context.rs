//! Named execution contexts (e.g. `staging`, `prod`).
//!
//! Switching contexts is handled elsewhere; this module only reads the
//! active one from `<home>/contexts`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read contexts file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed contexts file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Snapshot of the context store. `current` is empty when no context is active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextHolder {
    #[serde(rename = "current_context", default)]
    pub current: String,
    #[serde(default)]
    pub all: Vec<String>,
}

impl ContextHolder {
    pub fn is_active(&self) -> bool {
        !self.current.is_empty()
    }
}

/// Read the contexts file. A missing file means no context has been set yet.
pub fn read_contexts(path: &Path) -> Result<ContextHolder, ContextError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ContextHolder::default());
        }
        Err(source) => {
            return Err(ContextError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(ContextHolder::default());
    }
    serde_json::from_str(&content).map_err(|source| ContextError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
