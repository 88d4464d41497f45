//! Executors launch a prepared formula. The backend is picked once per
//! invocation and both implementations sit behind `Executor`.

pub mod docker;
pub mod local;

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, RunnerError};
use crate::pre_run::Setup;
use crate::process::Process;

pub use docker::DockerExecutor;
pub use local::LocalExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Local,
    Docker,
}

impl Backend {
    /// Whether the formula runs isolated from the host (drives `DOCKER_EXECUTION`).
    pub fn is_sandboxed(&self) -> bool {
        matches!(self, Self::Docker)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Docker => "docker",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "" => Ok(Self::Local),
            "docker" | "container" => Ok(Self::Docker),
            other => Err(RunnerError::Container(format!(
                "unknown runner backend '{}' (expected local or docker)",
                other
            ))),
        }
    }
}

pub trait Executor: Send + Sync {
    fn backend(&self) -> Backend;

    /// Run the fully composed process to completion.
    fn execute(&self, process: &Process, setup: &Setup) -> Result<()>;
}

/// `Execution` error for a finished child with a non-zero status.
pub(crate) fn exit_failure(what: &str, status: std::process::ExitStatus) -> RunnerError {
    match status.code() {
        Some(code) => RunnerError::Execution(format!("{} exited with status {}", what, code)),
        None => RunnerError::Execution(format!("{} was terminated by a signal", what)),
    }
}
