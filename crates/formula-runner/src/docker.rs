//! Thin wrapper over the `docker` CLI shared by the builder, pre-runner and executor.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Result, RunnerError};

/// Directory inside the container where the working directory is staged.
pub const CONTAINER_WORKDIR: &str = "/app";

#[derive(Debug, Clone)]
pub struct DockerCli {
    bin: PathBuf,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// A `docker` command with nothing configured yet.
    pub fn command(&self) -> Command {
        Command::new(&self.bin)
    }

    /// Run with captured output. `Err` carries a human-readable reason: the spawn
    /// error, or stderr (stdout when stderr is empty) of a non-zero exit.
    pub fn run_captured<I, S>(&self, args: I) -> std::result::Result<String, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let out = self
            .command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| format!("failed to invoke {}: {}", self.bin.display(), e))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                String::from_utf8_lossy(&out.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(format!(
                "{} exited with {}: {}",
                self.bin.display(),
                out.status.code().map_or("signal".to_string(), |c| c.to_string()),
                detail
            ));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    /// Fails with `Container` when the runtime does not answer `docker version`.
    pub fn ensure_available(&self) -> Result<()> {
        self.run_captured(["version"]).map(|_| ()).map_err(|reason| {
            RunnerError::Container(format!(
                "docker is not installed or the daemon is not running ({})",
                reason
            ))
        })
    }
}
