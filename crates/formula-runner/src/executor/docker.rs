//! Container executor: runs the prepared image with the working directory
//! staged at `/app`, then copies the results back.

use std::io::{IsTerminal, Write};
use std::process::Stdio;
use std::time::Instant;

use formula_core::{info_log, observability};
use tempfile::NamedTempFile;

use super::{exit_failure, Backend, Executor};
use crate::docker::{DockerCli, CONTAINER_WORKDIR};
use crate::error::{Result, RunnerError};
use crate::pre_run::{ContainerSpec, Setup};
use crate::process::Process;

#[derive(Debug, Clone, Default)]
pub struct DockerExecutor {
    docker: DockerCli,
    /// `None` means "detect from stdin".
    tty: Option<bool>,
}

impl DockerExecutor {
    pub fn new(docker: DockerCli) -> Self {
        Self { docker, tty: None }
    }

    /// Force (or suppress) `-t` / `-i` instead of detecting a terminal.
    pub fn with_tty(mut self, tty: bool) -> Self {
        self.tty = Some(tty);
        self
    }

    fn interactive(&self) -> bool {
        self.tty.unwrap_or_else(|| std::io::stdin().is_terminal())
    }

    /// Only the formula-specific variables cross into the container; the host
    /// environment stays on the host.
    fn write_env_file(&self, process: &Process) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()
            .map_err(|e| RunnerError::filesystem("failed to create", std::env::temp_dir(), e))?;
        for (key, value) in process.appended_env() {
            if value.contains('\n') {
                return Err(RunnerError::Container(format!(
                    "value of {} spans multiple lines and cannot be passed to a container",
                    key
                )));
            }
            writeln!(file, "{}={}", key, value)
                .map_err(|e| RunnerError::filesystem("failed to write", file.path(), e))?;
        }
        file.flush()
            .map_err(|e| RunnerError::filesystem("failed to write", file.path(), e))?;
        Ok(file)
    }

    fn docker_step<const N: usize>(&self, step: &str, args: [&str; N]) -> Result<()> {
        tracing::debug!(step = step, args = ?args, "docker");
        self.docker
            .run_captured(args)
            .map(|_| ())
            .map_err(|reason| RunnerError::Container(format!("{}: {}", step, reason)))
    }

    /// create → stage → start → copy back. Teardown is the caller's job.
    fn run_container(&self, spec: &ContainerSpec, setup: &Setup, env_file: &str) -> Result<()> {
        let interactive = self.interactive();
        let mut create = vec!["create", "-i"];
        if interactive {
            create.push("-t");
        }
        create.extend([
            "--env-file",
            env_file,
            "-w",
            CONTAINER_WORKDIR,
            "--name",
            spec.name.as_str(),
            spec.image.as_str(),
        ]);
        tracing::debug!(args = ?create, "docker");
        self.docker
            .run_captured(&create)
            .map_err(|reason| RunnerError::Container(format!("failed to create container: {}", reason)))?;

        let pwd = setup.pwd.to_string_lossy();
        let staged_from = format!("{}/.", pwd);
        let mount = format!("{}:{}", spec.name, CONTAINER_WORKDIR);
        self.docker_step(
            "failed to stage working directory",
            ["cp", staged_from.as_str(), mount.as_str()],
        )?;

        let mut start = self.docker.command();
        start.args(["start", "-a"]);
        if interactive {
            start.arg("-i");
        }
        let status = start
            .arg(&spec.name)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| RunnerError::Container(format!("failed to start container: {}", e)))?;
        if !status.success() {
            return Err(exit_failure(&setup.definition.display_name(), status));
        }

        let artifacts = format!("{}:{}/.", spec.name, CONTAINER_WORKDIR);
        self.docker_step(
            "failed to copy results back",
            ["cp", artifacts.as_str(), &*pwd],
        )
    }

    /// Remove the container. The image belongs to the pre-runner.
    fn teardown(&self, spec: &ContainerSpec) -> Result<()> {
        self.docker_step("failed to remove container", ["rm", "-f", spec.name.as_str()])
    }
}

impl Executor for DockerExecutor {
    fn backend(&self) -> Backend {
        Backend::Docker
    }

    fn execute(&self, process: &Process, setup: &Setup) -> Result<()> {
        let spec = setup.container.as_ref().ok_or_else(|| {
            RunnerError::Container("formula was not prepared for container execution".to_string())
        })?;
        let env_file = self.write_env_file(process)?;
        let env_path = env_file.path().to_string_lossy().into_owned();

        let formula = setup.definition.display_name();
        info_log!(formula = %formula, container = %spec.name, "Running formula in container...");
        observability::audit_execution_started(
            &formula,
            &spec.image,
            Backend::Docker.as_str(),
            &setup.pwd.to_string_lossy(),
        );
        let start = Instant::now();

        let result = self.run_container(spec, setup, &env_path);
        let teardown = self.teardown(spec);

        observability::audit_execution_completed(
            &formula,
            if result.is_ok() { 0 } else { 1 },
            start.elapsed().as_millis() as u64,
        );
        match (result, teardown) {
            (Err(e), Err(t)) => {
                tracing::warn!(error = %t, "Container teardown failed after an earlier error");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), teardown) => teardown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::test_support::setup;

    #[test]
    fn test_env_file_holds_only_appended_vars() {
        let mut p = Process::new("/bin/run.sh", "/work");
        p.inherit_env(vec![("HOST_SECRET".to_string(), "x".to_string())]);
        p.push_env("CURRENT_PWD", "/work");
        p.push_env("NAME", "dennis");

        let file = DockerExecutor::default().write_env_file(&p).unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "CURRENT_PWD=/work\nNAME=dennis\n");
    }

    #[test]
    fn test_multiline_value_is_rejected() {
        let mut p = Process::new("/bin/run.sh", "/work");
        p.push_env("NOTE", "a\nb");
        assert!(matches!(
            DockerExecutor::default().write_env_file(&p),
            Err(RunnerError::Container(_))
        ));
    }

    #[test]
    fn test_requires_container_spec() {
        let err = DockerExecutor::default()
            .execute(&Process::new("/bin/run.sh", "/work"), &setup(vec![]))
            .unwrap_err();
        assert!(matches!(err, RunnerError::Container(_)));
    }
}
