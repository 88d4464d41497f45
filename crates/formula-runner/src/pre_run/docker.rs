//! Container pre-runner: the local pre-run plus an image build per run.

use std::path::PathBuf;
use std::sync::Arc;

use formula_core::formula::{Definition, TargetOs, DOCKERFILE};
use formula_core::info_log;

use super::builder::DockerBuilder;
use super::{ContainerSpec, LocalPreRunner, PreRunner, Setup};
use crate::docker::DockerCli;
use crate::error::{Result, RunnerError};

/// Builds the artifact inside the builder image, then an execution image from
/// the formula's `Dockerfile` (build context = formula directory).
pub struct DockerPreRunner {
    local: LocalPreRunner,
    docker: DockerCli,
}

impl DockerPreRunner {
    pub fn new(home: impl Into<PathBuf>, docker: DockerCli) -> Self {
        let builder = Arc::new(DockerBuilder::new(docker.clone()));
        Self {
            // The builder image runs the unix recipe whatever the host is.
            local: LocalPreRunner::new(home, builder).with_target(TargetOs::Unix),
            docker,
        }
    }

    /// Same as `LocalPreRunner::with_working_dir`.
    pub fn with_working_dir(mut self, pwd: impl Into<PathBuf>) -> Self {
        self.local = self.local.with_working_dir(pwd);
        self
    }
}

/// Unique image tag and container name for one run.
fn container_spec() -> ContainerSpec {
    let id = uuid::Uuid::new_v4().simple().to_string();
    ContainerSpec {
        image: format!("formula-{}", id),
        name: format!("formula-run-{}", id),
    }
}

impl PreRunner for DockerPreRunner {
    fn pre_run(&self, def: &Definition) -> Result<Setup> {
        self.docker.ensure_available()?;

        let mut setup = self.local.pre_run(def)?;

        let dockerfile = setup.formula_path.join(DOCKERFILE);
        if !dockerfile.is_file() {
            return Err(RunnerError::NotFound(format!(
                "'{}' cannot run in a container: {} does not exist",
                def.path,
                dockerfile.display()
            )));
        }

        let spec = container_spec();
        info_log!(formula = %def.display_name(), image = %spec.image, "Building container image...");
        let context = setup.formula_path.to_string_lossy().into_owned();
        self.docker
            .run_captured(["build", "-t", spec.image.as_str(), context.as_str()])
            .map_err(|reason| RunnerError::BuildFailure(format!("image build failed: {}", reason)))?;

        setup.container = Some(spec);
        Ok(setup)
    }

    /// Remove the per-run image. A failure here only logs.
    fn cleanup(&self, setup: &Setup) {
        let Some(spec) = &setup.container else {
            return;
        };
        tracing::debug!(image = %spec.image, "Removing formula image");
        if let Err(reason) = self.docker.run_captured(["rmi", "-f", spec.image.as_str()]) {
            tracing::warn!(image = %spec.image, reason = %reason, "Failed to remove formula image");
        }
    }
}
