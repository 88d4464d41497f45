//! Pre-run: turn a formula `Definition` into a ready-to-execute `Setup`,
//! building the artifact on demand.

pub mod builder;
pub mod docker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use formula_core::formula::{Definition, FormulaConfig, ManifestError, TargetOs};
use formula_core::info_log;

use crate::error::{Result, RunnerError};
use builder::Builder;

pub use docker::DockerPreRunner;

/// Image and container names for one sandboxed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub name: String,
}

/// Build-output descriptor consumed by an executor.
///
/// Produced fresh for every run and only valid for the definition it came from.
#[derive(Debug, Clone)]
pub struct Setup {
    pub definition: Definition,
    /// Directory the user invoked the formula from.
    pub pwd: PathBuf,
    pub formula_path: PathBuf,
    pub bin_path: PathBuf,
    pub bin_name: String,
    pub config: FormulaConfig,
    /// Present only when the container backend prepared an image.
    pub container: Option<ContainerSpec>,
}

impl Setup {
    pub fn bin_file(&self) -> PathBuf {
        self.bin_path.join(&self.bin_name)
    }
}

/// Prepares a formula for execution.
pub trait PreRunner: Send + Sync {
    fn pre_run(&self, def: &Definition) -> Result<Setup>;

    /// Release whatever `pre_run` created for this run. Called once per
    /// successful `pre_run`, whether or not the run got as far as executing.
    fn cleanup(&self, _setup: &Setup) {}
}

/// Host pre-runner: loads the manifest and builds `bin/` when it is missing.
pub struct LocalPreRunner {
    home: PathBuf,
    builder: Arc<dyn Builder>,
    pwd: Option<PathBuf>,
    /// Platform whose entrypoint the build must produce.
    target: TargetOs,
}

impl LocalPreRunner {
    pub fn new(home: impl Into<PathBuf>, builder: Arc<dyn Builder>) -> Self {
        Self {
            home: home.into(),
            builder,
            pwd: None,
            target: TargetOs::host(),
        }
    }

    /// Expect the entrypoint for `target` instead of the host's.
    pub fn with_target(mut self, target: TargetOs) -> Self {
        self.target = target;
        self
    }

    /// Use `pwd` as the invoking directory instead of the process's current one.
    pub fn with_working_dir(mut self, pwd: impl Into<PathBuf>) -> Self {
        self.pwd = Some(pwd.into());
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    fn working_dir(&self) -> Result<PathBuf> {
        match &self.pwd {
            Some(p) => Ok(p.clone()),
            None => std::env::current_dir()
                .map_err(|e| RunnerError::filesystem("failed to read working directory", ".", e)),
        }
    }

    fn build(&self, def: &Definition, formula_path: &Path, config: &FormulaConfig, bin_path: &Path) -> Result<()> {
        info_log!(
            formula = %def.display_name(),
            builder = self.builder.name(),
            "Building formula..."
        );
        if let Err(e) = self.builder.build(formula_path, config) {
            // Drop the partial output so the next run rebuilds from scratch.
            if bin_path.exists() {
                if let Err(rm) = std::fs::remove_dir_all(bin_path) {
                    tracing::warn!(path = %bin_path.display(), error = %rm, "Failed to remove partial build output");
                }
            }
            return Err(e);
        }
        info_log!(formula = %def.display_name(), "Build completed");
        Ok(())
    }
}

impl PreRunner for LocalPreRunner {
    fn pre_run(&self, def: &Definition) -> Result<Setup> {
        let pwd = self.working_dir()?;
        let formula_path = def.formula_path(&self.home);
        if !formula_path.is_dir() {
            return Err(RunnerError::NotFound(format!(
                "'{}' does not exist in repository '{}' ({})",
                def.path,
                def.repo_name,
                formula_path.display()
            )));
        }

        let config = FormulaConfig::load(&formula_path).map_err(|e| match e {
            ManifestError::Missing(path) => RunnerError::NotFound(format!(
                "'{}' in repository '{}' has no manifest at {}",
                def.path,
                def.repo_name,
                path.display()
            )),
            ManifestError::Read { path, source } => {
                RunnerError::filesystem("failed to read formula manifest", path, source)
            }
            invalid @ ManifestError::Invalid { .. } => RunnerError::BuildFailure(invalid.to_string()),
        })?;

        let bin_path = def.bin_path(&formula_path);
        let bin_name = config.bin_name_for(self.target).to_string();
        let bin_file = bin_path.join(&bin_name);

        if !bin_file.is_file() {
            self.build(def, &formula_path, &config, &bin_path)?;
            if !bin_file.is_file() {
                return Err(RunnerError::BuildFailure(format!(
                    "build finished but {} was not produced",
                    bin_file.display()
                )));
            }
        } else {
            tracing::debug!(bin = %bin_file.display(), "Using existing formula build");
        }

        Ok(Setup {
            definition: def.clone(),
            pwd,
            formula_path,
            bin_path,
            bin_name,
            config,
            container: None,
        })
    }
}
