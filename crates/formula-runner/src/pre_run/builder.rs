//! Builders compile a formula into `bin/`. How a given language is compiled is
//! the formula's own business: builders only run its build recipe.

use std::path::Path;
use std::process::{Command, Stdio};

use formula_core::formula::FormulaConfig;

use crate::docker::DockerCli;
use crate::error::{Result, RunnerError};

/// Extension point for producing a formula's artifact.
pub trait Builder: Send + Sync {
    /// Builder name for logging and diagnostics.
    fn name(&self) -> &str;

    /// Build the formula in `formula_path`, leaving the artifact under `bin/`.
    fn build(&self, formula_path: &Path, config: &FormulaConfig) -> Result<()>;
}

/// Build recipe found in a formula directory, as a program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

impl Recipe {
    /// `program args...` as one shell line.
    pub fn shell_line(&self) -> String {
        std::iter::once(self.program)
            .chain(self.args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Unix recipe: `make build` when a Makefile exists, otherwise `sh build.sh`.
pub fn unix_recipe(formula_path: &Path) -> Option<Recipe> {
    if formula_path.join("Makefile").is_file() {
        Some(Recipe {
            program: "make",
            args: &["build"],
        })
    } else if formula_path.join("build.sh").is_file() {
        Some(Recipe {
            program: "sh",
            args: &["build.sh"],
        })
    } else {
        None
    }
}

fn windows_recipe(formula_path: &Path) -> Option<Recipe> {
    formula_path.join("build.bat").is_file().then_some(Recipe {
        program: "cmd",
        args: &["/C", "build.bat"],
    })
}

/// Runs the formula's own build recipe on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptBuilder;

impl Builder for ScriptBuilder {
    fn name(&self) -> &str {
        "script"
    }

    fn build(&self, formula_path: &Path, _config: &FormulaConfig) -> Result<()> {
        let recipe = if cfg!(windows) {
            windows_recipe(formula_path)
        } else {
            unix_recipe(formula_path)
        }
        .ok_or_else(|| {
            RunnerError::BuildFailure(format!(
                "no build recipe (Makefile, build.sh or build.bat) in {}",
                formula_path.display()
            ))
        })?;

        tracing::debug!(recipe = %recipe.shell_line(), path = %formula_path.display(), "Running build recipe");
        let out = Command::new(recipe.program)
            .args(recipe.args)
            .current_dir(formula_path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                RunnerError::BuildFailure(format!("failed to run `{}`: {}", recipe.shell_line(), e))
            })?;
        if !out.status.success() {
            return Err(RunnerError::BuildFailure(format!(
                "`{}` failed: {}",
                recipe.shell_line(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Runs the unix build recipe inside the manifest's `dockerImageBuilder` image
/// with the formula directory mounted, so the host needs no toolchain.
#[derive(Debug, Clone, Default)]
pub struct DockerBuilder {
    docker: DockerCli,
}

impl DockerBuilder {
    pub fn new(docker: DockerCli) -> Self {
        Self { docker }
    }
}

impl Builder for DockerBuilder {
    fn name(&self) -> &str {
        "docker"
    }

    fn build(&self, formula_path: &Path, config: &FormulaConfig) -> Result<()> {
        let image = config.docker_image_builder.as_deref().ok_or_else(|| {
            RunnerError::BuildFailure(
                "formula manifest declares no dockerImageBuilder image".to_string(),
            )
        })?;
        let recipe = unix_recipe(formula_path).ok_or_else(|| {
            RunnerError::BuildFailure(format!(
                "no build recipe (Makefile or build.sh) in {}",
                formula_path.display()
            ))
        })?;
        let mount = format!("{}:/formula", formula_path.display());
        let line = recipe.shell_line();

        tracing::debug!(image = %image, recipe = %line, "Running build recipe in container");
        self.docker
            .run_captured([
                "run",
                "--rm",
                "-v",
                &mount,
                "-w",
                "/formula",
                "--entrypoint",
                "/bin/sh",
                image,
                "-c",
                &line,
            ])
            .map(|_| ())
            .map_err(RunnerError::BuildFailure)
    }
}
