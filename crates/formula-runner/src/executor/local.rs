//! Host-process executor.

use std::process::{Command, Stdio};
use std::time::Instant;

use formula_core::{info_log, observability};

use super::{exit_failure, Backend, Executor};
use crate::error::{Result, RunnerError};
use crate::pre_run::Setup;
use crate::process::Process;
use crate::reconcile::OutputReconciler;

/// Runs the formula binary directly with inherited stdio.
///
/// With reconciliation on (the default on Windows) the binary runs inside its
/// `bin/` directory and any file it leaves there is moved to the invoking
/// directory afterwards.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    reconcile: bool,
    reconciler: OutputReconciler,
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self {
            reconcile: cfg!(windows),
            reconciler: OutputReconciler,
        }
    }
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reconciliation(mut self, enabled: bool) -> Self {
        self.reconcile = enabled;
        self
    }

    fn spawn(&self, process: &Process, setup: &Setup) -> Result<()> {
        let cwd = if self.reconcile {
            setup.bin_path.as_path()
        } else {
            process.current_dir()
        };
        let program = process.program();

        let formula = setup.definition.display_name();
        observability::audit_execution_started(
            &formula,
            &program.to_string_lossy(),
            Backend::Local.as_str(),
            &cwd.to_string_lossy(),
        );
        let start = Instant::now();

        let status = Command::new(program)
            .env_clear()
            .envs(process.env().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| {
                RunnerError::Execution(format!("failed to start {}: {}", program.display(), e))
            })?;

        observability::audit_execution_completed(
            &formula,
            status.code().unwrap_or(-1),
            start.elapsed().as_millis() as u64,
        );
        if !status.success() {
            return Err(exit_failure(&formula, status));
        }
        Ok(())
    }
}

impl Executor for LocalExecutor {
    fn backend(&self) -> Backend {
        Backend::Local
    }

    fn execute(&self, process: &Process, setup: &Setup) -> Result<()> {
        info_log!(formula = %setup.definition.display_name(), "Running formula...");
        if !self.reconcile {
            return self.spawn(process, setup);
        }

        let before = self.reconciler.list_files(&setup.bin_path)?;
        self.spawn(process, setup)?;
        let after = self.reconciler.list_files(&setup.bin_path)?;
        let produced = self.reconciler.new_entries(&before, &after);
        if !produced.is_empty() {
            tracing::debug!(count = produced.len(), "Relocating formula output");
            self.reconciler
                .move_files(&setup.bin_path, &setup.pwd, &produced)?;
        }
        Ok(())
    }
}
