//! The orchestrator behind `formula run`.

use std::sync::Arc;
use std::time::Instant;

use formula_core::formula::Definition;

use crate::environment::EnvironmentComposer;
use crate::error::Result;
use crate::executor::Executor;
use crate::input::{Channel, FlagSet, InputResolver};
use crate::pre_run::{PreRunner, Setup};
use crate::process::Process;
use crate::report::{RunEvent, RunReporter};

/// Runs one formula: pre-run, compose the environment, bind inputs, execute.
///
/// The first failing step ends the run and its error is returned unchanged.
/// Nothing is retried. Once pre-run succeeds, its cleanup runs on every path.
pub struct Runner {
    pre_runner: Arc<dyn PreRunner>,
    resolver: InputResolver,
    composer: EnvironmentComposer,
    executor: Arc<dyn Executor>,
    reporter: Arc<dyn RunReporter>,
}

impl Runner {
    pub fn new(
        pre_runner: Arc<dyn PreRunner>,
        resolver: InputResolver,
        composer: EnvironmentComposer,
        executor: Arc<dyn Executor>,
        reporter: Arc<dyn RunReporter>,
    ) -> Self {
        Self {
            pre_runner,
            resolver,
            composer,
            executor,
            reporter,
        }
    }

    pub fn run(&self, def: &Definition, channel: Channel, verbose: bool, flags: &FlagSet) -> Result<()> {
        let setup = self.pre_runner.pre_run(def)?;
        let result = self.run_prepared(def, &setup, channel, verbose, flags);
        self.pre_runner.cleanup(&setup);
        result
    }

    fn run_prepared(
        &self,
        def: &Definition,
        setup: &Setup,
        channel: Channel,
        verbose: bool,
        flags: &FlagSet,
    ) -> Result<()> {
        let mut process = Process::new(setup.bin_file(), setup.pwd.clone());
        process.inherit_env(std::env::vars_os().map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        }));

        let backend = self.executor.backend();
        self.composer.compose(&mut process, setup, verbose, backend)?;

        let strategy = self.resolver.resolve(channel)?;
        strategy.inputs(&mut process, setup, flags)?;

        let start = Instant::now();
        let result = self.executor.execute(&process, setup);
        self.reporter.report(&RunEvent::new(
            &def.repo_name,
            &def.path,
            channel,
            backend,
            result.is_ok(),
            start.elapsed(),
        ));
        result
    }
}
