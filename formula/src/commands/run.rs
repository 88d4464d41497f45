//! `formula run`: wire the runner for the selected backend and run one formula.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use formula_core::config::{PathsConfig, RunnerConfig};
use formula_core::formula::{Definition, FormulaConfig};
use formula_runner::docker::DockerCli;
use formula_runner::environment::{EnvironmentComposer, FileContextFinder};
use formula_runner::executor::{DockerExecutor, Executor, LocalExecutor};
use formula_runner::input::{EnvCredentialResolver, FlagSet, InputResolver, TerminalPrompter};
use formula_runner::pre_run::builder::ScriptBuilder;
use formula_runner::pre_run::{DockerPreRunner, LocalPreRunner, PreRunner};
use formula_runner::report::AuditReporter;
use formula_runner::{Backend, Channel, Runner};

use crate::cli::RunArgs;

pub fn run(args: RunArgs) -> Result<()> {
    let mut paths = PathsConfig::from_env();
    if let Some(home) = args.home {
        paths.home = home;
    }
    let config = RunnerConfig::from_env();
    let def = Definition::new(args.repo, args.path);

    // Passing formula flags implies the flag channel unless one was named.
    let channel: Channel = match args.channel {
        Some(c) => c.parse()?,
        None if !args.formula_flags.is_empty() => Channel::Flag,
        None => config.input_channel.parse()?,
    };
    let backend: Backend = if args.docker {
        Backend::Docker
    } else {
        config.backend.parse()?
    };

    let flags = parse_flags(&paths.home, &def, &args.formula_flags)?;
    tracing::debug!(
        formula = %def.display_name(),
        channel = %channel,
        backend = %backend,
        flags = flags.len(),
        "Starting formula run"
    );

    let runner = build_runner(&paths, &config, backend);
    runner.run(&def, channel, args.verbose, &flags)?;
    Ok(())
}

/// Parse `--<input> <value>` against the manifest. When the manifest cannot be
/// read the flags are left empty and pre-run reports the real problem.
fn parse_flags(home: &Path, def: &Definition, raw: &[String]) -> Result<FlagSet> {
    if raw.is_empty() {
        return Ok(FlagSet::new());
    }
    match FormulaConfig::load(&def.formula_path(home)) {
        Ok(manifest) => Ok(FlagSet::parse(&def.display_name(), &manifest.inputs, raw)?),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping flag parsing");
            Ok(FlagSet::new())
        }
    }
}

fn build_runner(paths: &PathsConfig, config: &RunnerConfig, backend: Backend) -> Runner {
    let home = paths.home.as_path();
    let (pre_runner, executor): (Arc<dyn PreRunner>, Arc<dyn Executor>) = match backend {
        Backend::Local => {
            let mut executor = LocalExecutor::new();
            if let Some(enabled) = config.reconcile_output {
                executor = executor.with_reconciliation(enabled);
            }
            (
                Arc::new(LocalPreRunner::new(home, Arc::new(ScriptBuilder))),
                Arc::new(executor),
            )
        }
        Backend::Docker => {
            let docker = DockerCli::new(&config.docker_bin);
            (
                Arc::new(DockerPreRunner::new(home, docker.clone())),
                Arc::new(DockerExecutor::new(docker)),
            )
        }
    };

    Runner::new(
        pre_runner,
        InputResolver::standard(
            Arc::new(TerminalPrompter),
            Arc::new(EnvCredentialResolver::default()),
        ),
        EnvironmentComposer::new(Arc::new(FileContextFinder::new(paths.contexts_file()))),
        executor,
        Arc::new(AuditReporter),
    )
}
