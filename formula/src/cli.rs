use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Formula - build and run automation formulas from local repositories
#[derive(Parser, Debug)]
#[command(name = "formula")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a formula, building it first if needed
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Repository the formula belongs to
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// Formula path inside the repository, e.g. aws/terraform
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Where inputs come from: prompt, stdin or flag (default: from env or prompt)
    #[arg(long, value_name = "CHANNEL")]
    pub channel: Option<String>,

    /// Run inside a container built from the formula's Dockerfile
    #[arg(long, default_value = "false")]
    pub docker: bool,

    /// Ask the formula for verbose output (sets VERBOSE_MODE=true)
    #[arg(long, short = 'v', default_value = "false")]
    pub verbose: bool,

    /// Formula home directory (default: FORMULA_HOME or ~/.formula)
    #[arg(long, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Input values as `--<input-name> <value>`, after `--`
    #[arg(last = true, value_name = "FORMULA_FLAGS")]
    pub formula_flags: Vec<String>,
}
