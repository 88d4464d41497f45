mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    formula_core::observability::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
