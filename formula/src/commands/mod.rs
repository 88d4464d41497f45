//! Subcommand implementations. Each takes its parsed arguments and returns
//! `anyhow::Result`; `main` turns an error into exit code 1.

pub mod run;
