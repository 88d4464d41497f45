//! Flag channel: values come from `--<input-name> <value>` arguments passed
//! after the formula path.

use std::collections::HashMap;
use std::ffi::OsString;
use std::sync::Arc;

use clap::{Arg, ArgAction, Command};
use formula_core::formula::{Input, InputKind};

use super::credential::CredentialResolver;
use super::{bind_all, InputStrategy};
use crate::error::{Result, RunnerError};
use crate::pre_run::Setup;
use crate::process::Process;

/// Flag values keyed by input name, parsed once per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    values: HashMap<String, String>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse `args` against the manifest's inputs. Every non-credential input
    /// gets a `--<name> <value>` option; anything else is rejected.
    pub fn parse<I, S>(command: &str, inputs: &[Input], args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString> + Clone,
    {
        let accepted: Vec<&Input> = inputs
            .iter()
            .filter(|i| i.kind != InputKind::Credential)
            .collect();

        let mut cmd = Command::new(command.to_string())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true);
        for input in &accepted {
            let mut arg = Arg::new(input.name.clone())
                .long(input.name.clone())
                .value_name("VALUE")
                .action(ArgAction::Set);
            if let Some(help) = input.tutorial.as_ref().or(input.label.as_ref()) {
                arg = arg.help(help.clone());
            }
            cmd = cmd.arg(arg);
        }

        let matches = cmd
            .try_get_matches_from(args)
            .map_err(|e| {
                let rendered = e.to_string();
                let first = rendered.lines().next().unwrap_or_default();
                RunnerError::input("flags", first.trim_start_matches("error: ").to_string())
            })?;

        let values = accepted
            .iter()
            .filter_map(|i| {
                matches
                    .get_one::<String>(&i.name)
                    .map(|v| (i.name.clone(), v.clone()))
            })
            .collect();
        Ok(Self { values })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlagSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Binds inputs from the invocation's `FlagSet`; missing flags fall back to
/// the declared default.
pub struct FlagStrategy {
    credentials: Arc<dyn CredentialResolver>,
}

impl FlagStrategy {
    pub fn new(credentials: Arc<dyn CredentialResolver>) -> Self {
        Self { credentials }
    }
}

impl InputStrategy for FlagStrategy {
    fn inputs(&self, process: &mut Process, setup: &Setup, flags: &FlagSet) -> Result<()> {
        tracing::debug!(count = flags.len(), "Binding inputs from flags");
        bind_all(
            process,
            &setup.config.inputs,
            self.credentials.as_ref(),
            |input| flags.get(&input.name).map(str::to_string),
        )
    }
}
