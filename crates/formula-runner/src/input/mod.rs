//! Input channels: how the values of a formula's declared inputs are obtained.
//!
//! Each channel has one strategy; the `InputResolver` maps channels to
//! strategies and is built once before any run starts.

pub mod credential;
pub mod flag;
pub mod prompt;
pub mod stdin;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use formula_core::formula::{Input, InputKind, MULTI_VALUE_SEPARATOR};
use regex::Regex;

use crate::error::{Result, RunnerError};
use crate::pre_run::Setup;
use crate::process::Process;

pub use credential::{CredentialResolver, EnvCredentialResolver};
pub use flag::{FlagSet, FlagStrategy};
pub use prompt::{PromptStrategy, Prompter, TerminalPrompter};
pub use stdin::StdinStrategy;

/// Where input values come from for the duration of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Prompt,
    Stdin,
    Flag,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Stdin => "stdin",
            Self::Flag => "flag",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "prompt" => Ok(Self::Prompt),
            "stdin" => Ok(Self::Stdin),
            "flag" | "flags" => Ok(Self::Flag),
            _ => Err(RunnerError::UnrecognizedChannel(s.to_string())),
        }
    }
}

/// Satisfies every declared input of a formula through one channel, binding
/// the values into the process before it is launched.
pub trait InputStrategy: Send + Sync {
    fn inputs(&self, process: &mut Process, setup: &Setup, flags: &FlagSet) -> Result<()>;
}

/// Immutable channel → strategy mapping.
pub struct InputResolver {
    strategies: HashMap<Channel, Arc<dyn InputStrategy>>,
}

impl InputResolver {
    pub fn new(strategies: HashMap<Channel, Arc<dyn InputStrategy>>) -> Self {
        Self { strategies }
    }

    /// Prompt, Stdin and Flag strategies sharing one credential resolver.
    pub fn standard(
        prompter: Arc<dyn Prompter>,
        credentials: Arc<dyn CredentialResolver>,
    ) -> Self {
        let mut strategies: HashMap<Channel, Arc<dyn InputStrategy>> = HashMap::new();
        strategies.insert(
            Channel::Prompt,
            Arc::new(PromptStrategy::new(prompter, credentials.clone())),
        );
        strategies.insert(
            Channel::Stdin,
            Arc::new(StdinStrategy::new(credentials.clone())),
        );
        strategies.insert(Channel::Flag, Arc::new(FlagStrategy::new(credentials)));
        Self::new(strategies)
    }

    pub fn resolve(&self, channel: Channel) -> Result<Arc<dyn InputStrategy>> {
        self.strategies
            .get(&channel)
            .cloned()
            .ok_or_else(|| RunnerError::UnrecognizedChannel(channel.to_string()))
    }
}

/// Bind one resolved value as `<INPUT_NAME>=<value>`.
///
/// A name that shadows an inherited variable still wins (it is appended last),
/// but the shadowing is logged.
pub(crate) fn bind(process: &mut Process, input: &Input, value: &str) {
    let key = input.env_name();
    if process.is_inherited(&key) {
        tracing::warn!(
            input = %input.name,
            variable = %key,
            "Input overrides an inherited environment variable"
        );
    }
    process.push_env(key, value);
}

/// Check `raw` against the input's kind, items and pattern and return the
/// value to bind.
pub(crate) fn normalize(input: &Input, raw: &str) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        if input.required {
            return Err(RunnerError::input(&input.name, "a value is required"));
        }
        return Ok(String::new());
    }

    match input.kind {
        InputKind::Bool => {
            return match value.to_lowercase().as_str() {
                "true" | "yes" | "y" => Ok("true".to_string()),
                "false" | "no" | "n" => Ok("false".to_string()),
                _ => Err(RunnerError::input(
                    &input.name,
                    format!("'{}' is not a boolean (true/false)", value),
                )),
            };
        }
        InputKind::List if !input.items.is_empty() => {
            if !input.items.iter().any(|i| i == value) {
                return Err(RunnerError::input(
                    &input.name,
                    format!("'{}' is not one of: {}", value, input.items.join(", ")),
                ));
            }
        }
        InputKind::Multiselect if !input.items.is_empty() => {
            if let Some(bad) = value
                .split(MULTI_VALUE_SEPARATOR)
                .find(|v| !input.items.iter().any(|i| i == v))
            {
                return Err(RunnerError::input(
                    &input.name,
                    format!("'{}' is not one of: {}", bad, input.items.join(", ")),
                ));
            }
        }
        _ => {}
    }

    if let Some(pattern) = &input.pattern {
        let re = Regex::new(&pattern.regex).map_err(|e| {
            RunnerError::input(&input.name, format!("invalid pattern in manifest: {}", e))
        })?;
        if !re.is_match(value) {
            let reason = pattern
                .mismatch_text
                .clone()
                .unwrap_or_else(|| format!("'{}' does not match {}", value, pattern.regex));
            return Err(RunnerError::input(&input.name, reason));
        }
    }

    Ok(value.to_string())
}

/// Shared by the non-interactive channels: look each input up, fall back to
/// its default, validate, and bind only once every input has a value.
/// An input with neither a supplied value nor a default fails, required or not.
pub(crate) fn bind_all<F>(
    process: &mut Process,
    inputs: &[Input],
    credentials: &dyn CredentialResolver,
    mut lookup: F,
) -> Result<()>
where
    F: FnMut(&Input) -> Option<String>,
{
    let mut resolved = Vec::with_capacity(inputs.len());
    for input in inputs {
        let value = if input.kind == InputKind::Credential {
            credentials.resolve(input)?
        } else {
            let raw = lookup(input)
                .or_else(|| input.default_value().map(str::to_string))
                .ok_or_else(|| {
                    RunnerError::input(&input.name, "no value supplied and no default declared")
                })?;
            normalize(input, &raw)?
        };
        resolved.push(value);
    }
    for (input, value) in inputs.iter().zip(&resolved) {
        bind(process, input, value);
    }
    Ok(())
}
