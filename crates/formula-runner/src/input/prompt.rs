//! Prompt channel: ask the user for each input on the terminal.

use std::borrow::Cow;
use std::sync::Arc;

use formula_core::formula::{Input, InputKind, MULTI_VALUE_SEPARATOR};
use rustyline::completion::Completer;
use rustyline::config::{ColorMode, Configurer};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{DefaultEditor, Editor, Helper};

use super::credential::CredentialResolver;
use super::flag::FlagSet;
use super::{bind, normalize, InputStrategy};
use crate::error::{Result, RunnerError};
use crate::pre_run::Setup;
use crate::process::Process;

/// Answers given before an input is reported as invalid.
const MAX_ATTEMPTS: usize = 3;

/// Interactive question primitives, one per input kind.
pub trait Prompter: Send + Sync {
    fn text(&self, label: &str, default: Option<&str>, help: Option<&str>) -> Result<String>;
    fn list(&self, label: &str, items: &[String], default: Option<&str>, help: Option<&str>) -> Result<String>;
    fn confirm(&self, label: &str, default: Option<bool>, help: Option<&str>) -> Result<bool>;
    fn password(&self, label: &str, help: Option<&str>) -> Result<String>;
    fn multiselect(&self, label: &str, items: &[String], help: Option<&str>) -> Result<Vec<String>>;
    /// Tell the user why the last answer was rejected.
    fn reject(&self, message: &str);
}

pub struct PromptStrategy {
    prompter: Arc<dyn Prompter>,
    credentials: Arc<dyn CredentialResolver>,
}

impl PromptStrategy {
    pub fn new(prompter: Arc<dyn Prompter>, credentials: Arc<dyn CredentialResolver>) -> Self {
        Self {
            prompter,
            credentials,
        }
    }

    fn ask(&self, input: &Input) -> Result<String> {
        let label = input.label();
        let help = input.tutorial.as_deref();
        let default = input.default_value();
        let p = self.prompter.as_ref();
        let raw = match input.kind {
            InputKind::Text => p.text(label, default, help)?,
            InputKind::List => p.list(label, &input.items, default, help)?,
            InputKind::Bool => {
                let default = default.and_then(|d| normalize(input, d).ok()).map(|d| d == "true");
                p.confirm(label, default, help)?.to_string()
            }
            InputKind::Password => p.password(label, help)?,
            InputKind::Multiselect => p.multiselect(label, &input.items, help)?.join(MULTI_VALUE_SEPARATOR),
            InputKind::Credential => return self.credentials.resolve(input),
        };
        let raw = match (raw.trim().is_empty(), default) {
            (true, Some(d)) => d.to_string(),
            _ => raw,
        };
        normalize(input, &raw)
    }

    fn ask_until_valid(&self, input: &Input) -> Result<String> {
        let mut attempt = 1;
        loop {
            match self.ask(input) {
                Ok(v) => return Ok(v),
                Err(RunnerError::InputValidation { reason, .. })
                    if attempt < MAX_ATTEMPTS && input.kind != InputKind::Credential =>
                {
                    self.prompter.reject(&reason);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl InputStrategy for PromptStrategy {
    fn inputs(&self, process: &mut Process, setup: &Setup, _flags: &FlagSet) -> Result<()> {
        for input in &setup.config.inputs {
            let value = self.ask_until_valid(input)?;
            bind(process, input, &value);
        }
        Ok(())
    }
}

fn cancelled(label: &str, e: ReadlineError) -> RunnerError {
    match e {
        ReadlineError::Interrupted | ReadlineError::Eof => RunnerError::input(label, "cancelled by user"),
        other => RunnerError::input(label, format!("terminal error: {}", other)),
    }
}

/// Echoes `*` for every typed character.
struct Masked;

impl Completer for Masked {
    type Candidate = String;
}

impl Hinter for Masked {
    type Hint = String;
}

impl Validator for Masked {}

impl Highlighter for Masked {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned("*".repeat(line.chars().count()))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Helper for Masked {}

/// `Prompter` on the controlling terminal, built on rustyline. Prompts and
/// menus go to stderr so stdout stays the formula's.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line(&self, label: &str, prompt: &str) -> Result<String> {
        let mut rl = DefaultEditor::new().map_err(|e| cancelled(label, e))?;
        rl.readline(prompt).map_err(|e| cancelled(label, e))
    }

    fn show_help(help: Option<&str>) {
        if let Some(h) = help {
            eprintln!("  ? {}", h);
        }
    }

    fn show_items(items: &[String]) {
        for (i, item) in items.iter().enumerate() {
            eprintln!("  {}) {}", i + 1, item);
        }
    }

    /// `2` or `eu` both pick the second of `["us", "eu"]`.
    fn pick<'a>(items: &'a [String], answer: &'a str) -> &'a str {
        let answer = answer.trim();
        answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| items.get(i))
            .map(String::as_str)
            .unwrap_or(answer)
    }
}

impl Prompter for TerminalPrompter {
    fn text(&self, label: &str, default: Option<&str>, help: Option<&str>) -> Result<String> {
        Self::show_help(help);
        let prompt = match default {
            Some(d) => format!("{} ({}): ", label, d),
            None => format!("{}: ", label),
        };
        self.read_line(label, &prompt)
    }

    fn list(&self, label: &str, items: &[String], default: Option<&str>, help: Option<&str>) -> Result<String> {
        Self::show_help(help);
        eprintln!("{}", label);
        Self::show_items(items);
        let prompt = match default {
            Some(d) => format!("Choose [{}]: ", d),
            None => "Choose: ".to_string(),
        };
        let answer = self.read_line(label, &prompt)?;
        Ok(Self::pick(items, &answer).to_string())
    }

    fn confirm(&self, label: &str, default: Option<bool>, help: Option<&str>) -> Result<bool> {
        Self::show_help(help);
        let hint = match default {
            Some(true) => "Y/n",
            Some(false) => "y/N",
            None => "y/n",
        };
        let answer = self.read_line(label, &format!("{} [{}]: ", label, hint))?;
        match answer.trim().to_lowercase().as_str() {
            "" => default.ok_or_else(|| RunnerError::input(label, "answer yes or no")),
            "y" | "yes" | "true" => Ok(true),
            "n" | "no" | "false" => Ok(false),
            other => Err(RunnerError::input(label, format!("'{}' is not yes or no", other))),
        }
    }

    fn password(&self, label: &str, help: Option<&str>) -> Result<String> {
        Self::show_help(help);
        let mut rl: Editor<Masked, DefaultHistory> = Editor::new().map_err(|e| cancelled(label, e))?;
        rl.set_helper(Some(Masked));
        rl.set_color_mode(ColorMode::Forced);
        rl.set_auto_add_history(false);
        rl.readline(&format!("{}: ", label)).map_err(|e| cancelled(label, e))
    }

    fn multiselect(&self, label: &str, items: &[String], help: Option<&str>) -> Result<Vec<String>> {
        Self::show_help(help);
        eprintln!("{} (comma separated)", label);
        Self::show_items(items);
        let answer = self.read_line(label, "Choose: ")?;
        Ok(answer
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| Self::pick(items, a).to_string())
            .collect())
    }

    fn reject(&self, message: &str) {
        eprintln!("  ⚠️  {}", message);
    }
}
