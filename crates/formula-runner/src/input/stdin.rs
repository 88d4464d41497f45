//! Stdin channel: a single JSON object, keys are input names.
//!
//! ```text
//! echo '{"name": "dennis", "region": "eu"}' | formula run commons hello/world --channel stdin
//! ```

use std::io::Read;
use std::sync::{Arc, Mutex};

use formula_core::formula::MULTI_VALUE_SEPARATOR;
use serde_json::{Map, Value};

use super::credential::CredentialResolver;
use super::flag::FlagSet;
use super::{bind_all, InputStrategy};
use crate::error::{Result, RunnerError};
use crate::pre_run::Setup;
use crate::process::Process;

pub struct StdinStrategy {
    credentials: Arc<dyn CredentialResolver>,
    source: Mutex<Box<dyn Read + Send>>,
}

impl StdinStrategy {
    pub fn new(credentials: Arc<dyn CredentialResolver>) -> Self {
        Self::with_reader(credentials, std::io::stdin())
    }

    /// Read the payload from `reader` instead of the process's stdin.
    pub fn with_reader(
        credentials: Arc<dyn CredentialResolver>,
        reader: impl Read + Send + 'static,
    ) -> Self {
        Self {
            credentials,
            source: Mutex::new(Box::new(reader)),
        }
    }

    fn read_payload(&self) -> Result<Map<String, Value>> {
        let mut raw = String::new();
        {
            let mut source = self
                .source
                .lock()
                .map_err(|_| RunnerError::input("stdin", "input source is unavailable"))?;
            source
                .read_to_string(&mut raw)
                .map_err(|e| RunnerError::filesystem("failed to read", "<stdin>", e))?;
        }
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(RunnerError::input("stdin", "expected a JSON object")),
            Err(e) => Err(RunnerError::input("stdin", format!("invalid JSON: {}", e))),
        }
    }
}

/// JSON scalar (or array of scalars) as the string bound into the environment.
fn as_env_value(name: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match as_env_value(name, item)? {
                    Some(v) if !matches!(item, Value::Array(_)) => parts.push(v),
                    _ => return Err(RunnerError::input(name, "nested or null array entries")),
                }
            }
            Ok(Some(parts.join(MULTI_VALUE_SEPARATOR)))
        }
        Value::Object(_) => Err(RunnerError::input(name, "objects are not valid values")),
    }
}

impl InputStrategy for StdinStrategy {
    fn inputs(&self, process: &mut Process, setup: &Setup, _flags: &FlagSet) -> Result<()> {
        let payload = self.read_payload()?;
        let mut values = std::collections::HashMap::with_capacity(payload.len());
        for (name, value) in &payload {
            if let Some(v) = as_env_value(name, value)? {
                values.insert(name.as_str(), v);
            }
        }
        bind_all(
            process,
            &setup.config.inputs,
            self.credentials.as_ref(),
            |input| values.get(input.name.as_str()).cloned(),
        )
    }
}
