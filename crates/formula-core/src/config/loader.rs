//! Environment variable loading.
//!
//! Keeps the fallback chains in one place instead of repeating `or_else` calls
//! in business code.

use std::env;
use std::path::Path;
use std::sync::Once;

/// First non-empty value among `primary` and its aliases, trimmed.
fn lookup(primary: &str, aliases: &[&str]) -> Option<String> {
    std::iter::once(primary)
        .chain(aliases.iter().copied())
        .filter_map(|k| env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Load `.env` from the current directory. Variables already present in the
/// environment keep their value. Runs once per process.
pub fn load_dotenv() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let Ok(cwd) = env::current_dir() else {
            return;
        };
        for (key, value) in parse_dotenv_file(&cwd.join(".env")) {
            if env::var_os(&key).is_none() {
                env::set_var(key, value);
            }
        }
    });
}

/// `KEY=value` pairs of a `.env` file; an unreadable file yields none.
pub fn parse_dotenv_file(path: &Path) -> Vec<(String, String)> {
    std::fs::read_to_string(path)
        .map(|content| content.lines().filter_map(parse_dotenv_line).collect())
        .unwrap_or_default()
}

fn unquote(value: &str) -> Option<&str> {
    ['"', '\'']
        .into_iter()
        .find_map(|q| value.strip_prefix(q)?.strip_suffix(q))
}

fn parse_dotenv_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, raw) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let raw = raw.trim();
    let value = match unquote(raw) {
        Some(inner) => inner,
        // Unquoted values end at an inline comment.
        None => raw.split(" #").next().unwrap_or(raw).trim_end(),
    };
    Some((key.to_string(), value.to_string()))
}

/// Primary variable, else the first alias that is set, else `default()`.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    lookup(primary, aliases).unwrap_or_else(default)
}

/// Like `env_or` without a default. Empty values count as unset.
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    lookup(primary, aliases)
}

/// `0`, `false`, `no` and `off` are false; any other value is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    lookup(primary, aliases)
        .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no" | "off"))
        .unwrap_or(default)
}
