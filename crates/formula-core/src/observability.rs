//! Observability: tracing init and the JSONL audit log.
//!
//! Reads `ObservabilityConfig` for FORMULA_QUIET, FORMULA_LOG_LEVEL,
//! FORMULA_LOG_JSON and FORMULA_AUDIT_LOG.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

use chrono::Utc;
use serde_json::json;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

/// Quiet-mode aware progress logging. Suppressed when FORMULA_QUIET=1.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        if !$crate::observability::is_quiet() {
            $crate::tracing::info!($($arg)*);
        }
    }};
}

pub fn is_quiet() -> bool {
    ObservabilityConfig::from_env().quiet
}

/// Initialize tracing. Call once at process startup.
/// When FORMULA_QUIET=1 only WARN and above are logged.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "formula=warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}

fn audit_path() -> Option<&'static str> {
    static PATH: OnceLock<Option<String>> = OnceLock::new();
    PATH.get_or_init(|| {
        let path = ObservabilityConfig::from_env().audit_log.clone()?;
        if let Some(parent) = Path::new(&path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        Some(path)
    })
    .as_deref()
}

/// Append one JSON record as a line. Failures are ignored: the audit log is
/// best-effort and never affects a run.
pub fn append_jsonl(path: &Path, record: &serde_json::Value) {
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(f, "{}", line);
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Audit: execution_started (right before spawn)
pub fn audit_execution_started(formula: &str, cmd: &str, backend: &str, cwd: &str) {
    if let Some(path) = audit_path() {
        let record = json!({
            "ts": timestamp(),
            "event": "execution_started",
            "formula": formula,
            "cmd": cmd,
            "backend": backend,
            "cwd": cwd,
        });
        append_jsonl(Path::new(path), &record);
    }
}

/// Audit: execution_completed
pub fn audit_execution_completed(formula: &str, exit_code: i32, duration_ms: u64) {
    if let Some(path) = audit_path() {
        let record = json!({
            "ts": timestamp(),
            "event": "execution_completed",
            "formula": formula,
            "exit_code": exit_code,
            "duration_ms": duration_ms,
            "success": exit_code == 0,
        });
        append_jsonl(Path::new(path), &record);
    }
}

/// Audit: arbitrary record with the `ts` field filled in. Used for run reports.
pub fn audit_event(event: &str, mut fields: serde_json::Value) {
    if let Some(path) = audit_path() {
        if let Some(obj) = fields.as_object_mut() {
            obj.insert("ts".into(), json!(timestamp()));
            obj.insert("event".into(), json!(event));
        }
        append_jsonl(Path::new(path), &fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_jsonl_writes_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("audit.jsonl");
        append_jsonl(&path, &json!({"event": "a"}));
        append_jsonl(&path, &json!({"event": "b"}));
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "a");
    }
}
