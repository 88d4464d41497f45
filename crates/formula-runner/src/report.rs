//! Per-run telemetry, handed explicitly to a reporter once a run finishes.

use std::time::Duration;

use formula_core::observability;
use serde::Serialize;

use crate::executor::Backend;
use crate::input::Channel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunEvent {
    pub repo_name: String,
    pub formula_path: String,
    pub channel: String,
    pub backend: String,
    pub success: bool,
    pub duration_ms: u64,
}

impl RunEvent {
    pub fn new(
        repo_name: &str,
        formula_path: &str,
        channel: Channel,
        backend: Backend,
        success: bool,
        duration: Duration,
    ) -> Self {
        Self {
            repo_name: repo_name.to_string(),
            formula_path: formula_path.to_string(),
            channel: channel.to_string(),
            backend: backend.to_string(),
            success,
            duration_ms: duration.as_millis() as u64,
        }
    }
}

pub trait RunReporter: Send + Sync {
    fn report(&self, event: &RunEvent);
}

/// Writes a `formula_ran` record to the audit log, when one is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditReporter;

impl RunReporter for AuditReporter {
    fn report(&self, event: &RunEvent) {
        tracing::debug!(
            repo = %event.repo_name,
            formula = %event.formula_path,
            success = event.success,
            duration_ms = event.duration_ms,
            "Formula run finished"
        );
        match serde_json::to_value(event) {
            Ok(fields) => observability::audit_event("formula_ran", fields),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize run event"),
        }
    }
}
