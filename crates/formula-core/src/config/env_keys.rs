//! Environment variable keys.
//!
//! `FORMULA_*` keys configure the CLI itself; the `formula_env` keys are the
//! variables emitted into every spawned formula process.

/// Variables emitted to the formula process, in `NAME=value` form.
pub mod formula_env {
    /// Working directory the formula was invoked from.
    pub const PWD: &str = "CURRENT_PWD";
    /// Active context name (empty when none).
    pub const CONTEXT: &str = "CONTEXT";
    /// `true` / `false`.
    pub const VERBOSE: &str = "VERBOSE_MODE";
    /// `true` only when running inside the container backend.
    pub const DOCKER_EXECUTION: &str = "DOCKER_EXECUTION";
    /// Legacy duplicate of `CONTEXT`, kept for older formulas.
    pub const ENV: &str = "ENV";
}

/// Home and repository layout.
pub mod paths {
    pub const FORMULA_HOME: &str = "FORMULA_HOME";
    pub const HOME_ALIASES: &[&str] = &["FORMULA_HOME_DIR"];
}

/// Runner backend selection.
pub mod runner {
    /// `local` (default) or `docker`.
    pub const FORMULA_RUNNER: &str = "FORMULA_RUNNER";
    pub const FORMULA_DOCKER_BIN: &str = "FORMULA_DOCKER_BIN";
    /// Default input channel when the CLI flag is absent: `prompt`, `stdin`, `flag`.
    pub const FORMULA_INPUT_CHANNEL: &str = "FORMULA_INPUT_CHANNEL";
    /// Force output reconciliation on or off (defaults to on for Windows only).
    pub const FORMULA_RECONCILE_OUTPUT: &str = "FORMULA_RECONCILE_OUTPUT";
    /// Prefix for credential inputs looked up in the host environment.
    pub const CREDENTIAL_PREFIX: &str = "FORMULA_CREDENTIAL_";
}

/// Observability and logging.
pub mod observability {
    pub const FORMULA_QUIET: &str = "FORMULA_QUIET";
    pub const FORMULA_LOG_LEVEL: &str = "FORMULA_LOG_LEVEL";
    pub const FORMULA_LOG_JSON: &str = "FORMULA_LOG_JSON";
    pub const FORMULA_AUDIT_LOG: &str = "FORMULA_AUDIT_LOG";
}
