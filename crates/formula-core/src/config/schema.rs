//! Structured configuration read from the environment.

use std::path::PathBuf;

use super::env_keys::{observability as obv_keys, paths, runner};
use super::loader::{env_bool, env_optional, env_or, load_dotenv};

/// Home directory layout: `<home>/repos/<repo>/<formula path>` and `<home>/contexts`.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub home: PathBuf,
}

impl PathsConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        let home = env_optional(paths::FORMULA_HOME, paths::HOME_ALIASES)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_home);
        Self { home }
    }

    fn default_home() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".formula")
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.home.join("repos")
    }

    pub fn contexts_file(&self) -> PathBuf {
        self.home.join("contexts")
    }
}

/// Backend and default input channel.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// `local` or `docker`
    pub backend: String,
    pub docker_bin: PathBuf,
    /// `prompt`, `stdin` or `flag`
    pub input_channel: String,
    /// `None` keeps the platform default.
    pub reconcile_output: Option<bool>,
}

impl RunnerConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            backend: env_or(runner::FORMULA_RUNNER, &[], || "local".to_string()),
            docker_bin: PathBuf::from(env_or(runner::FORMULA_DOCKER_BIN, &[], || {
                "docker".to_string()
            })),
            input_channel: env_or(runner::FORMULA_INPUT_CHANNEL, &[], || {
                "prompt".to_string()
            }),
            reconcile_output: env_optional(runner::FORMULA_RECONCILE_OUTPUT, &[])
                .map(|_| env_bool(runner::FORMULA_RECONCILE_OUTPUT, &[], false)),
        }
    }
}

/// Observability: quiet, log level, JSON logs, audit log path.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    pub audit_log: Option<String>,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            load_dotenv();
            Self {
                quiet: env_bool(obv_keys::FORMULA_QUIET, &[], false),
                log_level: env_or(obv_keys::FORMULA_LOG_LEVEL, &[], || {
                    "formula=info".to_string()
                }),
                log_json: env_bool(obv_keys::FORMULA_LOG_JSON, &[], false),
                audit_log: env_optional(obv_keys::FORMULA_AUDIT_LOG, &[]),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_layout() {
        let cfg = PathsConfig {
            home: PathBuf::from("/tmp/formula-home"),
        };
        assert_eq!(cfg.repos_dir(), PathBuf::from("/tmp/formula-home/repos"));
        assert_eq!(
            cfg.contexts_file(),
            PathBuf::from("/tmp/formula-home/contexts")
        );
    }
}
