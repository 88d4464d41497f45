//! Formula definitions and the `config.json` manifest each formula ships.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Manifest file name inside a formula directory.
pub const MANIFEST_FILE: &str = "config.json";
/// Directory (relative to the formula directory) that holds the built artifact.
pub const BIN_DIR: &str = "bin";
/// Container image recipe, relative to the formula directory.
pub const DOCKERFILE: &str = "Dockerfile";

const DEFAULT_UNIX_BIN: &str = "run.sh";
const DEFAULT_WINDOWS_BIN: &str = "run.bat";

/// Separator used when a multi-valued input is flattened into one env value.
pub const MULTI_VALUE_SEPARATOR: &str = "|";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("formula manifest not found: {0}")]
    Missing(PathBuf),

    #[error("failed to read formula manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid formula manifest {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A formula reference as resolved by the catalog: relative path + repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Definition {
    /// Path inside the repository, e.g. `aws/terraform`
    pub path: String,
    pub repo_name: String,
}

impl Definition {
    pub fn new(repo_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            repo_name: repo_name.into(),
        }
    }

    /// `<home>/repos/<repo>/<path>`
    pub fn formula_path(&self, home: &Path) -> PathBuf {
        let mut p = home.join("repos").join(&self.repo_name);
        for segment in self.path.split(['/', '\\']).filter(|s| !s.is_empty()) {
            p.push(segment);
        }
        p
    }

    pub fn bin_path(&self, formula_path: &Path) -> PathBuf {
        formula_path.join(BIN_DIR)
    }

    /// Command-style name, e.g. `aws terraform`, used in notices and audit records.
    pub fn display_name(&self) -> String {
        self.path
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Platform a formula entrypoint is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Unix,
    Windows,
}

impl TargetOs {
    pub fn host() -> Self {
        if cfg!(windows) {
            TargetOs::Windows
        } else {
            TargetOs::Unix
        }
    }
}

/// Per-platform entrypoint names inside `bin/`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Binaries {
    #[serde(default = "default_unix_bin")]
    pub unix: String,
    #[serde(default = "default_windows_bin")]
    pub windows: String,
}

fn default_unix_bin() -> String {
    DEFAULT_UNIX_BIN.to_string()
}

fn default_windows_bin() -> String {
    DEFAULT_WINDOWS_BIN.to_string()
}

impl Default for Binaries {
    fn default() -> Self {
        Self {
            unix: default_unix_bin(),
            windows: default_windows_bin(),
        }
    }
}

/// Parsed `config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaConfig {
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub binaries: Binaries,
    /// Image used to compile the formula when running under the container backend.
    #[serde(default)]
    pub docker_image_builder: Option<String>,
}

impl FormulaConfig {
    pub fn load(formula_path: &Path) -> Result<Self, ManifestError> {
        let path = formula_path.join(MANIFEST_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestError::Missing(path));
            }
            Err(source) => return Err(ManifestError::Read { path, source }),
        };
        serde_json::from_str(&content).map_err(|source| ManifestError::Invalid { path, source })
    }

    /// Entrypoint name for the host platform.
    pub fn bin_name(&self) -> &str {
        self.bin_name_for(TargetOs::host())
    }

    pub fn bin_name_for(&self, target: TargetOs) -> &str {
        match target {
            TargetOs::Unix => &self.binaries.unix,
            TargetOs::Windows => &self.binaries.windows,
        }
    }
}

/// Kind of a declared input; selects the prompt and how values are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    List,
    #[serde(alias = "boolean")]
    Bool,
    Password,
    Multiselect,
    Credential,
}

/// Regex an answer must match, with the message shown when it does not.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InputPattern {
    pub regex: String,
    #[serde(default)]
    pub mismatch_text: Option<String>,
}

/// One declared parameter of a formula.
#[derive(Debug, Clone, Deserialize)]
pub struct Input {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InputKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub pattern: Option<InputPattern>,
    #[serde(default = "default_required")]
    pub required: bool,
    /// Help text shown next to the prompt and in `--help` for flags.
    #[serde(default)]
    pub tutorial: Option<String>,
}

fn default_required() -> bool {
    true
}

impl Input {
    /// Prompt label; falls back to the input name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Name of the environment variable the value is bound to.
    pub fn env_name(&self) -> String {
        self.name.to_uppercase()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref().filter(|d| !d.is_empty())
    }
}
