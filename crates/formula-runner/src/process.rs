//! The formula process being prepared: program, working directory, environment.

use std::path::{Path, PathBuf};

/// A process description that is filled in step by step before it is launched.
///
/// The environment is an ordered vector: the inherited parent environment first,
/// then everything appended by composition and input binding. Entries are only
/// ever appended, so the inherited prefix keeps its order.
#[derive(Debug, Clone)]
pub struct Process {
    program: PathBuf,
    current_dir: PathBuf,
    env: Vec<(String, String)>,
    inherited: usize,
}

impl Process {
    pub fn new(program: impl Into<PathBuf>, current_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            current_dir: current_dir.into(),
            env: Vec::new(),
            inherited: 0,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Seed the inherited environment. Only valid before anything was appended.
    pub fn inherit_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        debug_assert!(self.env.len() == self.inherited);
        self.env.extend(vars);
        self.inherited = self.env.len();
    }

    /// Append one `KEY=VALUE` pair.
    pub fn push_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.push((key.into(), value.into()));
    }

    /// Full environment, inherited prefix first.
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn inherited_env(&self) -> &[(String, String)] {
        &self.env[..self.inherited]
    }

    /// Everything appended after inheritance: the formula-specific variables.
    pub fn appended_env(&self) -> &[(String, String)] {
        &self.env[self.inherited..]
    }

    /// Last value bound to `key`, which is what the child observes.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_inherited(&self, key: &str) -> bool {
        self.inherited_env().iter().any(|(k, _)| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_inherited_prefix() {
        let mut p = Process::new("/bin/run.sh", "/work");
        p.inherit_env(vec![
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("HOME".to_string(), "/home/u".to_string()),
        ]);
        p.push_env("CURRENT_PWD", "/work");
        p.push_env("HOME", "/override");

        assert_eq!(p.inherited_env().len(), 2);
        assert_eq!(p.inherited_env()[0].0, "PATH");
        assert_eq!(p.appended_env().len(), 2);
        assert_eq!(p.env_value("HOME"), Some("/override"));
        assert!(p.is_inherited("HOME"));
        assert!(!p.is_inherited("CURRENT_PWD"));
    }
}
