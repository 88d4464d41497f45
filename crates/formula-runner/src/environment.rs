//! Environment composition: the variables every formula receives on top of the
//! inherited parent environment.

use std::path::PathBuf;
use std::sync::Arc;

use formula_core::config::env_keys::formula_env;
use formula_core::context::{read_contexts, ContextHolder};
use formula_core::info_log;

use crate::error::{Result, RunnerError};
use crate::executor::Backend;
use crate::pre_run::Setup;
use crate::process::Process;

/// Source of the active named context.
pub trait ContextFinder: Send + Sync {
    fn find(&self) -> Result<ContextHolder>;
}

/// Reads `<home>/contexts`.
#[derive(Debug, Clone)]
pub struct FileContextFinder {
    path: PathBuf,
}

impl FileContextFinder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContextFinder for FileContextFinder {
    fn find(&self) -> Result<ContextHolder> {
        read_contexts(&self.path).map_err(|e| RunnerError::ContextLookup(e.to_string()))
    }
}

pub struct EnvironmentComposer {
    contexts: Arc<dyn ContextFinder>,
}

impl EnvironmentComposer {
    pub fn new(contexts: Arc<dyn ContextFinder>) -> Self {
        Self { contexts }
    }

    /// Append `CURRENT_PWD`, `CONTEXT`, `VERBOSE_MODE`, `DOCKER_EXECUTION` and
    /// `ENV`, in that order. Nothing is appended when the context lookup fails.
    pub fn compose(
        &self,
        process: &mut Process,
        setup: &Setup,
        verbose: bool,
        backend: Backend,
    ) -> Result<()> {
        let ctx = self.contexts.find()?;
        if ctx.is_active() {
            info_log!(context = %ctx.current, "Formula running in context");
        }

        process.push_env(formula_env::PWD, setup.pwd.to_string_lossy());
        process.push_env(formula_env::CONTEXT, ctx.current.as_str());
        process.push_env(formula_env::VERBOSE, verbose.to_string());
        process.push_env(
            formula_env::DOCKER_EXECUTION,
            backend.is_sandboxed().to_string(),
        );
        process.push_env(formula_env::ENV, ctx.current);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::test_support::setup;

    struct Fixed(&'static str);

    impl ContextFinder for Fixed {
        fn find(&self) -> Result<ContextHolder> {
            Ok(ContextHolder {
                current: self.0.to_string(),
                all: vec![self.0.to_string()],
            })
        }
    }

    struct Broken;

    impl ContextFinder for Broken {
        fn find(&self) -> Result<ContextHolder> {
            Err(RunnerError::ContextLookup("store unreadable".into()))
        }
    }

    fn inherited_process() -> Process {
        let mut p = Process::new("/bin/run.sh", "/work");
        p.inherit_env(vec![
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("HOME".to_string(), "/home/u".to_string()),
        ]);
        p
    }

    #[test]
    fn test_appends_five_variables_in_order() {
        let mut p = inherited_process();
        EnvironmentComposer::new(Arc::new(Fixed("prod")))
            .compose(&mut p, &setup(vec![]), true, Backend::Local)
            .unwrap();

        assert_eq!(p.inherited_env()[0], ("PATH".to_string(), "/usr/bin".to_string()));
        let appended: Vec<(&str, &str)> = p
            .appended_env()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            appended,
            [
                ("CURRENT_PWD", "/work"),
                ("CONTEXT", "prod"),
                ("VERBOSE_MODE", "true"),
                ("DOCKER_EXECUTION", "false"),
                ("ENV", "prod"),
            ]
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_active_context_notice_is_logged() {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            EnvironmentComposer::new(Arc::new(Fixed("qa")))
                .compose(&mut inherited_process(), &setup(vec![]), false, Backend::Local)
                .unwrap();
        });

        let logged = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("Formula running in context"));
        assert!(logged.contains("context=qa"));
    }

    #[test]
    fn test_docker_backend_sets_sandbox_flag() {
        let mut p = inherited_process();
        EnvironmentComposer::new(Arc::new(Fixed("")))
            .compose(&mut p, &setup(vec![]), false, Backend::Docker)
            .unwrap();
        assert_eq!(p.env_value("DOCKER_EXECUTION"), Some("true"));
        assert_eq!(p.env_value("VERBOSE_MODE"), Some("false"));
        assert_eq!(p.env_value("CONTEXT"), Some(""));
    }

    #[test]
    fn test_lookup_failure_appends_nothing() {
        let mut p = inherited_process();
        let err = EnvironmentComposer::new(Arc::new(Broken))
            .compose(&mut p, &setup(vec![]), false, Backend::Local)
            .unwrap_err();
        assert!(matches!(err, RunnerError::ContextLookup(_)));
        assert!(p.appended_env().is_empty());
    }

    #[test]
    fn test_file_finder_maps_parse_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("contexts");
        assert!(!FileContextFinder::new(&path).find().unwrap().is_active());

        std::fs::write(&path, r#"{"current_context": "qa", "all": ["qa"]}"#).unwrap();
        assert_eq!(FileContextFinder::new(&path).find().unwrap().current, "qa");

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileContextFinder::new(&path).find(),
            Err(RunnerError::ContextLookup(_))
        ));
    }
}
