//! Output reconciliation for hosts where the formula runs inside its `bin/`
//! directory: whatever appears there during the run is moved to the invoking
//! directory afterwards.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, RunnerError};

/// Directory-diff based relocation of newly produced files.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputReconciler;

impl OutputReconciler {
    /// Names of the direct entries of `dir`.
    pub fn list_files(&self, dir: &Path) -> Result<BTreeSet<String>> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| RunnerError::filesystem("failed to list", dir, e))?;
        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| RunnerError::filesystem("failed to list", dir, e))?;
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    /// Names present after the run that were not there before.
    pub fn new_entries(&self, before: &BTreeSet<String>, after: &BTreeSet<String>) -> Vec<String> {
        after.difference(before).cloned().collect()
    }

    /// Move each named entry from `from` to `to`. A rename across filesystems
    /// falls back to copy-then-remove.
    pub fn move_files(&self, from: &Path, to: &Path, names: &[String]) -> Result<()> {
        for name in names {
            let src = from.join(name);
            let dst = to.join(name);
            tracing::debug!(src = %src.display(), dst = %dst.display(), "Moving formula output");
            if std::fs::rename(&src, &dst).is_ok() {
                continue;
            }
            copy_recursive(&src, &dst)?;
            let removed = if src.is_dir() {
                std::fs::remove_dir_all(&src)
            } else {
                std::fs::remove_file(&src)
            };
            removed.map_err(|e| RunnerError::filesystem("failed to remove", &src, e))?;
        }
        Ok(())
    }
}

fn copy_recursive(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        std::fs::create_dir_all(dst)
            .map_err(|e| RunnerError::filesystem("failed to create", dst, e))?;
        let entries =
            std::fs::read_dir(src).map_err(|e| RunnerError::filesystem("failed to list", src, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| RunnerError::filesystem("failed to list", src, e))?;
            let child: PathBuf = dst.join(entry.file_name());
            copy_recursive(&entry.path(), &child)?;
        }
        Ok(())
    } else {
        std::fs::copy(src, dst)
            .map(|_| ())
            .map_err(|e| RunnerError::filesystem("failed to copy", src, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_new_names_are_moved() {
        let bin = tempfile::tempdir().unwrap();
        let pwd = tempfile::tempdir().unwrap();
        std::fs::write(bin.path().join("a"), "a").unwrap();
        std::fs::write(bin.path().join("b"), "b").unwrap();

        let r = OutputReconciler;
        let before = r.list_files(bin.path()).unwrap();
        std::fs::write(bin.path().join("c"), "c").unwrap();
        let after = r.list_files(bin.path()).unwrap();

        let new = r.new_entries(&before, &after);
        assert_eq!(new, vec!["c".to_string()]);

        r.move_files(bin.path(), pwd.path(), &new).unwrap();
        assert!(pwd.path().join("c").is_file());
        assert!(!bin.path().join("c").exists());
        assert!(bin.path().join("a").exists());
        assert!(!pwd.path().join("a").exists());
    }

    #[test]
    fn test_moves_directories() {
        let bin = tempfile::tempdir().unwrap();
        let pwd = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(bin.path().join("out/nested")).unwrap();
        std::fs::write(bin.path().join("out/nested/report.txt"), "ok").unwrap();

        OutputReconciler
            .move_files(bin.path(), pwd.path(), &["out".to_string()])
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(pwd.path().join("out/nested/report.txt")).unwrap(),
            "ok"
        );
    }

    #[test]
    fn test_listing_missing_dir_is_filesystem_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = OutputReconciler
            .list_files(&tmp.path().join("gone"))
            .unwrap_err();
        assert!(matches!(err, RunnerError::Filesystem { .. }));
    }
}
