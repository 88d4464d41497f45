//! Scratch formula homes and fake executables for integration tests.
#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use formula_core::formula::Definition;

pub const REPO: &str = "commons";
pub const FORMULA: &str = "hello/world";

pub fn definition() -> Definition {
    Definition::new(REPO, FORMULA)
}

pub fn write_executable(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// `<home>/repos/commons/hello/world` with the given manifest.
pub fn formula_dir(home: &Path, manifest: &str) -> PathBuf {
    let dir = definition().formula_path(home);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.json"), manifest).unwrap();
    dir
}

/// A formula whose `bin/run.sh` dumps its environment into `$CURRENT_PWD/env.txt`.
pub fn env_dumping_formula(home: &Path, manifest: &str) -> PathBuf {
    let dir = formula_dir(home, manifest);
    write_executable(&dir.join("bin").join("run.sh"), "env > \"$CURRENT_PWD/env.txt\"");
    dir
}

pub fn read_env_dump(pwd: &Path) -> Vec<String> {
    std::fs::read_to_string(pwd.join("env.txt"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// A `docker` stand-in that logs every invocation to `docker.log` beside it,
/// keeps a copy of the `--env-file` it was given, and fails the subcommand
/// `<cmd>` when a `fail-<cmd>` marker file exists.
pub fn fake_docker(dir: &Path) -> PathBuf {
    let path = dir.join("docker");
    write_executable(
        &path,
        r#"HERE="$(dirname "$0")"
CMD="$1"
echo "$*" >> "$HERE/docker.log"
if [ -f "$HERE/fail-$CMD" ]; then
  echo "simulated $CMD failure" >&2
  exit 3
fi
if [ "$CMD" = "create" ]; then
  while [ $# -gt 0 ]; do
    if [ "$1" = "--env-file" ]; then cp "$2" "$HERE/env-file.txt"; fi
    shift
  done
fi
exit 0"#,
    );
    path
}

pub fn docker_log(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("docker.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
