#![cfg(unix)]

mod support;

use std::path::Path;
use std::sync::Arc;

use formula_runner::docker::DockerCli;
use formula_runner::environment::{EnvironmentComposer, FileContextFinder};
use formula_runner::executor::DockerExecutor;
use formula_runner::input::{EnvCredentialResolver, FlagSet, InputResolver, TerminalPrompter};
use formula_runner::pre_run::DockerPreRunner;
use formula_runner::report::AuditReporter;
use formula_runner::{Channel, Runner, RunnerError};
use support::*;

fn docker_runner(home: &Path, pwd: &Path, docker: &Path) -> Runner {
    let cli = DockerCli::new(docker);
    Runner::new(
        Arc::new(DockerPreRunner::new(home, cli.clone()).with_working_dir(pwd)),
        InputResolver::standard(Arc::new(TerminalPrompter), Arc::new(EnvCredentialResolver::default())),
        EnvironmentComposer::new(Arc::new(FileContextFinder::new(home.join("contexts")))),
        Arc::new(DockerExecutor::new(cli).with_tty(false)),
        Arc::new(AuditReporter),
    )
}

fn containerized_formula(home: &Path) -> std::path::PathBuf {
    let dir = env_dumping_formula(
        home,
        r#"{"inputs": [{"name": "name", "type": "text"}], "dockerImageBuilder": "alpine:3"}"#,
    );
    std::fs::write(dir.join("Dockerfile"), "FROM alpine:3\n").unwrap();
    dir
}

/// `formula-<id>` image and `formula-run-<id>` container from the logged calls.
fn names(log: &[String]) -> (String, String) {
    let create = log.iter().find(|l| l.starts_with("create ")).unwrap();
    let mut words = create.split_whitespace().rev();
    let image = words.next().unwrap().to_string();
    let container = words.next().unwrap().to_string();
    (image, container)
}

#[test]
fn container_lifecycle_runs_in_order() {
    let home = tempfile::tempdir().unwrap();
    let pwd = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let docker = fake_docker(bin.path());
    let dir = containerized_formula(home.path());

    let flags: FlagSet = [("name", "dennis")].into_iter().collect();
    docker_runner(home.path(), pwd.path(), &docker)
        .run(&definition(), Channel::Flag, true, &flags)
        .unwrap();

    let log = docker_log(bin.path());
    let (image, container) = names(&log);
    let pwd = pwd.path().display();
    let env_file = log[2]
        .split_whitespace()
        .skip_while(|w| *w != "--env-file")
        .nth(1)
        .unwrap()
        .to_string();
    assert_eq!(
        log,
        vec![
            "version".to_string(),
            format!("build -t {} {}", image, dir.display()),
            format!("create -i --env-file {} -w /app --name {} {}", env_file, container, image),
            format!("cp {}/. {}:/app", pwd, container),
            format!("start -a {}", container),
            format!("cp {}:/app/. {}", container, pwd),
            format!("rm -f {}", container),
            format!("rmi -f {}", image),
        ]
    );
    assert!(container.starts_with("formula-run-"));

    let passed = std::fs::read_to_string(bin.path().join("env-file.txt")).unwrap();
    let passed: Vec<&str> = passed.lines().collect();
    let pwd_line = format!("CURRENT_PWD={}", pwd);
    assert_eq!(
        passed,
        vec![
            pwd_line.as_str(),
            "CONTEXT=",
            "VERBOSE_MODE=true",
            "DOCKER_EXECUTION=true",
            "ENV=",
            "NAME=dennis",
        ]
    );
}

#[test]
fn failed_start_still_tears_down_and_skips_copy_back() {
    let home = tempfile::tempdir().unwrap();
    let pwd = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let docker = fake_docker(bin.path());
    std::fs::write(bin.path().join("fail-start"), "").unwrap();
    containerized_formula(home.path());

    let flags: FlagSet = [("name", "dennis")].into_iter().collect();
    let err = docker_runner(home.path(), pwd.path(), &docker)
        .run(&definition(), Channel::Flag, false, &flags)
        .unwrap_err();
    assert!(matches!(err, RunnerError::Execution(_)));

    let log = docker_log(bin.path());
    let (_, container) = names(&log);
    assert!(log.contains(&format!("rm -f {}", container)));
    assert!(!log.iter().any(|l| l.starts_with(&format!("cp {}:", container))));
}

#[test]
fn teardown_failure_does_not_mask_execution_failure() {
    let home = tempfile::tempdir().unwrap();
    let pwd = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let docker = fake_docker(bin.path());
    std::fs::write(bin.path().join("fail-start"), "").unwrap();
    std::fs::write(bin.path().join("fail-rm"), "").unwrap();
    containerized_formula(home.path());

    let flags: FlagSet = [("name", "dennis")].into_iter().collect();
    let err = docker_runner(home.path(), pwd.path(), &docker)
        .run(&definition(), Channel::Flag, false, &flags)
        .unwrap_err();
    assert!(matches!(err, RunnerError::Execution(_)));
}

#[test]
fn teardown_failure_after_success_is_container_failure() {
    let home = tempfile::tempdir().unwrap();
    let pwd = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let docker = fake_docker(bin.path());
    std::fs::write(bin.path().join("fail-rm"), "").unwrap();
    containerized_formula(home.path());

    let flags: FlagSet = [("name", "dennis")].into_iter().collect();
    let err = docker_runner(home.path(), pwd.path(), &docker)
        .run(&definition(), Channel::Flag, false, &flags)
        .unwrap_err();
    assert!(matches!(err, RunnerError::Container(_)));
}

#[test]
fn missing_dockerfile_is_not_found_and_nothing_is_created() {
    let home = tempfile::tempdir().unwrap();
    let pwd = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let docker = fake_docker(bin.path());
    env_dumping_formula(home.path(), r#"{"inputs": []}"#);

    let err = docker_runner(home.path(), pwd.path(), &docker)
        .run(&definition(), Channel::Flag, false, &FlagSet::new())
        .unwrap_err();
    assert!(matches!(err, RunnerError::NotFound(_)));
    assert_eq!(docker_log(bin.path()), vec!["version".to_string()]);
}

#[test]
fn image_is_removed_when_inputs_fail() {
    let home = tempfile::tempdir().unwrap();
    let pwd = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let docker = fake_docker(bin.path());
    containerized_formula(home.path());

    let err = docker_runner(home.path(), pwd.path(), &docker)
        .run(&definition(), Channel::Flag, false, &FlagSet::new())
        .unwrap_err();
    assert!(matches!(err, RunnerError::InputValidation { ref input, .. } if input == "name"));

    let log = docker_log(bin.path());
    let image = log[1].split_whitespace().nth(2).unwrap().to_string();
    assert!(image.starts_with("formula-"));
    assert_eq!(
        log,
        vec![
            "version".to_string(),
            format!("build -t {} {}", image, definition().formula_path(home.path()).display()),
            format!("rmi -f {}", image),
        ]
    );
}

#[test]
fn failed_image_build_is_build_failure() {
    let home = tempfile::tempdir().unwrap();
    let pwd = tempfile::tempdir().unwrap();
    let bin = tempfile::tempdir().unwrap();
    let docker = fake_docker(bin.path());
    std::fs::write(bin.path().join("fail-build"), "").unwrap();
    containerized_formula(home.path());

    let err = docker_runner(home.path(), pwd.path(), &docker)
        .run(&definition(), Channel::Flag, false, &FlagSet::new())
        .unwrap_err();
    match err {
        RunnerError::BuildFailure(msg) => assert!(msg.contains("simulated build failure")),
        other => panic!("unexpected error: {other:?}"),
    }
}
