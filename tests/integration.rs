//! End-to-end tests for the health-check runner
//!
//! These tests build a throwaway project containing fake `kustomize`, `yq`
//! and `argocd` scripts plus health script fixtures, then run the library
//! and the binary against it. The fake argocd prints the contents of the
//! input manifest, so each test controls the tool output directly.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use std::io::Write;

use health_check::testing::{self, RunOptions, TestCase};
use health_check::{Config, HealthStatus, HealthStatusCode, Settings};
use tempfile::TempDir;

const KUSTOMIZE: &str = r#"#!/bin/sh
if [ "$1" != "build" ] || [ ! -d "$2" ]; then
    echo "usage: kustomize build <dir>" >&2
    exit 2
fi
cat <<EOF
apiVersion: v1
kind: Service
metadata:
  name: argocd-server
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: argocd-cm
EOF
"#;

const YQ: &str = r#"#!/bin/sh
if [ "$1" != 'select(.kind == "ConfigMap" and .metadata.name == "argocd-cm")' ]; then
    echo "unexpected expression: $1" >&2
    exit 2
fi
cat
"#;

const ARGOCD: &str = r#"#!/bin/sh
cm=$(cat)
case "$cm" in
    *argocd-cm*) ;;
    *) echo "no argocd-cm on stdin" >&2; exit 4 ;;
esac
if [ "$1 $2 $3 $4" != "admin settings resource-overrides health" ] || [ "$6" != "--argocd-cm-path" ]; then
    echo "unexpected arguments: $*" >&2
    exit 2
fi
cat "$5"
if [ -f "$5.exit" ]; then
    echo "failed to assess $5" >&2
    exit "$(cat "$5.exit")"
fi
"#;

/// Throwaway project with fake tools and fixture directories
struct TestProject {
    dir: TempDir,
}

impl TestProject {
    fn new() -> Self {
        let project = Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        };
        project.script("bin/kustomize", KUSTOMIZE);
        project.script("bin/yq", YQ);
        project.script("bin/argocd", ARGOCD);
        fs::create_dir_all(project.root().join("argocd/argocd-install"))
            .expect("Failed to create manifest dir");
        project
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn fixtures_root(&self) -> PathBuf {
        self.root()
            .join("argocd/argocd-install/resource-customizations")
    }

    fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create parent dir");
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    fn script(&self, relative: &str, content: &str) {
        let path = self.write(relative, content);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
    }

    /// Add a health script directory with its fixture file
    fn fixture_dir(&self, group: &str, fixture: &str) -> PathBuf {
        let dir = format!("argocd/argocd-install/resource-customizations/{group}");
        self.write(&format!("{dir}/health.lua"), "hs = {}\nreturn hs\n");
        self.write(&format!("{dir}/health_test.yaml"), fixture);
        self.root().join(dir)
    }

    /// Add a sample manifest; the fake argocd prints it verbatim
    fn sample(&self, group: &str, input: &str, cli_output: &str) {
        self.write(
            &format!("argocd/argocd-install/resource-customizations/{group}/{input}"),
            cli_output,
        );
    }

    fn fail_sample(&self, group: &str, input: &str, code: i32) {
        self.write(
            &format!("argocd/argocd-install/resource-customizations/{group}/{input}.exit"),
            &code.to_string(),
        );
    }

    fn settings(&self) -> Settings {
        let mut config = Config::default();
        config.project_root = self.root().to_path_buf();
        config.settings()
    }

    fn config_file(&self) -> PathBuf {
        self.write(
            "health-check.toml",
            &format!("project_root = {:?}\n", self.root().display().to_string()),
        )
    }
}

fn quiet() -> RunOptions {
    RunOptions {
        quiet: true,
        ..Default::default()
    }
}

// ============== Tests ==============

#[tokio::test]
async fn test_healthy_case_passes() {
    let project = TestProject::new();
    project.fixture_dir(
        "apps/Deployment",
        "tests:\n- inputPath: testdata/good.yaml\n  healthStatus:\n    status: Healthy\n",
    );
    project.sample("apps/Deployment", "testdata/good.yaml", "STATUS: Healthy\n");

    let summary = testing::run_all(&project.settings(), &quiet()).await.unwrap();

    assert_eq!(summary.total(), 1);
    assert_eq!(summary.passed, 1, "outcomes: {:#?}", summary.cases);
    let outcome = &summary.cases[0];
    assert_eq!(outcome.name, "testdata/good.yaml");
    assert_eq!(
        outcome.actual,
        Some(HealthStatus::new(HealthStatusCode::Healthy, None))
    );
    summary.check().unwrap();
}

#[tokio::test]
async fn test_degraded_with_message_in_either_order() {
    let project = TestProject::new();
    project.fixture_dir(
        "apps/StatefulSet",
        r#"tests:
- inputPath: testdata/status-first.yaml
  healthStatus:
    status: Degraded
    message: replica mismatch
- inputPath: testdata/message-first.yaml
  healthStatus:
    status: Degraded
    message: replica mismatch
"#,
    );
    project.sample(
        "apps/StatefulSet",
        "testdata/status-first.yaml",
        "STATUS: Degraded\nMESSAGE: replica mismatch\n",
    );
    project.sample(
        "apps/StatefulSet",
        "testdata/message-first.yaml",
        "MESSAGE: replica mismatch\nSTATUS: Degraded\n",
    );

    let summary = testing::run_all(&project.settings(), &quiet()).await.unwrap();

    assert_eq!(summary.passed, 2, "outcomes: {:#?}", summary.cases);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_nonzero_exit_fails_but_siblings_run() {
    let project = TestProject::new();
    project.fixture_dir(
        "batch/CronJob",
        r#"tests:
- inputPath: testdata/broken.yaml
  healthStatus:
    status: Healthy
- inputPath: testdata/suspended.yaml
  healthStatus:
    status: Suspended
    message: CronJob is suspended
"#,
    );
    project.sample("batch/CronJob", "testdata/broken.yaml", "STATUS: Healthy\n");
    project.fail_sample("batch/CronJob", "testdata/broken.yaml", 1);
    project.sample(
        "batch/CronJob",
        "testdata/suspended.yaml",
        "STATUS: Suspended\nMESSAGE: CronJob is suspended\n",
    );

    let summary = testing::run_all(&project.settings(), &quiet()).await.unwrap();

    assert_eq!(summary.total(), 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.passed, 1);

    let broken = &summary.cases[0];
    assert!(!broken.passed());
    assert_eq!(broken.errors.len(), 1, "errors: {:?}", broken.errors);
    assert!(broken.errors[0].contains("failed to assess"));
    assert!(broken
        .stderr
        .as_deref()
        .is_some_and(|s| s.contains("failed to assess")));
    assert_eq!(
        broken.actual,
        Some(HealthStatus::new(HealthStatusCode::Healthy, None))
    );

    assert!(summary.cases[1].passed());
    assert!(summary.check().is_err());
}

#[tokio::test]
async fn test_mismatch_reports_both_values() {
    let project = TestProject::new();
    project.fixture_dir(
        "apps/Deployment",
        "tests:\n- inputPath: testdata/slow.yaml\n  healthStatus:\n    status: Healthy\n",
    );
    project.sample(
        "apps/Deployment",
        "testdata/slow.yaml",
        "Waiting for rollout\nSTATUS: Progressing\nMESSAGE: 1 of 3 updated\n",
    );

    let summary = testing::run_all(&project.settings(), &quiet()).await.unwrap();

    let outcome = &summary.cases[0];
    assert!(!outcome.passed());
    assert!(outcome.errors[0].contains("expected status=Healthy message=<none>"));
    assert!(outcome.errors[0].contains(r#"got status=Progressing message="1 of 3 updated""#));
    assert_eq!(outcome.log, ["Waiting for rollout"]);
}

#[tokio::test]
async fn test_unrecognized_lines_do_not_fail() {
    let project = TestProject::new();
    project.fixture_dir(
        "apps/Deployment",
        "tests:\n- inputPath: testdata/noisy.yaml\n  healthStatus:\n    status: Healthy\n",
    );
    project.sample(
        "apps/Deployment",
        "testdata/noisy.yaml",
        "DEBUG: something\nSTATUS: Healthy\nplain text without separator\n",
    );

    let summary = testing::run_all(&project.settings(), &quiet()).await.unwrap();

    assert!(summary.cases[0].passed(), "outcome: {:#?}", summary.cases[0]);
    assert_eq!(
        summary.cases[0].log,
        ["DEBUG: something", "plain text without separator"]
    );
}

#[tokio::test]
async fn test_bad_fixture_fails_only_its_directory() {
    let project = TestProject::new();
    project.fixture_dir("a.io/Broken", "tests: [inputPath: {");
    project.fixture_dir(
        "b.io/Widget",
        "tests:\n- inputPath: testdata/ok.yaml\n  healthStatus:\n    status: Healthy\n",
    );
    project.sample("b.io/Widget", "testdata/ok.yaml", "STATUS: Healthy\n");

    let summary = testing::run_all(&project.settings(), &quiet()).await.unwrap();

    assert_eq!(summary.total(), 2);
    assert!(!summary.cases[0].passed());
    assert!(summary.cases[0].errors[0].contains("Invalid fixture file"));
    assert!(summary.cases[1].passed());
}

#[tokio::test]
async fn test_missing_binary_is_an_execution_error() {
    let project = TestProject::new();
    project.fixture_dir(
        "apps/Deployment",
        "tests:\n- inputPath: testdata/good.yaml\n  healthStatus:\n    status: Healthy\n",
    );
    project.sample("apps/Deployment", "testdata/good.yaml", "STATUS: Healthy\n");
    fs::remove_file(project.root().join("bin/yq")).unwrap();

    let summary = testing::run_all(&project.settings(), &quiet()).await.unwrap();

    let outcome = &summary.cases[0];
    assert!(!outcome.passed());
    assert!(outcome.errors[0].contains("Failed to start"));
    assert_eq!(outcome.actual, Some(HealthStatus::default()));
}

#[tokio::test]
async fn test_rerun_yields_same_result() {
    let project = TestProject::new();
    let dir = project.fixture_dir(
        "apps/Deployment",
        "tests:\n- inputPath: testdata/good.yaml\n  healthStatus:\n    status: Healthy\n",
    );
    project.sample(
        "apps/Deployment",
        "testdata/good.yaml",
        "STATUS: Healthy\nMESSAGE: ready\n",
    );

    let settings = project.settings();
    let case = TestCase {
        dir,
        test: testing::IndividualTest {
            input_path: "testdata/good.yaml".into(),
            health_status: HealthStatus::new(HealthStatusCode::Healthy, Some("ready")),
        },
    };

    let first = testing::run_case(&settings, &case).await;
    let second = testing::run_case(&settings, &case).await;
    assert!(first.passed(), "outcome: {first:#?}");
    assert_eq!(first.actual, second.actual);
    assert_eq!(first.errors, second.errors);
}

#[tokio::test]
async fn test_outcome_records_command_that_ran() {
    let project = TestProject::new();
    let dir = project.fixture_dir(
        "apps/Deployment",
        "tests:\n- inputPath: testdata/good.yaml\n  healthStatus:\n    status: Healthy\n",
    );
    project.sample("apps/Deployment", "testdata/good.yaml", "STATUS: Healthy\n");

    let settings = project.settings();
    let summary = testing::run_all(&settings, &quiet()).await.unwrap();

    let command = summary.cases[0].command.as_deref().expect("command recorded");
    let input = dir.join("testdata/good.yaml");
    assert_eq!(
        command,
        testing::Pipeline::health_check(&settings, &input).to_string()
    );
    assert!(command.contains("resource-overrides health"));
    assert!(command.contains(&input.display().to_string()));
}

#[tokio::test]
async fn test_filter_limits_cases() {
    let project = TestProject::new();
    for group in ["apps/Deployment", "batch/Job"] {
        project.fixture_dir(
            group,
            "tests:\n- inputPath: testdata/good.yaml\n  healthStatus:\n    status: Healthy\n",
        );
        project.sample(group, "testdata/good.yaml", "STATUS: Healthy\n");
    }

    let options = RunOptions {
        filter: Some("batch/".into()),
        quiet: true,
        ..Default::default()
    };
    let summary = testing::run_all(&project.settings(), &options).await.unwrap();

    assert_eq!(summary.total(), 1);
    assert!(summary.cases[0].dir.ends_with("batch/Job"));
}

#[tokio::test]
async fn test_missing_fixtures_root_fails_run() {
    let project = TestProject::new();
    let err = testing::run_all(&project.settings(), &quiet())
        .await
        .unwrap_err();
    assert!(matches!(err, health_check::Error::Discovery { .. }));
    assert!(!project.fixtures_root().exists());
}

// ============== Binary ==============

fn health_check_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_health-check"))
}

#[test]
fn test_binary_json_report_and_exit_code() {
    let project = TestProject::new();
    project.fixture_dir(
        "apps/Deployment",
        r#"tests:
- inputPath: testdata/good.yaml
  healthStatus:
    status: Healthy
- inputPath: testdata/bad.yaml
  healthStatus:
    status: Healthy
"#,
    );
    project.sample("apps/Deployment", "testdata/good.yaml", "STATUS: Healthy\n");
    project.sample("apps/Deployment", "testdata/bad.yaml", "STATUS: Degraded\n");
    let config = project.config_file();

    let output = health_check_bin()
        .args(["--config", config.to_str().unwrap(), "run", "--json"])
        .output()
        .expect("Failed to run health-check");

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["passed"], 1);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["cases"][1]["actual"]["status"], "Degraded");
    assert!(String::from_utf8_lossy(&output.stderr).contains("1 of 2 health checks failed"));
}

#[test]
fn test_binary_list() {
    let project = TestProject::new();
    project.fixture_dir(
        "apps/Deployment",
        "tests:\n- inputPath: testdata/good.yaml\n  healthStatus:\n    status: Healthy\n",
    );
    let config = project.config_file();

    let output = health_check_bin()
        .env("NO_COLOR", "1")
        .args(["--config", config.to_str().unwrap(), "list", "--commands"])
        .output()
        .expect("Failed to run health-check");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("testdata/good.yaml"), "stdout: {stdout}");
    assert!(stdout.contains("resource-overrides health"), "stdout: {stdout}");
    assert!(stdout.contains("1 cases in 1 directories"), "stdout: {stdout}");
}

#[test]
fn test_binary_parse_stdin() {
    let mut child = health_check_bin()
        .arg("parse")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run health-check");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"STATUS: Healthy\nDEBUG: x\nSTATUS:  Degraded \nMESSAGE: late\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let parsed: HealthStatus = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, HealthStatus::new(HealthStatusCode::Degraded, Some("late")));
}
