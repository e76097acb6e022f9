//! Integration tests for top-level CLI behavior.

use std::path::PathBuf;
use std::process::Command;

fn sample() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/sample_app.json")
        .display()
        .to_string()
}

fn run_sleuth(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_knack-sleuth");
    Command::new(bin)
        .args(args)
        .env_remove("KNACK_APP_ID")
        .env_remove("RUST_LOG")
        .env("KNACK_API_BASE_URL", "http://127.0.0.1:9")
        .output()
        .expect("failed to run knack-sleuth binary")
}

#[test]
fn list_objects_prints_table() {
    let output = run_sleuth(&["list-objects", &sample()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Project Tracker - Objects"));
    assert!(stdout.contains("Total: 5 objects | 1,068 rows"));
}

#[test]
fn search_object_lists_usages() {
    let output = run_sleuth(&["search-object", "Customers", &sample()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Object: Customers (object_2)"));
    assert!(stdout.contains("Builder pages to review"));
}

#[test]
fn search_field_reports_ambiguity() {
    let output = run_sleuth(&["search-field", "Name", &sample()]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Error: 'Name' is ambiguous"));
}

#[test]
fn show_coupling_for_tasks() {
    let output = run_sleuth(&["show-coupling", "object_4", &sample()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Ca: 0 | Ce: 2"));
}

#[test]
fn impact_analysis_writes_markdown_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("impact.md");
    let output = run_sleuth(&[
        "impact-analysis",
        "Customers",
        &sample(),
        "--format",
        "markdown",
        "-o",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let text = std::fs::read_to_string(out).unwrap();
    assert!(text.starts_with("# Impact Analysis: Customers"));
}

#[test]
fn app_summary_prints_json() {
    let output = run_sleuth(&["app-summary", &sample()]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["application"]["name"], "Project Tracker");
}

#[test]
fn export_schema_as_yaml() {
    let output = run_sleuth(&["export-schema", &sample(), "--format", "yaml"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("relationship_type: many-to-one"));
}

#[test]
fn missing_app_id_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_knack-sleuth"))
        .args(["list-objects"])
        .current_dir(dir.path())
        .env_remove("KNACK_APP_ID")
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Error: Configuration error"));
}

#[test]
fn invalid_policy_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let policy = dir.path().join("policy.yaml");
    std::fs::write(&policy, "core_max: 0\n").unwrap();
    let output = run_sleuth(&["list-objects", &sample(), "--policy", policy.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("core_max"));
}

#[test]
fn help_lists_commands() {
    let output = run_sleuth(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    for command in ["search-object", "impact-analysis", "export-schema"] {
        assert!(stdout.contains(command), "missing {command}");
    }
}
