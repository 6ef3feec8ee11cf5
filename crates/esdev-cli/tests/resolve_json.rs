//! Integration tests for `esdev resolve --json` output.

use serial_test::serial;
use std::fs;
use std::path::Path;
use std::process::Command;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "esdev-cli", "--bin", "esdev", "--"]);
    cmd
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A project with one package in node_modules and a source file importing it.
fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("src/app.js"), "import 'lit-element';\n");
    write(
        &root.join("node_modules/lit-element/package.json"),
        r#"{ "name": "lit-element", "module": "lit-element.js", "main": "index.cjs" }"#,
    );
    write(&root.join("node_modules/lit-element/lit-element.js"), "export {};\n");
    write(&root.join("node_modules/lit-element/index.cjs"), "module.exports = {};\n");
    dir
}

fn run_json(cwd: &Path, args: &[&str]) -> (std::process::Output, serde_json::Value) {
    let output = cargo_bin()
        .arg("--json")
        .arg("--cwd")
        .arg(cwd)
        .args(args)
        .output()
        .expect("Failed to run resolve command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    (output, json)
}

#[test]
#[serial]
fn test_resolve_bare_import_json() {
    let dir = project();
    let (output, json) = run_json(
        dir.path(),
        &["resolve", "lit-element", "--importer", "/src/app.js"],
    );

    assert!(output.status.success());
    assert_eq!(json["ok"], true);
    assert_eq!(json["schema_version"], 1);
    assert_eq!(json["specifier"], "lit-element");
    assert_eq!(json["importer"], "/src/app.js");
    assert_eq!(
        json["resolved"],
        "../node_modules/lit-element/lit-element.js"
    );
}

#[test]
#[serial]
fn test_resolve_keeps_query_and_hash() {
    let dir = project();
    let (output, json) = run_json(
        dir.path(),
        &["resolve", "lit-element?v=2#top", "--importer", "/index.js"],
    );

    assert!(output.status.success());
    assert_eq!(
        json["resolved"],
        "./node_modules/lit-element/lit-element.js?v=2#top"
    );
}

#[test]
#[serial]
fn test_resolve_uses_config_main_fields() {
    let dir = project();
    write(
        &dir.path().join("esdev.config.json"),
        r#"{ "nodeResolve": { "mainFields": ["main"] } }"#,
    );
    let (output, json) = run_json(dir.path(), &["resolve", "lit-element"]);

    assert!(output.status.success());
    assert_eq!(json["resolved"], "./node_modules/lit-element/index.cjs");
}

#[test]
#[serial]
fn test_resolve_missing_package_is_error_json() {
    let dir = project();
    let (output, json) = run_json(
        dir.path(),
        &["resolve", "missing-pkg", "--importer", "/src/app.js"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "RESOLUTION_FAILED");
    let message = json["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("Could not resolve import \"missing-pkg\""));
}

#[test]
#[serial]
fn test_resolve_bad_config_is_validation_error() {
    let dir = project();
    write(&dir.path().join("esdev.config.json"), "{ not json");
    let (output, json) = run_json(dir.path(), &["resolve", "lit-element"]);

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(json["error"]["code"], "CONFIG_INVALID");
}

#[test]
#[serial]
fn test_resolve_human_output_is_single_line() {
    let dir = project();
    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["resolve", "lit-element"])
        .output()
        .expect("Failed to run resolve command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "./node_modules/lit-element/lit-element.js");
}
