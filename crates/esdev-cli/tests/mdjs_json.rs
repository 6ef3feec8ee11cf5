//! Integration tests for `esdev mdjs` output.

use serial_test::serial;
use std::fs;
use std::process::Command;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "esdev-cli", "--bin", "esdev", "--"]);
    cmd
}

const DOC: &str = "# Button\n\n```js script\nimport './button.js';\n```\n\n```js story\nexport const primary = () => html`<my-button></my-button>`;\n```\n";

#[test]
#[serial]
fn test_mdjs_json_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("button.md"), DOC).unwrap();

    let output = cargo_bin()
        .arg("--json")
        .arg("--cwd")
        .arg(dir.path())
        .args(["mdjs", "button.md"])
        .output()
        .expect("Failed to run mdjs command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("stdout should be valid JSON");

    assert_eq!(json["ok"], true);
    assert_eq!(json["schema_version"], 1);

    let stories = json["stories"].as_array().unwrap();
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0]["key"], "primary");
    assert_eq!(stories[0]["name"], "primary");
    assert_eq!(stories[0]["type"], "html");

    let html = json["html"].as_str().unwrap();
    assert!(html.contains(r#"<mdjs-story mdjs-story-name="primary"></mdjs-story>"#));
    assert!(html.contains(r#"<h1 id="button">"#));
    assert!(!html.contains("js script"));

    let js_code = json["jsCode"].as_str().unwrap();
    assert!(js_code.starts_with("import './button.js';"));
    assert!(js_code.contains("export const primary"));
    assert!(js_code.contains("key: 'primary'"));
}

#[test]
#[serial]
fn test_mdjs_writes_out_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("button.md"), DOC).unwrap();

    let output = cargo_bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["mdjs", "button.md", "--out", "dist/button.html", "--js-out", "dist/button.js"])
        .output()
        .expect("Failed to run mdjs command");

    assert!(output.status.success());
    let html = fs::read_to_string(dir.path().join("dist/button.html")).unwrap();
    let js = fs::read_to_string(dir.path().join("dist/button.js")).unwrap();
    assert!(html.contains("mdjs-story"));
    assert!(js.contains("export const primary"));
}

#[test]
#[serial]
fn test_mdjs_story_without_export_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("broken.md"),
        "```js story\nconst nope = 1;\n```\n",
    )
    .unwrap();

    let output = cargo_bin()
        .arg("--json")
        .arg("--cwd")
        .arg(dir.path())
        .args(["mdjs", "broken.md"])
        .output()
        .expect("Failed to run mdjs command");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "STORY_WITHOUT_EXPORT");
}

#[test]
#[serial]
fn test_mdjs_missing_file_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();

    let output = cargo_bin()
        .arg("--json")
        .arg("--cwd")
        .arg(dir.path())
        .args(["mdjs", "nope.md"])
        .output()
        .expect("Failed to run mdjs command");

    assert_eq!(output.status.code(), Some(2));
}
