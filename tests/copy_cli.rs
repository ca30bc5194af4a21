#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end runs of the `site-copy` binary against temporary trees

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn site_copy(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("site-copy").expect("site-copy binary");
    cmd.current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn write_document(dir: &Path, ext_b: &str) {
    let document = serde_json::json!({
        "spider": "./jar/spider.jar;md5;x",
        "sites": [
            {"key": "before", "ext": "./before.json"},
            {"key": "cbh", "name": "marker"},
            {"key": "a", "api": "./py/a.py?type=1", "ext": "./XBPQ/a.json"},
            {"key": "b", "api": "csp_Xbpq", "ext": ext_b},
            {"key": "奇优", "ext": "./after.json"}
        ]
    });
    write(&dir.join("api.json"), &document.to_string());
}

#[test]
fn missing_document_argument_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    site_copy(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_exits_successfully() {
    let dir = TempDir::new().unwrap();
    site_copy(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--source-root"));
}

#[test]
fn copies_referenced_files_into_destination() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_document(root, "./lib/b.js?k=v");
    write(&root.join("xiaosa/py/a.py"), "print('a')");
    write(&root.join("xiaosa/XBPQ/a.json"), "{}");
    write(&root.join("xiaosa/lib/b.js"), "var b;");
    write(&root.join("xiaosa/before.json"), "{}");

    site_copy(root)
        .args(["api.json", "--output-format", "plain"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Copied:"))
        .stdout(predicate::str::contains("Done: copied 3, missing 0"));

    assert_eq!(fs::read_to_string(root.join("py/a.py")).unwrap(), "print('a')");
    assert!(root.join("XBPQ/a.json").is_file());
    assert!(root.join("lib/b.js").is_file());
    assert!(!root.join("before.json").exists());
}

#[test]
fn missing_sources_are_reported_with_exit_code_two() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_document(root, "../lib/gone.js");
    write(&root.join("src/py/a.py"), "a");
    write(&root.join("src/XBPQ/a.json"), "{}");

    site_copy(root)
        .args([
            "api.json",
            "--source-root",
            "src",
            "--dest-root",
            "out",
            "--output-format",
            "plain",
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Source file not found:"))
        .stdout(predicate::str::contains("Done: copied 2, missing 1"));

    assert!(root.join("out/py/a.py").is_file());
    assert!(!root.join("out/lib").exists());
}

#[test]
fn window_without_markers_warns_and_succeeds() {
    let dir = TempDir::new().unwrap();
    write_document(dir.path(), "./x.js");

    site_copy(dir.path())
        .args(["api.json", "--start", "nope", "--output-format", "plain"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains(
            "No local paths found between 'nope' and '奇优'",
        ));
}

#[test]
fn dry_run_reports_json_without_copying() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_document(root, "./lib/b.js");
    write(&root.join("xiaosa/lib/b.js"), "b");

    site_copy(root)
        .args(["api.json", "--dest-root", "out", "--dry-run", "--output-format", "json"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"dry_run\": true"));

    assert!(!root.join("out").exists());
}

#[test]
fn identical_roots_do_not_truncate_sources() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_document(root, "./lib/b.js");
    write(&root.join("lib/b.js"), "var b;");

    site_copy(root)
        .args(["api.json", "--source-root", ".", "--dest-root", ".", "--output-format", "plain"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("same file"));

    assert_eq!(fs::read_to_string(root.join("lib/b.js")).unwrap(), "var b;");
}

#[test]
fn missing_document_file_exits_three() {
    let dir = TempDir::new().unwrap();
    site_copy(dir.path())
        .args(["absent.json", "--output-format", "plain"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Document does not exist"));
}

#[test]
fn generate_config_writes_sample() {
    let dir = TempDir::new().unwrap();
    site_copy(dir.path())
        .args(["--generate-config", "--config", "custom.toml"])
        .assert()
        .success();

    let content = fs::read_to_string(dir.path().join("custom.toml")).unwrap();
    assert!(content.contains("[copy]"));
    assert!(content.contains("start_key"));
}
