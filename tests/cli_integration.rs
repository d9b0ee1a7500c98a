//! CLI integration tests for the concord binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"
[[layer]]
name = "pos"
kind = "span"
features = ["PosValue"]

[agreement]
layer = "pos"
feature = "PosValue"
"#;

fn write_doc(dir: &Path, annotator: &str, tags: &[&str]) -> String {
    let text = "The cat sat down";
    let offsets = [(0, 3), (4, 7), (8, 11), (12, 16)];
    let annotations: Vec<serde_json::Value> = offsets
        .iter()
        .zip(tags)
        .enumerate()
        .map(|(i, ((b, e), tag))| {
            serde_json::json!({
                "id": i + 1,
                "layer": "pos",
                "begin": b,
                "end": e,
                "features": { "PosValue": tag }
            })
        })
        .collect();
    let doc = serde_json::json!({
        "name": "doc1",
        "annotator": annotator,
        "text": text,
        "annotations": annotations,
    });
    let path = dir.join(format!("{}.json", annotator));
    fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    path.to_string_lossy().to_string()
}

fn setup() -> (TempDir, String, String, String) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = dir.path().join("layers.toml");
    fs::write(&config, CONFIG).unwrap();
    let a = write_doc(dir.path(), "alice", &["DT", "NN", "VBD", "RP"]);
    let b = write_doc(dir.path(), "bob", &["DT", "NN", "VBN", "RP"]);
    let config = config.to_string_lossy().to_string();
    (dir, config, a, b)
}

fn concord() -> Command {
    Command::cargo_bin("concord").unwrap()
}

#[test]
fn test_diff_human() {
    let (_dir, config, a, b) = setup();
    concord()
        .args(["diff", "-c", &config, &a, &b])
        .assert()
        .success()
        .stdout(predicate::str::contains("pos[8-11]"))
        .stdout(predicate::str::contains("differ"))
        .stdout(predicate::str::contains("4 sets: 3 agreeing, 1 differing, 0 incomplete"));
}

#[test]
fn test_diff_json_only_differing() {
    let (_dir, config, a, b) = setup();
    let output = concord()
        .args(["diff", "-c", &config, "--only", "differing", "--format", "json", &a, &b])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["sets"].as_array().unwrap().len(), 1);
    assert_eq!(report["summary"]["total"], 4);
    assert_eq!(report["sets"][0]["status"], "differ");
}

#[test]
fn test_diff_unknown_layer_fails() {
    let (_dir, config, a, b) = setup();
    concord()
        .args(["diff", "-c", &config, "--layer", "ne", &a, &b])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No diff adapter for layer: ne"));
}

#[test]
fn test_agreement_uses_config_defaults() {
    let (_dir, config, a, b) = setup();
    concord()
        .args(["agreement", "-c", &config, &a, &b])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cohen's kappa on pos.PosValue"))
        .stdout(predicate::str::contains("items:      4"));
}

#[test]
fn test_agreement_json() {
    let (_dir, config, a, b) = setup();
    let output = concord()
        .args(["agreement", "-c", &config, "--measure", "percent", "-f", "json", &a, &b])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["result"]["value"], 0.75);
    assert_eq!(report["result"]["measure"], "percent");
}

#[test]
fn test_agreement_three_files_prints_pairwise() {
    let (dir, config, a, b) = setup();
    let c = write_doc(dir.path(), "carol", &["DT", "NN", "VBD", "IN"]);
    concord()
        .args(["agreement", "-c", &config, &a, &b, &c])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pairwise"))
        .stdout(predicate::str::contains("carol"));
}

#[test]
fn test_agreement_unknown_measure() {
    let (_dir, config, a, b) = setup();
    concord()
        .args(["agreement", "-c", &config, "--measure", "alpha", &a, &b])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown measure"));
}

#[test]
fn test_validate() {
    let (dir, config, a, _b) = setup();
    concord()
        .args(["validate", "-c", &config, &a])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));

    let broken = dir.path().join("broken.json");
    fs::write(
        &broken,
        r#"{"name":"doc1","annotator":"x","text":"short","annotations":[
            {"id":1,"layer":"pos","begin":2,"end":40}]}"#,
    )
    .unwrap();
    concord()
        .args(["validate", "-c", &config, broken.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_config_init_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("concord.toml");
    let path = path.to_str().unwrap();

    concord().args(["config", "init", path]).assert().success();
    concord()
        .args(["config", "init", path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    concord()
        .args(["config", "show", path])
        .assert()
        .success()
        .stdout(predicate::str::contains("name = \"pos\""));
}

#[test]
fn test_missing_config_fails() {
    let (_dir, _config, a, b) = setup();
    concord()
        .args(["diff", "-c", "/nonexistent/layers.toml", &a, &b])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}
