//! Integration tests for the climate-watch-nets binary.
//! Runs the built binary against plan documents in a temporary directory.

use serde_json::{Value, json};
use std::path::Path;
use std::process::{Command, Output};

fn plan(name: &str) -> Value {
    json!({
        "data": {"plan": {
            "organization": {"name": name},
            "actions": [
                {"id": "a1", "relatedActions": [{"id": "a2"}]},
                {"id": "a2", "relatedActions": [{"id": "a1"}]}
            ],
            "indicatorLevels": [
                {"level": "TACTICAL", "indicator": {
                    "id": "i1",
                    "relatedActions": [{"action": {"id": "a1"}}],
                    "relatedCauses": []
                }}
            ]
        }}
    })
}

fn setup(dir: &Path) {
    let data = dir.join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("jyvaskyla-ilmasto.json"),
        serde_json::to_string(&plan("Jyväskylä")).unwrap(),
    )
    .unwrap();
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_climate-watch-nets"))
        .args(args)
        .current_dir(dir)
        .env("CWN_DATA_FOLDER", dir.join("data"))
        .env("CWN_SAVE_PATH", dir.join("results"))
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

#[test]
fn test_construct_writes_edge_list() {
    let tmp = tempfile::tempdir().unwrap();
    setup(tmp.path());

    let out = run(tmp.path(), &["construct", "--tag", "jyvaskyla-ilmasto", "--json"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let edges = std::fs::read_to_string(tmp.path().join("results/jyvaskyla.edg")).unwrap();
    assert_eq!(edges.lines().count(), 2);
    assert!(edges.contains("a1 a2 1"));
    assert!(tmp.path().join("results/jyvaskyla.json").exists());
}

#[test]
fn test_analyze_prints_summary() {
    let tmp = tempfile::tempdir().unwrap();
    setup(tmp.path());

    let out = run(
        tmp.path(),
        &["analyze", "--tag", "jyvaskyla-ilmasto", "--tag", "missing"],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let summary: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["municipalities"][0]["label"], "jyvaskyla");
    assert_eq!(
        summary["municipalities"][0]["type_counts"]["action-indicator_TACTICAL"],
        1
    );
    assert_eq!(summary["failures"][0]["tag"], "missing");
}

#[test]
fn test_analyze_writes_output_file() {
    let tmp = tempfile::tempdir().unwrap();
    setup(tmp.path());
    let output = tmp.path().join("summary.json");

    let out = run(
        tmp.path(),
        &[
            "analyze",
            "--tag",
            "jyvaskyla-ilmasto",
            "--output",
            output.to_str().unwrap(),
        ],
    );
    assert!(out.status.success());
    let summary: Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(summary["municipalities"].as_array().unwrap().len(), 1);
}

#[test]
fn test_info_reports_counts() {
    let tmp = tempfile::tempdir().unwrap();
    setup(tmp.path());

    let out = run(tmp.path(), &["info", "--tag", "jyvaskyla-ilmasto"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Municipality: jyvaskyla"));
    assert!(stdout.contains("Nodes: 3"));
    assert!(stdout.contains("action-action: 1"));
}

#[test]
fn test_no_tags_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let out = run(tmp.path(), &["analyze"]);
    assert!(!out.status.success());
}

#[test]
fn test_invalid_config_file_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    setup(tmp.path());
    std::fs::write(
        tmp.path().join("climate-watch-nets.toml"),
        "[analysis]\nprojection_spanning_types = [\"policy\"]\n",
    )
    .unwrap();

    let out = run(tmp.path(), &["info", "--tag", "jyvaskyla-ilmasto"]);
    assert!(!out.status.success());
}
