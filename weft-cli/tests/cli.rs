use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn weft() -> Command {
    Command::cargo_bin("weft").expect("weft binary builds")
}

fn init_workspace(root: &Path) {
    weft()
        .arg("init")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized Weft workspace"));
}

fn article_file(root: &Path) -> std::path::PathBuf {
    let path = root.join("article.json");
    let payload = serde_json::json!({
        "title": "Breaking News",
        "link": "https://example.com/a",
        "date": "2024-01-01",
    });
    std::fs::write(&path, payload.to_string()).expect("write payload");
    path
}

#[test]
fn init_creates_a_workspace() {
    let dir = tempfile::tempdir().expect("create tempdir");
    init_workspace(dir.path());

    assert!(dir.path().join(".weft/config.toml").exists());
    assert!(dir.path().join(".weft/weft.db").exists());

    // A second init refuses to clobber the config
    weft()
        .arg("init")
        .arg(dir.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("already initialized"));

    weft()
        .args(["init", "--force"])
        .arg(dir.path())
        .assert()
        .success();
}

#[test]
fn status_requires_an_initialized_workspace() {
    let dir = tempfile::tempdir().expect("create tempdir");

    weft()
        .arg("status")
        .arg(dir.path())
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn ingest_then_status_reports_counts() {
    let dir = tempfile::tempdir().expect("create tempdir");
    init_workspace(dir.path());
    let payload = article_file(dir.path());

    weft()
        .arg("ingest")
        .arg("news")
        .arg(&payload)
        .arg("--path")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nodes: 6"))
        .stdout(predicate::str::contains("Edges: 15"));

    weft()
        .arg("status")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nodes: 6 total"))
        .stdout(predicate::str::contains("news"))
        .stdout(predicate::str::contains("Snapshots: 1"));
}

#[test]
fn ingest_reads_payload_from_stdin() {
    let dir = tempfile::tempdir().expect("create tempdir");
    init_workspace(dir.path());

    weft()
        .arg("ingest")
        .arg("wire")
        .arg("-")
        .arg("--path")
        .arg(dir.path())
        .arg("--run-id")
        .arg("8f9e2f4e-1a6b-4f6e-9f1d-3c5a2b7d0c11")
        .write_stdin(r#"{"headline": "flash", "site": "Example Wire"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nodes: 4"))
        .stdout(predicate::str::contains("8f9e2f4e-1a6b-4f6e-9f1d-3c5a2b7d0c11"));
}

#[test]
fn query_emits_parseable_json() {
    let dir = tempfile::tempdir().expect("create tempdir");
    init_workspace(dir.path());
    let payload = article_file(dir.path());

    weft()
        .arg("ingest")
        .arg("news")
        .arg(&payload)
        .arg("--path")
        .arg(dir.path())
        .assert()
        .success();

    let output = weft()
        .arg("query")
        .arg("24h")
        .arg("--path")
        .arg(dir.path())
        .arg("--format")
        .arg("json")
        .output()
        .expect("run query");
    assert!(output.status.success());

    let response: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("summary should be valid JSON");
    let nodes = response["graph"]["nodes"]
        .as_array()
        .expect("graph.nodes array");
    assert_eq!(nodes.len(), 6);
    assert_eq!(response["meta"]["range"], "24h");
}

#[test]
fn query_prints_a_summary_by_default() {
    let dir = tempfile::tempdir().expect("create tempdir");
    init_workspace(dir.path());
    let payload = article_file(dir.path());

    weft()
        .arg("ingest")
        .arg("news")
        .arg(&payload)
        .arg("--path")
        .arg(dir.path())
        .assert()
        .success();

    weft()
        .arg("query")
        .arg("--path")
        .arg(dir.path())
        .arg("--source")
        .arg("news")
        .assert()
        .success()
        .stdout(predicate::str::contains("Graph for the last 24h"))
        .stdout(predicate::str::contains("Nodes in window: 6"));
}

#[test]
fn query_rejects_unknown_ranges() {
    let dir = tempfile::tempdir().expect("create tempdir");
    init_workspace(dir.path());

    weft()
        .arg("query")
        .arg("99h")
        .arg("--path")
        .arg(dir.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid time range"));
}

#[test]
fn malformed_payloads_fail_cleanly() {
    let dir = tempfile::tempdir().expect("create tempdir");
    init_workspace(dir.path());
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{not json").expect("write payload");

    weft()
        .arg("ingest")
        .arg("news")
        .arg(&path)
        .arg("--path")
        .arg(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not valid JSON"));
}
