//! Binary-level tests for the contract-flow CLI.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("contract-flow").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("plot"))
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("search"));
}

#[test]
fn plot_prints_mermaid_chain() {
    cmd()
        .arg("plot")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("flowchart TD"))
        .stdout(predicate::str::contains(
            "generate_contract_analysis --> generate_report",
        ));
}

#[test]
fn plot_json_includes_graph() {
    cmd()
        .args(["--format", "json", "plot", "--graph", "dot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"format\": \"dot\""))
        .stdout(predicate::str::contains("digraph contract_flow"));
}

#[test]
fn plot_rejects_unknown_format() {
    cmd()
        .args(["plot", "--graph", "svg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown graph format"));
}

#[test]
fn run_without_api_key_fails() {
    cmd()
        .env_remove("OPENAI_API_KEY")
        .args(["run", "--no-eval"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn ingest_without_cluster_url_fails() {
    let dir = TempDir::new().unwrap();
    cmd()
        .env_remove("WEAVIATE_URL")
        .args(["ingest", "--contracts-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("WEAVIATE_URL"));
}

#[test]
fn prompts_init_writes_templates() {
    let dir = TempDir::new().unwrap();
    cmd()
        .args(["prompts", "init", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 prompt template(s)"));

    assert!(dir.path().join("retrieval.md").exists());
    assert!(dir.path().join("report.md").exists());
    assert!(dir.path().join("hallucination.md").exists());
}
