//! End-to-end checks of the `jobdesc` binary against a file-backed store.

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(temp_dir: &TempDir, args: &[&str]) -> Output {
    let db_path = temp_dir.path().join("store.db");
    Command::new(env!("CARGO_BIN_EXE_jobdesc"))
        .current_dir(temp_dir.path())
        .env_remove("JOBDESC_DB_PATH")
        .env_remove("JOBDESC_LOG_DIR")
        .env_remove("JOBDESC_LOG_LEVEL")
        .arg("--db-path")
        .arg(&db_path)
        .args(args)
        .output()
        .expect("failed to execute jobdesc")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn write_payload(dir: &Path, user_id: &str, title: &str) -> String {
    let path = dir.join(format!("{title}.json"));
    let payload = json!({
        "user_id": user_id,
        "title": title,
        "company": "Acme",
        "description": "Ship it",
        "requirements": ["Rust"],
        "skills": [],
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "is_active": true
    });
    fs::write(&path, payload.to_string()).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn upsert_list_get_delete_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let payload = write_payload(temp_dir.path(), "u1", "Engineer");

    let created = stdout_json(&run(&temp_dir, &["upsert", &payload]));
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["is_active"], json!(true));

    let again = stdout_json(&run(&temp_dir, &["upsert", &payload]));
    assert_eq!(again["id"], json!(id));

    let listed = stdout_json(&run(&temp_dir, &["list", "--user", "u1"]));
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let inactive = stdout_json(&run(&temp_dir, &["list", "--user", "u1", "--active", "false"]));
    assert!(inactive.as_array().unwrap().is_empty());

    let fetched = stdout_json(&run(&temp_dir, &["get", "--user", "u1", &id]));
    assert_eq!(fetched["title"], json!("Engineer"));

    let deleted = stdout_json(&run(&temp_dir, &["delete", "--user", "u1", &id]));
    assert_eq!(deleted["deleted"], json!(true));

    let listed = stdout_json(&run(&temp_dir, &["list", "--user", "u1"]));
    assert!(listed.as_array().unwrap().is_empty());
}

#[test]
fn foreign_user_is_denied() {
    let temp_dir = TempDir::new().unwrap();
    let payload = write_payload(temp_dir.path(), "owner", "Engineer");
    let created = stdout_json(&run(&temp_dir, &["upsert", &payload]));
    let id = created["id"].as_str().unwrap();

    let output = run(&temp_dir, &["get", "--user", "intruder", id]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("permission"), "stderr was: {stderr}");
}

#[test]
fn invalid_payload_reports_fields() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.json");
    fs::write(&path, r#"{"user_id": "u1", "requirements": "Rust"}"#).unwrap();

    let output = run(&temp_dir, &["upsert", path.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("title: field required"), "stderr was: {stderr}");
    assert!(stderr.contains("requirements: expected array of strings"));
}

#[test]
fn wipe_requires_confirmation() {
    let temp_dir = TempDir::new().unwrap();
    let first = write_payload(temp_dir.path(), "u1", "Engineer");
    let second = write_payload(temp_dir.path(), "u2", "Designer");
    stdout_json(&run(&temp_dir, &["upsert", &first]));
    stdout_json(&run(&temp_dir, &["upsert", &second]));

    assert!(!run(&temp_dir, &["wipe"]).status.success());

    let wiped = stdout_json(&run(&temp_dir, &["wipe", "--yes"]));
    assert_eq!(wiped["deleted"], json!(2));
}

#[test]
fn version_prints_core_version() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(&temp_dir, &["version"]);
    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).trim().is_empty());
}
