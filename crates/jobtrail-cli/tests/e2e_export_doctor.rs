//! E2E tests for the data surface: calendar export, bulk load, raw action
//! dispatch, profile and resume, snapshot repair, and completions.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn snapshot_path(dir: &Path) -> PathBuf {
    dir.join("data").join("jobtrail-state.json")
}

fn jt_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jt"));
    cmd.current_dir(dir);
    cmd.env("JOBTRAIL_DATA_DIR", dir.join("data"));
    cmd.env("JOBTRAIL_CONFIG", dir.join("config.toml"));
    cmd.env("JOBTRAIL_NOW", "2024-01-01T09:00:00Z");
    cmd.env("JOBTRAIL_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn jt_json(dir: &Path, args: &[&str]) -> Value {
    let output = jt_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("jt should not crash");
    assert!(
        output.status.success(),
        "jt {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

fn seed(dir: &Path) {
    jt_json(
        dir,
        &[
            "add", "--id", "1", "--company", "Acme", "--position", "Engineer", "--status",
            "applied", "--date", "2024-01-01",
        ],
    );
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[test]
fn export_single_event_to_stdout() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    let output = jt_cmd(dir.path())
        .args(["export", "1:followup-applied"])
        .output()
        .expect("jt should not crash");
    assert!(output.status.success());
    let ics = String::from_utf8(output.stdout).expect("utf8");

    assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
    assert!(ics.ends_with("END:VCALENDAR\r\n"));
    assert!(ics.contains("DTSTART:20240108T000000Z\r\n"));
    assert!(ics.contains("DTEND:20240108T010000Z\r\n"));
    assert!(ics.contains("DTSTAMP:20240101T090000Z\r\n"));
    assert!(ics.contains("SUMMARY:Follow up with Acme\r\n"));
    assert!(ics.contains("TRIGGER:-PT30M\r\n"));
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
}

#[test]
fn export_of_missing_event_fails_with_code() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    jt_cmd(dir.path())
        .args(["export", "nope"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("BEGIN:VCALENDAR").not())
        .stderr(predicate::str::contains("E2002"));
}

#[test]
fn export_whole_calendar_to_file() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());
    jt_json(
        dir.path(),
        &["event", "add", "--title", "Meetup; drinks, snacks", "--date", "2024-01-10", "--time", "18:30"],
    );

    let target = dir.path().join("jobs.ics");
    let target_str = target.to_string_lossy().to_string();
    let json = jt_json(dir.path(), &["export", "-o", &target_str]);
    assert_eq!(json["events"], 2);
    assert_eq!(json["path"], target_str.as_str());

    let ics = fs::read_to_string(&target).expect("read export");
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
    assert!(ics.contains("SUMMARY:Meetup\\; drinks\\, snacks\r\n"));
    assert!(ics.contains("DTSTART:20240110T183000Z\r\n"));
}

#[test]
fn export_options_come_from_config() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("config.toml"),
        "[export]\nreminder_minutes = 10\ndefault_duration_minutes = 45\n",
    )
    .expect("write config");
    seed(dir.path());

    jt_cmd(dir.path())
        .args(["export", "--opportunity", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TRIGGER:-PT10M"))
        .stdout(predicate::str::contains("DTEND:20240108T004500Z"));
}

#[test]
fn broken_config_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("config.toml"), "[store\n").expect("write config");
    jt_cmd(dir.path())
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"));
}

// ---------------------------------------------------------------------------
// Load and dispatch
// ---------------------------------------------------------------------------

#[test]
fn load_replaces_present_collections_and_prunes() {
    let dir = TempDir::new().expect("tempdir");
    jt_json(dir.path(), &["resume", "--text", "My resume"]);

    let doc = dir.path().join("remote.json");
    fs::write(
        &doc,
        r#"{
            "opportunities": [
                {"id": 10, "company": "Initech", "position": "Dev", "status": "Applied", "appliedDate": "2024-02-01"}
            ],
            "events": [
                {"id": "a", "title": "Call", "date": "2024-02-02", "type": "general", "applicationId": 10},
                {"id": "b", "title": "Orphan", "date": "2024-02-02", "type": "general", "opportunityId": 99}
            ],
            "chatMessages": {"10": [], "99": []}
        }"#,
    )
    .expect("write doc");

    let json = jt_json(dir.path(), &["load", doc.to_str().expect("utf8 path")]);
    assert_eq!(json["opportunities"], 1);
    assert_eq!(json["events"], 1);
    assert_eq!(json["threads"], 1);

    let resume = jt_json(dir.path(), &["resume"]);
    assert_eq!(resume["masterResume"], "My resume");
}

#[test]
fn dispatch_applies_wire_actions() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    let json = jt_json(
        dir.path(),
        &["dispatch", r#"{"type": "UPDATE_OPPORTUNITY", "payload": {"id": 1, "updates": {"status": "Offer Received"}}}"#],
    );
    assert_eq!(json["action"], "UPDATE_OPPORTUNITY");
    assert_eq!(json["changed"], true);

    let show = jt_json(dir.path(), &["show", "1"]);
    assert_eq!(show["opportunity"]["status"], "Offer Received");
    assert_eq!(show["events"][0]["type"], "deadline");
    assert_eq!(show["events"][0]["date"], "2024-01-08");
}

#[test]
fn dispatch_reads_stdin() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    let output = jt_cmd(dir.path())
        .args(["dispatch", "-", "--json"])
        .write_stdin(r#"{"type": "DELETE_OPPORTUNITY", "payload": "1"}"#)
        .output()
        .expect("jt should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["opportunities"], 0);
    assert_eq!(json["events"], 0);
}

#[test]
fn dispatch_strict_and_lenient_unknown_actions() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());

    jt_cmd(dir.path())
        .args(["dispatch", r#"{"type": "ARCHIVE_EVERYTHING"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2004"));

    let json = jt_json(
        dir.path(),
        &["dispatch", "--lenient", r#"{"type": "ARCHIVE_EVERYTHING"}"#],
    );
    assert_eq!(json["action"], "UNKNOWN");
    assert_eq!(json["changed"], false);
    assert_eq!(json["opportunities"], 1);
}

// ---------------------------------------------------------------------------
// Profile and resume
// ---------------------------------------------------------------------------

#[test]
fn profile_merges_fields() {
    let dir = TempDir::new().expect("tempdir");
    jt_json(
        dir.path(),
        &["profile", "--name", "Sam", "--email", "sam@example.com", "--skill", "rust", "--skill", "sql"],
    );
    let json = jt_json(dir.path(), &["profile", "--headline", "Backend engineer"]);
    assert_eq!(json["name"], "Sam");
    assert_eq!(json["headline"], "Backend engineer");
    assert_eq!(json["skills"], serde_json::json!(["rust", "sql"]));

    let json = jt_json(dir.path(), &["profile", "--headline", ""]);
    assert!(json.get("headline").is_none());
}

#[test]
fn resume_reads_file() {
    let dir = TempDir::new().expect("tempdir");
    let file = dir.path().join("resume.md");
    fs::write(&file, "# Sam\nRust, SQL\n").expect("write resume");

    jt_json(dir.path(), &["resume", "--file", file.to_str().expect("utf8 path")]);
    jt_cmd(dir.path())
        .args(["resume"])
        .assert()
        .success()
        .stdout("# Sam\nRust, SQL\n");
}

// ---------------------------------------------------------------------------
// Snapshot health
// ---------------------------------------------------------------------------

#[test]
fn doctor_reports_and_repairs_orphans() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir_all(dir.path().join("data")).expect("mkdir");
    fs::write(
        snapshot_path(dir.path()),
        r#"{
            "opportunities": [{"id": 1, "company": "Acme", "position": "Engineer"}],
            "events": [
                {"id": "e1", "title": "Call", "date": "2024-01-02", "type": "general", "opportunityId": 1},
                {"id": "e2", "title": "Lost", "date": "2024-01-02", "type": "general", "opportunityId": 5}
            ],
            "chatMessages": {"5": []}
        }"#,
    )
    .expect("write snapshot");

    let output = jt_cmd(dir.path())
        .args(["doctor", "--json"])
        .output()
        .expect("jt should not crash");
    assert!(!output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["ok"], false);
    assert_eq!(report["fixed"], false);
    assert_eq!(report["issues"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["issues"][0]["kind"], "dangling_event");

    let fixed = jt_json(dir.path(), &["doctor", "--fix"]);
    assert_eq!(fixed["fixed"], true);

    let again = jt_json(dir.path(), &["doctor"]);
    assert_eq!(again["ok"], true);
    let events = jt_json(dir.path(), &["event", "list"]);
    assert_eq!(events["total"], 1);
}

#[test]
fn corrupt_snapshot_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir_all(dir.path().join("data")).expect("mkdir");
    fs::write(snapshot_path(dir.path()), "{ not json").expect("write snapshot");

    jt_cmd(dir.path())
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E3001"));
}

#[test]
fn state_persists_between_runs() {
    let dir = TempDir::new().expect("tempdir");
    seed(dir.path());
    assert!(snapshot_path(dir.path()).exists());

    let raw = fs::read_to_string(snapshot_path(dir.path())).expect("read snapshot");
    let doc: Value = serde_json::from_str(&raw).expect("snapshot is JSON");
    assert_eq!(doc["opportunities"][0]["company"], "Acme");
    assert_eq!(doc["events"][0]["id"], "1:followup-applied");
}

#[test]
fn completions_do_not_touch_state() {
    let dir = TempDir::new().expect("tempdir");
    jt_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jt"));
    assert!(!dir.path().join("data").exists());
}
