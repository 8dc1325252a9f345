//! End-to-end tests driving the `xing` binary against a temporary data file.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn xing_binary() -> String {
    env!("CARGO_BIN_EXE_xing").to_string()
}

/// Writes a config pointing the data file into `temp` and returns its path.
fn write_config(temp: &Path) -> PathBuf {
    let config_path = temp.join("config.toml");
    let data_path = temp.join("data").join("barrier_data.json");
    std::fs::write(
        &config_path,
        format!(
            "data_path = {:?}\norigin = \"test-device\"\n",
            data_path.display().to_string()
        ),
    )
    .unwrap();
    config_path
}

fn xing(temp: &Path, args: &[&str]) -> Output {
    let config = write_config(temp);
    Command::new(xing_binary())
        .env("HOME", temp)
        .env("XDG_CONFIG_HOME", temp.join(".config"))
        .env("XDG_DATA_HOME", temp.join(".local/share"))
        .env_remove("XING_REMOTE_URL")
        .env_remove("XING_DATA_PATH")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .expect("failed to run xing")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "xing should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn test_record_then_inspect() {
    let temp = TempDir::new().unwrap();

    let recorded = stdout_of(&xing(temp.path(), &["record", "closed"]));
    assert!(recorded.starts_with("Recorded CLOSED at "));
    assert!(recorded.contains("Offline mode"));
    stdout_of(&xing(temp.path(), &["record", "open"]));

    let events = stdout_of(&xing(temp.path(), &["events"]));
    let lines: Vec<serde_json::Value> = events
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["status"], "closed");
    assert_eq!(lines[1]["status"], "open");
    assert_eq!(lines[1]["user"], "test-device");

    let status = stdout_of(&xing(temp.path(), &["status"]));
    assert!(status.starts_with("Barrier: OPEN\n"), "{status}");
    assert!(status.contains("by test-device, just now"));

    let document =
        std::fs::read_to_string(temp.path().join("data").join("barrier_data.json")).unwrap();
    let document: serde_json::Value = serde_json::from_str(&document).unwrap();
    assert_eq!(document["current_status"], "open");
    assert_eq!(document["events"].as_array().unwrap().len(), 2);
}

#[test]
fn test_predict_without_history_reports_insufficient_data() {
    let temp = TempDir::new().unwrap();

    let output = stdout_of(&xing(temp.path(), &["predict", "--in", "15", "--json"]));
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["outcome"], "insufficient_data");
    assert_eq!(value["samples"], 0);
    assert_eq!(value["lookahead_minutes"], 15);
}

#[test]
fn test_stats_counts_recorded_reports() {
    let temp = TempDir::new().unwrap();
    stdout_of(&xing(temp.path(), &["record", "closed"]));

    let output = stdout_of(&xing(temp.path(), &["stats", "--json"]));
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["total_closed"], 1);
    assert_eq!(value["total_open"], 0);
    assert_eq!(value["recent_events"], 1);
}

#[test]
fn test_corrupt_document_is_quarantined() {
    let temp = TempDir::new().unwrap();
    let data_dir = temp.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("barrier_data.json"), "{not json").unwrap();

    let status = stdout_of(&xing(temp.path(), &["status"]));
    assert!(status.contains("No reports yet."));

    stdout_of(&xing(temp.path(), &["record", "open"]));
    assert!(data_dir.join("barrier_data.json.corrupt").exists());
    let events = stdout_of(&xing(temp.path(), &["events"]));
    assert_eq!(events.lines().count(), 1);
}

#[test]
fn test_offline_sync_succeeds() {
    let temp = TempDir::new().unwrap();

    let output = stdout_of(&xing(temp.path(), &["sync"]));
    assert!(output.starts_with("Offline mode"));
}

#[test]
fn test_help_lists_commands() {
    let output = Command::new(xing_binary())
        .arg("--help")
        .output()
        .unwrap();
    let help = stdout_of(&output);

    for command in ["record", "status", "sync", "predict", "stats", "events"] {
        assert!(help.contains(command), "help should list {command}");
    }
}
