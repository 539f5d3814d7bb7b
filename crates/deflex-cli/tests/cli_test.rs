//! Integration tests for the deflex binary
//!
//! These tests run the binary against temporary data directories and check
//! the JSON envelope and the error paths.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn deflex_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove 'deps' directory
    path.push("deflex");
    path
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(deflex_bin())
        .current_dir(dir)
        .env_remove("DEFLEX_MAP")
        .env_remove("DEFLEX_DATA_DIR")
        .env_remove("DEFLEX_DECOMMISSION_PRORATION")
        .arg("--data-dir")
        .arg(dir)
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn json_data(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(parsed.get("status").and_then(|v| v.as_str()), Some("success"));
    parsed.get("data").cloned().expect("Should have data field")
}

const POWER_LINES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "properties": {"name": "DE01-DE02"},
         "geometry": {"type": "LineString", "coordinates": [[10, 52], [10, 55]]}}
    ]
}"#;

#[test]
fn test_config_shows_cli_override() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["--map", "de17", "--json", "config"]);
    assert!(output.status.success(), "Command should succeed");

    let data = json_data(&output);
    let entries = data.as_array().expect("Config should be a list of entries");
    let map = entries
        .iter()
        .find(|e| e.get("key").and_then(|k| k.as_str()) == Some("map"))
        .expect("Should list the map");
    assert_eq!(map.get("value").and_then(|v| v.as_str()), Some("de17"));
    assert_eq!(map.get("source").and_then(|v| v.as_str()), Some("cli"));
}

#[test]
fn test_transmission_without_power_lines() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["--map", "de02", "--json", "transmission"]);
    assert!(output.status.success(), "Command should succeed");

    let data = json_data(&output);
    assert_eq!(data.get("renpass").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(data.get("lines").and_then(|v| v.as_array()).map(|l| l.len()), Some(0));
}

#[test]
fn test_transmission_writes_duplicated_lines() {
    let dir = TempDir::new().unwrap();
    let geometries = dir.path().join("geometries");
    std::fs::create_dir_all(&geometries).unwrap();
    std::fs::write(geometries.join("de02_power_lines.geojson"), POWER_LINES).unwrap();
    let out = dir.path().join("lines.csv");

    let output = run(
        dir.path(),
        &["--map", "de02", "--json", "transmission", "--duplicate", "--out", out.to_str().unwrap()],
    );
    assert!(output.status.success(), "Command should succeed");

    let data = json_data(&output);
    let lines = data.get("lines").and_then(|v| v.as_array()).unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.get("capacity").map_or(false, |c| c.is_null())));

    let csv = std::fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("line,capacity,distance,efficiency\n"));
    assert!(csv.contains("DE01-DE02,inf,,1"));
    assert!(csv.contains("DE02-DE01,inf,,1"));
}

#[test]
fn test_transmission_renpass_map_requires_grid_file() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["--map", "de21", "--json", "transmission"]);
    assert!(!output.status.success(), "Command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("File not found"), "unexpected error: {}", stderr);
}

#[test]
fn test_mastr_solar_not_added() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["mastr", "2014", "--category", "Solar"]);
    assert!(!output.status.success(), "Command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Solar MaStR data not added, yet"), "unexpected error: {}", stderr);
}
