//! Integration tests for the `sofa` binary: create a dataset, then inspect
//! and query it.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[allow(deprecated)]
fn sofa_cmd() -> Command {
    Command::cargo_bin("sofa").expect("Failed to find `sofa` binary")
}

fn create_hrir(path: &Path) {
    sofa_cmd()
        .args([
            "create",
            path.to_str().unwrap(),
            "--convention",
            "SimpleFreeFieldHRIR",
            "--measurements",
            "4",
            "--samples",
            "128",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Convention:   SimpleFreeFieldHRIR"))
        .stdout(predicate::str::contains("Receivers:    2"));
}

#[test]
fn test_create_then_info() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("hrir.sofa");
    create_hrir(&path);
    assert!(path.exists());

    sofa_cmd()
        .args(["info", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("SimpleFreeFieldHRIR 1.0"))
        .stdout(predicate::str::contains("Data.IR"))
        .stdout(predicate::str::contains("ReceiverPosition"));
}

#[test]
fn test_info_json() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("hrir.sofa");
    create_hrir(&path);

    let output = sofa_cmd()
        .args(["info", path.to_str().unwrap(), "--json"])
        .output()
        .expect("Failed to run sofa info");
    assert!(output.status.success());
    let info: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("info --json is not valid JSON");
    assert_eq!(info["convention"], "SimpleFreeFieldHRIR");
    assert_eq!(info["data_type"], "FIR");
    assert_eq!(info["dimensions"]["M"], 4);
    assert_eq!(info["dimensions"]["N"], 128);
    assert_eq!(info["metadata"]["SOFAConventions"], "SimpleFreeFieldHRIR");
}

#[test]
fn test_pose_of_receivers_relative_to_listener() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("hrir.sofa");
    create_hrir(&path);

    let output = sofa_cmd()
        .args([
            "pose",
            path.to_str().unwrap(),
            "--object",
            "receiver",
            "--relative-to",
            "listener",
            "--json",
        ])
        .output()
        .expect("Failed to run sofa pose");
    assert!(output.status.success());
    let pose: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("pose --json is not valid JSON");
    assert_eq!(pose["frame"], "Listener");
    let values = pose["position"]["values"].as_array().unwrap();
    assert_eq!(values.len(), 6);
    assert!((values[1].as_f64().unwrap() - 0.09).abs() < 1e-12);
    assert!((values[4].as_f64().unwrap() + 0.09).abs() < 1e-12);
    assert!(pose.get("view").is_none());
}

#[test]
fn test_global_pose_includes_defaults() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("hrir.sofa");
    create_hrir(&path);

    sofa_cmd()
        .args(["pose", path.to_str().unwrap(), "--object", "source"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Source pose (global frame)"))
        .stdout(predicate::str::contains("Position"))
        .stdout(predicate::str::contains("Up"));
}

#[test]
fn test_pose_rejects_unknown_object() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("hrir.sofa");
    create_hrir(&path);

    sofa_cmd()
        .args(["pose", path.to_str().unwrap(), "--object", "microphone"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("microphone"));
}

#[test]
fn test_create_rejects_unknown_convention() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("x.sofa");

    sofa_cmd()
        .args([
            "create",
            path.to_str().unwrap(),
            "--convention",
            "NoSuchConvention",
            "--measurements",
            "1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NoSuchConvention"));
    assert!(!path.exists());
}

#[test]
fn test_create_rejects_convention_violation() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let path = tmp.path().join("x.sofa");

    sofa_cmd()
        .args([
            "create",
            path.to_str().unwrap(),
            "--convention",
            "SimpleFreeFieldSOS",
            "--measurements",
            "1",
            "--receivers",
            "3",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Receiver count == 2"));
}

#[test]
fn test_info_rejects_nonexistent_file() {
    sofa_cmd()
        .args(["info", "/tmp/nonexistent_file_abcdef.sofa"])
        .assert()
        .failure();
}

#[test]
fn test_conventions_lists_builtin() {
    sofa_cmd()
        .arg("conventions")
        .assert()
        .success()
        .stdout(predicate::str::contains("GeneralFIR"))
        .stdout(predicate::str::contains("SimpleHeadphoneIR"))
        .stdout(predicate::str::contains("Listener count == 1"));
}
