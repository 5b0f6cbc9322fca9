// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::NamedTempFile;

fn reslice() -> Command {
    Command::cargo_bin("reslice").unwrap()
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn rows(value: &Value) -> Vec<Vec<f64>> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|row| {
            row.as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_f64().unwrap())
                .collect()
        })
        .collect()
}

fn script(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn compose_axial_from_translation() {
    let json = stdout_json(reslice().args([
        "--format",
        "json",
        "compose",
        "--translate",
        "1,2,3",
        "--mode",
        "axial",
    ]));
    assert_eq!(json["driver"], "rigid-frame");
    assert_eq!(json["corrected"], false);
    assert_eq!(
        rows(&json["slice_to_world"]),
        vec![
            vec![-1.0, 0.0, 0.0, 1.0],
            vec![0.0, 1.0, 0.0, 2.0],
            vec![0.0, 0.0, -1.0, 3.0],
            vec![0.0, 0.0, 0.0, 1.0],
        ]
    );
}

#[test]
fn compose_line_translation_is_second_point() {
    let json = stdout_json(reslice().args([
        "compose",
        "--format",
        "json",
        "--line",
        "0,0,0:1,0,0",
        "--mode",
        "transverse",
    ]));
    let m = rows(&json["slice_to_world"]);
    assert_eq!([m[0][3], m[1][3], m[2][3]], [1.0, 0.0, 0.0]);
}

#[test]
fn compose_none_leaves_slice_unchanged() {
    let json = stdout_json(reslice().args([
        "--format", "json", "compose", "--point", "1,1,1", "--mode", "none",
    ]));
    assert!(json["slice_to_world"].is_null());

    reslice()
        .args(["compose", "--point", "1,1,1", "--mode", "none"])
        .assert()
        .success()
        .stdout(predicate::str::contains("slice left unchanged"));
}

#[test]
fn compose_reports_corrected_skew() {
    let json = stdout_json(reslice().args([
        "--format",
        "json",
        "compose",
        "--frame",
        "1,0.2,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1",
        "--mode",
        "transverse",
    ]));
    assert_eq!(json["corrected"], true);
}

#[test]
fn compose_reads_image_snapshots() {
    let file = script(
        r#"{ "VolumetricImage": {
            "ijk_to_world": [[1,0,0,0],[0,1,0,0],[0,0,1,0],[0,0,0,1]],
            "dimensions": [10, 10, 1],
            "parent_to_world": null
        } }"#,
    );
    let json = stdout_json(
        reslice()
            .args(["--format", "json", "compose", "--mode", "transverse", "--driver-file"])
            .arg(file.path()),
    );
    let m = rows(&json["slice_to_world"]);
    assert_eq!([m[0][3], m[1][3], m[2][3]], [5.0, 5.0, 0.0]);
}

#[test]
fn compose_table_output() {
    reslice()
        .args(["compose", "--translate", "0,0,0", "--mode", "coronal", "--flip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("coronal"))
        .stdout(predicate::str::contains("slice to world"));
}

#[test]
fn compose_requires_exactly_one_driver() {
    reslice()
        .args(["compose", "--translate", "1,2,3", "--point", "1,2,3"])
        .assert()
        .failure();
    reslice().args(["compose"]).assert().failure();
}

#[test]
fn compose_rejects_unknown_mode() {
    reslice()
        .args(["compose", "--point", "0,0,0", "--mode", "oblique"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown slice mode"));
}

const SCENE: &str = r#"{
    "slices": ["Red", "Green"],
    "nodes": {
        "Frame": { "RigidFrame": { "to_world": [[1,0,0,0],[0,1,0,0],[0,0,1,0],[0,0,0,1]] } }
    },
    "attributes": {
        "Green": { "VolumeResliceDriver.Driver": "Frame", "VolumeResliceDriver.Mode": "6" }
    },
    "steps": [
        { "set_mode": { "slice": "Red", "mode": "axial" } },
        { "set_driver": { "slice": "Red", "driver": "Frame" } },
        { "update_node": { "node": "Frame", "driver": { "RigidFrame": {
            "to_world": [[1,0,0,10],[0,1,0,20],[0,0,1,30],[0,0,0,1]] } } } },
        { "event": { "node": "Frame", "event": "TransformModified" } }
    ]
}"#;

#[test]
fn replay_drives_restored_and_new_bindings() {
    let file = script(SCENE);
    let json = stdout_json(reslice().args(["--format", "json", "replay"]).arg(file.path()));

    assert_eq!(json["observed"], serde_json::json!(["Frame"]));
    let event = &json["steps"][3]["outcomes"];
    assert_eq!(event.as_array().unwrap().len(), 2);

    let slices = json["slices"].as_array().unwrap();
    let green = slices.iter().find(|s| s["slice"] == "Green").unwrap();
    assert_eq!(green["driver"], "Frame");
    assert_eq!(green["config"]["mode"], "transverse");
    let m = rows(&green["slice_to_world"]);
    assert_eq!([m[0][3], m[1][3], m[2][3]], [10.0, 20.0, 30.0]);
}

#[test]
fn replay_table_output_includes_summary() {
    let file = script(SCENE);
    reslice()
        .arg("replay")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Number of observed nodes: 1"))
        .stdout(predicate::str::contains("committed"));
}

#[test]
fn replay_reports_failing_step() {
    let file = script(r#"{ "steps": [ { "set_mode": { "slice": "Nope", "mode": "axial" } } ] }"#);
    reslice()
        .arg("replay")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 0"));
}

#[test]
fn replay_rejects_missing_script() {
    reslice()
        .args(["replay", "/definitely/not/here.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}
