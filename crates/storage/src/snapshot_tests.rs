// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn reads_snapshot_relative_to_project() {
    let dir = tempdir().unwrap();
    let state = dir.path().join(".orchestrator/state.json");
    std::fs::create_dir_all(state.parent().unwrap()).unwrap();
    std::fs::write(
        &state,
        r#"{
            "lastUpdated": "2026-03-01T11:50:00Z",
            "currentStep": "execute",
            "failures": [
                {"phase": 2, "error": "tsc failed", "resolved": true},
                {"phase": 3, "error": "test timeout", "resolved": false}
            ]
        }"#,
    )
    .unwrap();

    let reader = SnapshotReader::new(".orchestrator/state.json");
    let snapshot = reader.read(dir.path()).unwrap();

    assert!(snapshot.last_updated.is_some());
    assert_eq!(snapshot.unresolved().count(), 1);
    assert_eq!(snapshot.latest_unresolved().unwrap().error, "test timeout");
}

#[test]
fn missing_snapshot_is_none() {
    let dir = tempdir().unwrap();
    assert!(SnapshotReader::new("state.json").read(dir.path()).is_none());
}

#[test]
fn garbage_snapshot_is_none() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("state.json"), "{{").unwrap();
    assert!(SnapshotReader::new("state.json").read(dir.path()).is_none());
}
