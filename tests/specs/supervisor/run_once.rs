// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warden run-once` specs

use chrono::{Duration, Utc};

use crate::prelude::*;

#[test]
fn empty_state_dir_runs_a_quiet_cycle() {
    let fleet = Fleet::new();
    fleet.warden().args(&["run-once"]).passes().stdout_has("checked 0 project(s), 0 stalled");
    assert!(!fleet.pid_path().exists(), "lock must be released after the cycle");
}

#[test]
fn garbage_registry_is_treated_as_empty() {
    let fleet = Fleet::new();
    std::fs::write(fleet.state_dir().join("registry.json"), "{ definitely not json").unwrap();
    fleet.warden().args(&["run-once"]).passes().stdout_has("checked 0 project(s)");
}

#[test]
fn crashed_agent_is_restarted_and_audited() {
    let fleet = Fleet::new();
    let path = fleet.project_dir("alpha");
    let stale = Utc::now() - Duration::minutes(30);
    fleet.write_registry(&[running_project("alpha", &path, stale, None)]);

    fleet.warden().args(&["run-once"]).passes().stdout_has("alpha: restart (restarted (pid");

    let registry = fleet.registry();
    let record = &registry["projects"]["alpha"];
    assert_eq!(record["status"], "running");
    assert!(record["agentPid"].as_u64().is_some(), "new PID recorded: {}", record);
    assert_ne!(registry["lastUpdated"], "");

    let audit = fleet.audit();
    assert!(audit.contains("[alpha] phase=2 stall=orchestrator_crashed action=restart"), "{}", audit);
}

#[test]
fn healthy_project_is_left_alone() {
    let fleet = Fleet::new();
    let path = fleet.project_dir("alpha");
    fleet.write_registry(&[running_project("alpha", &path, Utc::now(), Some(std::process::id()))]);

    fleet.warden().args(&["run-once"]).passes().stdout_has("checked 1 project(s), 0 stalled");
    assert_eq!(fleet.registry()["lastUpdated"], "", "registry untouched without stalls");
    assert!(fleet.audit().is_empty());
}

#[test]
fn live_foreign_pid_file_refuses_to_run() {
    let fleet = Fleet::new();
    // This test process is alive and is not the warden child
    let holder = std::process::id().to_string();
    std::fs::write(fleet.pid_path(), &holder).unwrap();

    fleet.warden().args(&["run-once"]).fails().stderr_has("already running");
    assert_eq!(std::fs::read_to_string(fleet.pid_path()).unwrap(), holder);
}

#[test]
fn invalid_config_fails_before_touching_state() {
    let fleet = Fleet::new();
    fleet.config("poll_interval = \"soon\"\n");
    fleet.warden().args(&["run-once"]).fails().stderr_has("poll_interval");
    assert!(!fleet.pid_path().exists());
}
