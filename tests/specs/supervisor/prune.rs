// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warden prune` specs

use chrono::Utc;

use crate::prelude::*;

/// A PID that cannot belong to a live process.
fn dead_pid() -> u32 {
    let mut child = std::process::Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}

#[test]
fn prune_demotes_dead_agents_only() {
    let fleet = Fleet::new();
    let alive = fleet.project_dir("alive");
    let dead = fleet.project_dir("dead");
    fleet.write_registry(&[
        running_project("alive", &alive, Utc::now(), Some(std::process::id())),
        running_project("dead", &dead, Utc::now(), Some(dead_pid())),
    ]);

    fleet.warden().args(&["prune"]).passes().stdout_has("Pruned 1: dead");

    let registry = fleet.registry();
    assert_eq!(registry["projects"]["dead"]["status"], "idle");
    assert!(registry["projects"]["dead"]["agentPid"].is_null());
    assert_eq!(registry["projects"]["alive"]["status"], "running");
}

#[test]
fn prune_with_nothing_dead_leaves_file_alone() {
    let fleet = Fleet::new();
    let alive = fleet.project_dir("alive");
    fleet.write_registry(&[running_project("alive", &alive, Utc::now(), Some(std::process::id()))]);

    fleet.warden().args(&["prune"]).passes().stdout_has("No dead agents");
    assert_eq!(fleet.registry()["lastUpdated"], "");
}
