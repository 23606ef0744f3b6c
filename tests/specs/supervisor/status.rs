// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warden status` specs

use chrono::{Duration, Utc};

use crate::prelude::*;

#[test]
fn status_without_registry_says_nothing_registered() {
    let fleet = Fleet::new();
    fleet.warden().args(&["status"]).passes().stdout_has("No projects registered");
}

#[test]
fn status_shows_health_per_project() {
    let fleet = Fleet::new();
    let alpha = fleet.project_dir("alpha");
    let beta = fleet.project_dir("beta");
    fleet.write_registry(&[
        running_project("alpha", &alpha, Utc::now(), Some(std::process::id())),
        running_project("beta", &beta, Utc::now() - Duration::hours(2), None),
    ]);

    let out = fleet.warden().args(&["status"]).passes();
    let lines: Vec<&str> = out.stdout().lines().collect();
    assert!(lines[0].starts_with("PROJECT"));
    assert!(lines[1].starts_with("alpha") && lines[1].ends_with("healthy"), "{}", lines[1]);
    assert!(lines[2].starts_with("beta") && lines[2].ends_with("orchestrator_crashed"), "{}", lines[2]);
    assert!(lines[2].contains("2h ago"));
}

#[test]
fn status_does_not_modify_registry() {
    let fleet = Fleet::new();
    let beta = fleet.project_dir("beta");
    fleet.write_registry(&[running_project("beta", &beta, Utc::now() - Duration::hours(2), None)]);
    let before = fleet.registry();

    fleet.warden().args(&["status"]).passes();
    assert_eq!(fleet.registry(), before);
    assert!(fleet.audit().is_empty());
}
