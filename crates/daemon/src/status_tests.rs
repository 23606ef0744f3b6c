// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Duration as ChronoDuration;
use wd_core::{Clock, FakeClock, FakeLiveness, ProjectRecord};

const THRESHOLD: Duration = Duration::from_secs(15 * 60);

fn rows(registry: &Registry, liveness: &FakeLiveness) -> Vec<HealthRow> {
    let snapshots = SnapshotReader::new(".orchestrator/state.json");
    project_health(registry, liveness, &snapshots, FakeClock::new().now(), THRESHOLD)
}

#[test]
fn health_reflects_classification() {
    let now = FakeClock::new().now();
    let liveness = FakeLiveness::with_alive([10]);
    let mut registry = Registry::default();
    registry.insert(ProjectRecord::builder().name("fresh").heartbeat(now).pid(10).build());
    registry.insert(
        ProjectRecord::builder()
            .name("crashed")
            .heartbeat(now - ChronoDuration::minutes(30))
            .pid(11)
            .build(),
    );
    registry.insert(ProjectRecord::builder().name("idle").status(ProjectStatus::Idle).build());

    let rows = rows(&registry, &liveness);
    let health: Vec<(&str, &str)> = rows.iter().map(|r| (r.name.as_str(), r.health.as_str())).collect();
    assert_eq!(
        health,
        vec![("crashed", "orchestrator_crashed"), ("fresh", "healthy"), ("idle", "-")]
    );
    assert_eq!(rows[0].heartbeat_age_ms, Some(30 * 60 * 1000));
}

#[test]
fn render_aligns_columns() {
    let now = FakeClock::new().now();
    let mut registry = Registry::default();
    registry.insert(
        ProjectRecord::builder()
            .name("alpha-project")
            .heartbeat(now - ChronoDuration::minutes(20))
            .phase(4)
            .build(),
    );
    registry.insert(ProjectRecord::builder().name("b").status(ProjectStatus::Complete).build());

    let out = render(&rows(&registry, &FakeLiveness::new()));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("PROJECT        STATUS"));
    assert!(lines[1].starts_with("alpha-project  running"));
    assert!(lines[1].contains("20m ago"));
    assert!(lines[1].ends_with("orchestrator_crashed"));
    assert!(lines[2].starts_with("b              complete"));
    assert!(lines[2].contains("never"));
}

#[test]
fn empty_registry_says_so() {
    assert_eq!(render(&[]), "No projects registered\n");
}
