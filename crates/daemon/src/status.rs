// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warden status`: the registry with each project's current health.

use chrono::{DateTime, Utc};
use std::time::Duration;
use wd_core::{format_elapsed_ms, Liveness, ProjectStatus, Registry};
use wd_engine::classify;
use wd_storage::SnapshotReader;

#[derive(Debug, Clone, PartialEq)]
pub struct HealthRow {
    pub name: String,
    pub status: ProjectStatus,
    pub phase: Option<u32>,
    pub pid: Option<u32>,
    pub heartbeat_age_ms: Option<i64>,
    /// `healthy`, a stall type, or `-` for projects not running
    pub health: String,
}

/// Classify every project without acting on it.
pub fn project_health(
    registry: &Registry,
    liveness: &dyn Liveness,
    snapshots: &SnapshotReader,
    now: DateTime<Utc>,
    stale_threshold: Duration,
) -> Vec<HealthRow> {
    registry
        .projects
        .values()
        .map(|record| {
            let health = if record.is_running() {
                let pid_alive = record.agent_pid.is_some_and(|pid| liveness.is_alive(pid));
                let snapshot = if pid_alive { snapshots.read(&record.path) } else { None };
                match classify(record, pid_alive, snapshot.as_ref(), now, stale_threshold) {
                    Some(stall) => stall.stall_type.to_string(),
                    None => "healthy".to_string(),
                }
            } else {
                "-".to_string()
            };
            HealthRow {
                name: record.name.clone(),
                status: record.status,
                phase: record.current_phase,
                pid: record.agent_pid,
                heartbeat_age_ms: record.heartbeat_age_ms(now),
                health,
            }
        })
        .collect()
}

/// Render rows as an aligned table.
pub fn render(rows: &[HealthRow]) -> String {
    if rows.is_empty() {
        return "No projects registered\n".to_string();
    }
    let header = ["PROJECT", "STATUS", "PHASE", "PID", "HEARTBEAT", "HEALTH"].map(String::from);
    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|r| {
            [
                r.name.clone(),
                r.status.to_string(),
                r.phase.map_or_else(|| "-".to_string(), |p| p.to_string()),
                r.pid.map_or_else(|| "-".to_string(), |p| p.to_string()),
                match r.heartbeat_age_ms {
                    Some(ms) if ms >= 0 => format!("{} ago", format_elapsed_ms(ms)),
                    Some(_) => "in future".to_string(),
                    None => "never".to_string(),
                },
                r.health.clone(),
            ]
        })
        .collect();

    let mut widths = header.clone().map(|h| h.len());
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(&cells) {
        let line: Vec<String> =
            row.iter().zip(widths).map(|(cell, w)| format!("{:<w$}", cell, w = w)).collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
