// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stall classification.
//!
//! Pure: every input (PID liveness, the agent snapshot, the current time) is
//! gathered by the caller, so the same inputs always give the same verdict.

use chrono::{DateTime, Utc};
use std::time::Duration;
use wd_core::{
    format_elapsed_ms, AgentSnapshot, Confidence, ProjectRecord, StallClassification, StallType,
};

/// Classify one project, or `None` when its heartbeat is fresh.
///
/// `pid_alive` is ignored when the record has no PID.
pub fn classify(
    record: &ProjectRecord,
    pid_alive: bool,
    snapshot: Option<&AgentSnapshot>,
    now: DateTime<Utc>,
    stale_threshold: Duration,
) -> Option<StallClassification> {
    let threshold_ms = i64::try_from(stale_threshold.as_millis()).unwrap_or(i64::MAX);
    let age_ms = record.heartbeat_age_ms(now).unwrap_or(i64::MAX);

    // Negative age: heartbeat from the future (clock skew between writers)
    if age_ms < 0 || age_ms < threshold_ms {
        return None;
    }

    let age = format_elapsed_ms(age_ms);
    let last_seen = if age_ms == i64::MAX {
        "never sent a heartbeat".to_string()
    } else {
        format!("last heartbeat {} ago", age)
    };
    let stall = |stall_type, confidence, details: String| StallClassification {
        project: record.name.clone(),
        phase: record.current_phase,
        stall_type,
        confidence,
        details,
        heartbeat_age_ms: age_ms,
    };

    let Some(pid) = record.agent_pid.filter(|_| pid_alive) else {
        let details = match record.agent_pid {
            Some(pid) => format!("agent process {} is not running; {}", pid, last_seen),
            None => format!("no agent process recorded; {}", last_seen),
        };
        return Some(stall(StallType::OrchestratorCrashed, Confidence::High, details));
    };

    if let Some(failure) = snapshot.and_then(AgentSnapshot::latest_unresolved) {
        return Some(stall(
            StallType::ExecutionError,
            Confidence::High,
            format!("unresolved failure: {}", failure.error),
        ));
    }

    let snapshot_age_ms = snapshot
        .and_then(|s| s.last_updated)
        .map(|updated| (now - updated).num_milliseconds());
    match snapshot_age_ms {
        Some(ms) if ms >= threshold_ms => Some(stall(
            StallType::SessionHung,
            Confidence::Medium,
            format!(
                "agent {} alive but silent: heartbeat {} ago, state last written {} ago",
                pid,
                age,
                format_elapsed_ms(ms)
            ),
        )),
        _ => Some(stall(
            StallType::SessionHung,
            Confidence::Low,
            format!("agent {} alive but heartbeat is {} old", pid, age),
        )),
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
