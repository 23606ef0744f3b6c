// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit entries: one per recovery action, appended to the improvement log.

use crate::diagnosis::BugLocation;
use crate::recovery::RecoveryKind;
use crate::stall::StallType;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub project: String,
    pub phase: Option<u32>,
    pub stall_type: StallType,
    pub action: RecoveryKind,
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bug_location: Option<BugLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub propagated_to: Vec<String>,
}

impl AuditEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        project: impl Into<String>,
        phase: Option<u32>,
        stall_type: StallType,
        action: RecoveryKind,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            project: project.into(),
            phase,
            stall_type,
            action,
            outcome: outcome.into(),
            bug_location: None,
            root_cause: None,
            file_path: None,
            propagated_to: Vec::new(),
        }
    }
}

/// Single human-readable line, e.g.
/// `2026-03-01T12:00:00Z [alpha] phase=3 stall=session_hung action=restart outcome="restarted (pid 812)"`
impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] phase={} stall={} action={} outcome={:?}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.project,
            self.phase.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            self.stall_type,
            self.action,
            self.outcome,
        )?;
        if let Some(location) = self.bug_location {
            write!(f, " bug={}", location)?;
        }
        if let Some(ref file) = self.file_path {
            write!(f, " file={}", file)?;
        }
        if let Some(ref cause) = self.root_cause {
            write!(f, " root_cause={:?}", cause)?;
        }
        if !self.propagated_to.is_empty() {
            write!(f, " propagated_to={}", self.propagated_to.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
