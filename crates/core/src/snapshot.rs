// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-project state snapshot written by each agent.
//!
//! The supervisor only reads this file; the agent owns its format. Unknown
//! fields are ignored and every known field is optional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A failure the agent recorded while running a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEntry {
    #[serde(default)]
    pub phase: Option<u32>,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub resolved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSnapshot {
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failures: Vec<FailureEntry>,
}

impl AgentSnapshot {
    pub fn unresolved(&self) -> impl Iterator<Item = &FailureEntry> {
        self.failures.iter().filter(|f| !f.resolved)
    }

    /// Most recent unresolved failure, if any.
    pub fn latest_unresolved(&self) -> Option<&FailureEntry> {
        self.unresolved().last()
    }
}
