// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stall classification produced once per cycle for each stalled project.

use serde::{Deserialize, Serialize};

/// Why a project stopped making progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StallType {
    /// Agent process is gone (or was never recorded)
    OrchestratorCrashed,
    /// Agent is blocked on a human answer. Never emitted by the classifier,
    /// kept so recovery policy for it exists when a detector does.
    AgentWaitingForInput,
    /// Agent recorded a failure it could not resolve
    ExecutionError,
    /// Agent is alive but silent
    SessionHung,
    /// A stall type this build does not know about
    #[serde(other)]
    Unknown,
}

crate::simple_display! {
    StallType {
        OrchestratorCrashed => "orchestrator_crashed",
        AgentWaitingForInput => "agent_waiting_for_input",
        ExecutionError => "execution_error",
        SessionHung => "session_hung",
        Unknown => "unknown",
    }
}

/// How sure a classifier or diagnosis is of its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

crate::simple_display! {
    Confidence {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// A stalled project and the classifier's verdict on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StallClassification {
    pub project: String,
    pub phase: Option<u32>,
    pub stall_type: StallType,
    pub confidence: Confidence,
    pub details: String,
    /// `i64::MAX` when the project never reported a heartbeat
    pub heartbeat_age_ms: i64,
}

impl StallClassification {
    /// Whether two stalls look like the same failure seen from two projects.
    pub fn same_pattern(&self, other: &StallClassification) -> bool {
        self.stall_type == other.stall_type && self.phase == other.phase
    }
}

#[cfg(test)]
#[path = "stall_tests.rs"]
mod tests;
