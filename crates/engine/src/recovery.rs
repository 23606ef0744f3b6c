// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery decisions and the restart budget that bounds them.

use std::collections::HashMap;
use wd_core::{RecoveryAction, RecoveryKind, StallClassification, StallType};

/// Restarts allowed for a hung session before a human is paged.
pub const SESSION_HUNG_MAX_RESTARTS: u32 = 2;

/// Directive handed to an agent restarted after blocking on input.
pub const RESTART_PREAMBLE: &str = "You were restarted by the supervisor because you stopped \
to wait for human input. Do not ask questions or wait for confirmation. Make the most \
reasonable decision, record it in your notes, and continue the current phase.";

/// Choose the recovery action for a stall.
pub fn decide(
    classification: &StallClassification,
    retry_count: u32,
    max_restarts: u32,
) -> RecoveryAction {
    let kind = match classification.stall_type {
        StallType::OrchestratorCrashed => RecoveryKind::Restart,
        StallType::SessionHung if retry_count < SESSION_HUNG_MAX_RESTARTS => RecoveryKind::Restart,
        StallType::SessionHung => RecoveryKind::Escalate,
        StallType::AgentWaitingForInput if retry_count < max_restarts => {
            RecoveryKind::RestartWithPreamble
        }
        StallType::AgentWaitingForInput => RecoveryKind::Escalate,
        StallType::ExecutionError => RecoveryKind::Diagnose,
        StallType::Unknown => RecoveryKind::Escalate,
    };
    RecoveryAction::new(kind, classification.clone(), retry_count)
}

/// Restart attempts per (project, phase).
///
/// A project's counters reset as soon as it is seen on a different phase, so
/// progress earns a fresh budget. Kept in memory only; a supervisor restart
/// starts every project from zero.
#[derive(Debug, Default)]
pub struct RestartHistory {
    attempts: HashMap<(String, Option<u32>), u32>,
    phases: HashMap<String, Option<u32>>,
}

impl RestartHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note the project's current phase, clearing its counters on change.
    pub fn observe_phase(&mut self, project: &str, phase: Option<u32>) {
        match self.phases.get(project) {
            Some(seen) if *seen == phase => {}
            Some(_) => {
                self.attempts.retain(|(name, _), _| name != project);
                self.phases.insert(project.to_string(), phase);
            }
            None => {
                self.phases.insert(project.to_string(), phase);
            }
        }
    }

    pub fn count(&self, project: &str, phase: Option<u32>) -> u32 {
        self.attempts.get(&(project.to_string(), phase)).copied().unwrap_or(0)
    }

    /// Record one restart and return the new count.
    pub fn record_attempt(&mut self, project: &str, phase: Option<u32>) -> u32 {
        let count = self.attempts.entry((project.to_string(), phase)).or_insert(0);
        *count += 1;
        *count
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
