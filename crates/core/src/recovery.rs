// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery actions chosen for a stalled project.

use crate::stall::StallClassification;
use serde::{Deserialize, Serialize};

/// What the monitor should do about a stall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryKind {
    Restart,
    /// Restart with a directive forbidding the agent from waiting on a human
    RestartWithPreamble,
    Escalate,
    /// Hand off to the diagnose/fix pipeline
    Diagnose,
    Skip,
}

crate::simple_display! {
    RecoveryKind {
        Restart => "restart",
        RestartWithPreamble => "restart_with_preamble",
        Escalate => "escalate",
        Diagnose => "diagnose",
        Skip => "skip",
    }
}

/// A recovery decision together with the stall that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryAction {
    pub kind: RecoveryKind,
    pub classification: StallClassification,
    /// Restarts already spent on this project's current phase
    pub retry_count: u32,
}

impl RecoveryAction {
    pub fn new(kind: RecoveryKind, classification: StallClassification, retry_count: u32) -> Self {
        Self { kind, classification, retry_count }
    }

    pub fn project(&self) -> &str {
        &self.classification.project
    }

    pub fn is_restart(&self) -> bool {
        matches!(self.kind, RecoveryKind::Restart | RecoveryKind::RestartWithPreamble)
    }
}
