// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Confidence, StallClassification, StallType};

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::{ProjectStatus, StallType};
    use proptest::prelude::*;

    pub fn arb_stall_type() -> impl Strategy<Value = StallType> {
        prop_oneof![
            Just(StallType::OrchestratorCrashed),
            Just(StallType::AgentWaitingForInput),
            Just(StallType::ExecutionError),
            Just(StallType::SessionHung),
            Just(StallType::Unknown),
        ]
    }

    pub fn arb_status() -> impl Strategy<Value = ProjectStatus> {
        prop_oneof![
            Just(ProjectStatus::Idle),
            Just(ProjectStatus::Running),
            Just(ProjectStatus::Stalled),
            Just(ProjectStatus::Complete),
            Just(ProjectStatus::Error),
        ]
    }
}

// ── Factory functions ───────────────────────────────────────────────────

pub fn classification(project: &str, stall_type: StallType, phase: Option<u32>) -> StallClassification {
    StallClassification {
        project: project.to_string(),
        phase,
        stall_type,
        confidence: Confidence::High,
        details: format!("{} stalled", project),
        heartbeat_age_ms: 20 * 60 * 1000,
    }
}
