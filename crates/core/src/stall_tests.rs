// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn stall(project: &str, stall_type: StallType, phase: Option<u32>) -> StallClassification {
    StallClassification {
        project: project.to_string(),
        phase,
        stall_type,
        confidence: Confidence::High,
        details: String::new(),
        heartbeat_age_ms: 0,
    }
}

#[yare::parameterized(
    crashed = { StallType::OrchestratorCrashed,  "orchestrator_crashed" },
    waiting = { StallType::AgentWaitingForInput, "agent_waiting_for_input" },
    error   = { StallType::ExecutionError,       "execution_error" },
    hung    = { StallType::SessionHung,          "session_hung" },
)]
fn stall_type_round_trips_wire_name(stall_type: StallType, wire: &str) {
    assert_eq!(stall_type.to_string(), wire);
    let parsed: StallType = serde_json::from_value(serde_json::json!(wire)).unwrap();
    assert_eq!(parsed, stall_type);
}

#[test]
fn unrecognized_stall_type_deserializes_to_unknown() {
    let parsed: StallType = serde_json::from_str("\"disk_full\"").unwrap();
    assert_eq!(parsed, StallType::Unknown);
}

#[test]
fn confidence_orders_low_to_high() {
    assert!(Confidence::Low < Confidence::Medium);
    assert!(Confidence::Medium < Confidence::High);
}

#[test]
fn same_pattern_requires_type_and_phase() {
    let a = stall("a", StallType::SessionHung, Some(3));
    assert!(a.same_pattern(&stall("b", StallType::SessionHung, Some(3))));
    assert!(!a.same_pattern(&stall("b", StallType::SessionHung, Some(4))));
    assert!(!a.same_pattern(&stall("b", StallType::ExecutionError, Some(3))));
}
