// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use wd_core::test_support::classification;
use wd_core::test_support::strategies::arb_stall_type;

#[yare::parameterized(
    crashed_first      = { StallType::OrchestratorCrashed, 0, RecoveryKind::Restart },
    crashed_many       = { StallType::OrchestratorCrashed, 9, RecoveryKind::Restart },
    hung_first         = { StallType::SessionHung, 0, RecoveryKind::Restart },
    hung_second        = { StallType::SessionHung, 1, RecoveryKind::Restart },
    hung_exhausted     = { StallType::SessionHung, 2, RecoveryKind::Escalate },
    hung_way_over      = { StallType::SessionHung, 5, RecoveryKind::Escalate },
    waiting_first      = { StallType::AgentWaitingForInput, 0, RecoveryKind::RestartWithPreamble },
    waiting_last       = { StallType::AgentWaitingForInput, 2, RecoveryKind::RestartWithPreamble },
    waiting_exhausted  = { StallType::AgentWaitingForInput, 3, RecoveryKind::Escalate },
    exec_error         = { StallType::ExecutionError, 0, RecoveryKind::Diagnose },
    exec_error_retried = { StallType::ExecutionError, 4, RecoveryKind::Diagnose },
    unknown            = { StallType::Unknown, 0, RecoveryKind::Escalate },
)]
fn decision_table(stall: StallType, retries: u32, expected: RecoveryKind) {
    let c = classification("alpha", stall, Some(2));
    let action = decide(&c, retries, 3);
    assert_eq!(action.kind, expected);
    assert_eq!(action.retry_count, retries);
    assert_eq!(action.project(), "alpha");
}

#[test]
fn history_counts_per_phase() {
    let mut h = RestartHistory::new();
    h.observe_phase("alpha", Some(1));
    assert_eq!(h.count("alpha", Some(1)), 0);
    assert_eq!(h.record_attempt("alpha", Some(1)), 1);
    assert_eq!(h.record_attempt("alpha", Some(1)), 2);
    assert_eq!(h.count("alpha", Some(1)), 2);
    assert_eq!(h.count("beta", Some(1)), 0);
}

#[test]
fn history_resets_when_phase_changes() {
    let mut h = RestartHistory::new();
    h.observe_phase("alpha", Some(1));
    h.record_attempt("alpha", Some(1));
    h.observe_phase("beta", Some(1));
    h.record_attempt("beta", Some(1));

    h.observe_phase("alpha", Some(1));
    assert_eq!(h.count("alpha", Some(1)), 1);

    h.observe_phase("alpha", Some(2));
    assert_eq!(h.count("alpha", Some(1)), 0);
    assert_eq!(h.count("alpha", Some(2)), 0);
    assert_eq!(h.count("beta", Some(1)), 1);
}

#[test]
fn hung_session_escalates_after_two_restarts() {
    let mut h = RestartHistory::new();
    let c = classification("alpha", StallType::SessionHung, Some(4));
    let mut kinds = Vec::new();
    for _ in 0..3 {
        h.observe_phase("alpha", Some(4));
        let action = decide(&c, h.count("alpha", Some(4)), 3);
        if action.is_restart() {
            h.record_attempt("alpha", Some(4));
        }
        kinds.push(action.kind);
    }
    assert_eq!(kinds, vec![RecoveryKind::Restart, RecoveryKind::Restart, RecoveryKind::Escalate]);
}

proptest! {
    #[test]
    fn crashed_always_restarts(retries in 0u32..1000, max in 0u32..10) {
        let c = classification("p", StallType::OrchestratorCrashed, None);
        prop_assert_eq!(decide(&c, retries, max).kind, RecoveryKind::Restart);
    }

    #[test]
    fn execution_error_always_diagnoses(retries in 0u32..1000, max in 0u32..10) {
        let c = classification("p", StallType::ExecutionError, None);
        prop_assert_eq!(decide(&c, retries, max).kind, RecoveryKind::Diagnose);
    }

    #[test]
    fn decide_never_skips(stall in arb_stall_type(), retries in 0u32..10, max in 0u32..10) {
        let c = classification("p", stall, Some(1));
        prop_assert_ne!(decide(&c, retries, max).kind, RecoveryKind::Skip);
    }
}
