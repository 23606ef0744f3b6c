// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wd-core: data model and shared primitives for the Warden fleet supervisor

pub mod macros;

pub mod audit;
pub mod clock;
pub mod diagnosis;
pub mod liveness;
pub mod project;
pub mod recovery;
pub mod snapshot;
pub mod stall;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use audit::AuditEntry;
pub use clock::{Clock, FakeClock, SystemClock};
pub use diagnosis::{
    BugLocation, DiagnosticResult, HotFixResult, PropagationResult, DIAGNOSIS_UNAVAILABLE,
};
#[cfg(any(test, feature = "test-support"))]
pub use liveness::FakeLiveness;
pub use liveness::{Liveness, SignalLiveness};
#[cfg(any(test, feature = "test-support"))]
pub use project::ProjectRecordBuilder;
pub use project::{ProjectRecord, ProjectStatus, Registry};
pub use recovery::{RecoveryAction, RecoveryKind};
pub use snapshot::{AgentSnapshot, FailureEntry};
pub use stall::{Confidence, StallClassification, StallType};
pub use time_fmt::{format_elapsed_ms, parse_duration};
