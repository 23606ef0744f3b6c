// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Supervision engine: stall classification, recovery decisions, the
//! diagnose/fix/propagate pipeline, notification formatting, and the
//! monitor cycle that ties them together.

pub mod classifier;
mod config;
pub mod interventor;
mod json_extract;
pub mod monitor;
pub mod notifier;
pub mod propagator;
pub mod recovery;

pub use classifier::classify;
pub use config::EngineConfig;
pub use interventor::{Intervention, Interventor};
pub use json_extract::{extract_last, last_json_object};
pub use monitor::{ActionReport, CycleReport, Monitor, MonitorDeps, MonitorError};
pub use notifier::{escape_markdown_v2, split_message, Notification, Notifier, Severity};
pub use propagator::{framework_version, get_outdated, Propagator};
pub use recovery::{decide, RestartHistory, RESTART_PREAMBLE};
