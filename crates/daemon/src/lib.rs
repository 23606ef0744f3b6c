// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Warden daemon library
//!
//! Configuration, the PID lock, logging setup and the persistent loop
//! behind the `warden` binary.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod channel;
pub mod config;
pub mod env;
pub mod lifecycle;
pub mod logging;
pub mod status;
pub mod supervisor;

pub use channel::Channel;
pub use config::{Config, ConfigError, TelegramConfig};
pub use lifecycle::{LifecycleError, PidLock};
pub use supervisor::{build_monitor, run_loop, run_once, start, DaemonMonitor};
