// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for everything outside the supervisor process: agent processes,
//! AI sessions, notification channels, long-term memory, and shell commands.

pub mod command;
pub mod memory;
pub mod notify;
pub mod process;
pub mod session;

pub use command::{git_modified_files, git_restore_files, run_shell, CommandOutcome};
#[cfg(any(test, feature = "test-support"))]
pub use memory::InMemoryMemory;
pub use memory::{FileMemory, FixMemory, MemoryError, MemoryProvider};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
pub use notify::{
    DesktopNotifyAdapter, Markup, NotifyAdapter, NotifyError, TelegramNotifyAdapter, TELEGRAM_MAX_LEN,
};
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeProcessController, ProcessCall};
pub use process::{
    KillOutcome, LocalProcessController, ProcessController, ProcessError, PREAMBLE_ENV,
};
#[cfg(any(test, feature = "test-support"))]
pub use session::FakeSession;
pub use session::{
    ClaudeCliSession, SessionAccess, SessionError, SessionOutput, SessionProvider, SessionRequest,
};
