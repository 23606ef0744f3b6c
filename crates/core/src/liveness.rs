// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process liveness checks.
//!
//! One check shared by the registry store (pruning), the monitor (classifier
//! inputs) and the process controller (kill escalation).

use nix::errno::Errno;
use nix::sys::signal;
use nix::unistd::Pid;

/// Answers "is this PID still a running process?"
pub trait Liveness: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
}

/// Liveness via the null signal (`kill(pid, 0)`).
///
/// `ESRCH` means the process is gone. `EPERM` means the process exists but
/// belongs to another user, which still counts as alive.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignalLiveness;

impl Liveness for SignalLiveness {
    fn is_alive(&self, pid: u32) -> bool {
        // PID 0 and values beyond i32 would address process groups, not a process
        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        if raw <= 0 {
            return false;
        }
        match signal::kill(Pid::from_raw(raw), None) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Liveness;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Liveness backed by an explicit set of alive PIDs.
    #[derive(Clone, Default)]
    pub struct FakeLiveness {
        alive: Arc<Mutex<HashSet<u32>>>,
    }

    impl FakeLiveness {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_alive(pids: impl IntoIterator<Item = u32>) -> Self {
            let fake = Self::new();
            fake.alive.lock().extend(pids);
            fake
        }

        pub fn set_alive(&self, pid: u32) {
            self.alive.lock().insert(pid);
        }

        pub fn set_dead(&self, pid: u32) {
            self.alive.lock().remove(&pid);
        }
    }

    impl Liveness for FakeLiveness {
        fn is_alive(&self, pid: u32) -> bool {
            self.alive.lock().contains(&pid)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeLiveness;

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
