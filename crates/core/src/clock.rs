// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.
//!
//! Heartbeats in the registry are wall-clock timestamps written by other
//! processes, so staleness is computed against wall time rather than a
//! monotonic `Instant`.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// A clock that provides the current wall time
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn epoch_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Real system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    /// Start at a fixed, readable instant so test expectations are stable.
    pub fn new() -> Self {
        let start = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        Self::at(start)
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self { current: Arc::new(Mutex::new(now)) }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let delta = ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::zero());
        *self.current.lock() += delta;
    }

    /// Set the clock to a specific instant
    pub fn set(&self, now: DateTime<Utc>) {
        *self.current.lock() = now;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
