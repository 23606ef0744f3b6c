// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for Warden: the shared registry file, the append-only
//! audit log, and the read-only view of each agent's state snapshot.

mod audit;
mod backup;
mod registry;
mod snapshot;

pub use audit::AuditLog;
pub use registry::{prune_dead, RegistryError, RegistryStore};
pub use snapshot::SnapshotReader;
