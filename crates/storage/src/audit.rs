// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only improvement log.
//!
//! One human-readable line per recovery action. The supervisor never
//! rewrites or truncates this file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use wd_core::AuditEntry;

pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry.
    ///
    /// Failures are logged via tracing but do not propagate; the audit log
    /// is telemetry, never a gate on recovery.
    pub fn append(&self, entry: &AuditEntry) {
        if let Err(e) = self.write_line(entry) {
            tracing::warn!(
                project = %entry.project,
                path = %self.path.display(),
                error = %e,
                "failed to append audit entry"
            );
        }
    }

    fn write_line(&self, entry: &AuditEntry) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", entry)
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
