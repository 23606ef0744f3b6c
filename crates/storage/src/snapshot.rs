// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only access to each agent's state snapshot file.

use std::fs;
use std::path::{Path, PathBuf};
use wd_core::AgentSnapshot;

/// Locates and parses `<project>/<relative>` snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    relative: PathBuf,
}

impl SnapshotReader {
    pub fn new(relative: impl Into<PathBuf>) -> Self {
        Self { relative: relative.into() }
    }

    pub fn path_for(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.relative)
    }

    /// `None` when the file is missing or unparsable.
    pub fn read(&self, project_root: &Path) -> Option<AgentSnapshot> {
        let path = self.path_for(project_root);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "agent snapshot unparsable");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
