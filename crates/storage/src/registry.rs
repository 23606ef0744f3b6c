// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry persistence.
//!
//! The registry is a pretty-printed JSON document shared with every agent.
//! Reads never fail: a missing, empty or corrupt file is an empty registry.
//! Writes go through a temp file and rename so agents never observe a
//! half-written document.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wd_core::{Liveness, Registry};

use crate::backup;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File-backed registry store.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry, degrading to an empty one on any failure.
    pub fn read(&self) -> Registry {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no registry file, starting empty");
                return Registry::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read registry");
                return Registry::default();
            }
        };

        if content.trim().is_empty() {
            return Registry::default();
        }

        match serde_json::from_str(&content) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "registry unparsable, treating as empty");
                backup::preserve_corrupt(&self.path);
                Registry::default()
            }
        }
    }

    /// Persist the registry, stamping `last_updated`.
    pub fn write(&self, registry: &mut Registry, now: DateTime<Utc>) -> Result<(), RegistryError> {
        registry.last_updated = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        let io_err = |source: std::io::Error| RegistryError::Io { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(registry)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp).map_err(io_err)?;
            file.write_all(json.as_bytes()).map_err(io_err)?;
            file.write_all(b"\n").map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    /// Read, demote records whose agent died, and write back.
    ///
    /// Returns the names of the pruned projects. Nothing is written when no
    /// record changed.
    pub fn prune_dead(
        &self,
        liveness: &dyn Liveness,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, RegistryError> {
        let mut registry = self.read();
        let pruned = prune_dead(&mut registry, liveness);
        if !pruned.is_empty() {
            self.write(&mut registry, now)?;
        }
        Ok(pruned)
    }
}

/// Set every record whose PID is dead to idle with no PID.
pub fn prune_dead(registry: &mut Registry, liveness: &dyn Liveness) -> Vec<String> {
    let mut pruned = Vec::new();
    for record in registry.projects.values_mut() {
        let Some(pid) = record.agent_pid else {
            continue;
        };
        if !liveness.is_alive(pid) {
            tracing::info!(project = %record.name, pid, "pruning dead agent");
            record.mark_idle();
            pruned.push(record.name.clone());
        }
    }
    pruned
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
