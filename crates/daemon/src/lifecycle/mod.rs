// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor lifecycle: the single-instance PID lock.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use wd_core::Liveness;

use crate::config::ConfigError;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: warden already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("warden already running (pid {0})")]
    AlreadyRunning(u32),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LifecycleError {
    /// The lock belongs to another instance, so its files must stay.
    pub fn is_foreign_lock(&self) -> bool {
        matches!(self, Self::LockFailed(_) | Self::AlreadyRunning(_))
    }
}

/// Exclusive lock on `warden.pid`, holding our PID while we run.
#[derive(Debug)]
pub struct PidLock {
    path: PathBuf,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    file: File,
}

impl PidLock {
    /// Take the lock or refuse to start.
    ///
    /// The file is opened without truncation so a running instance's PID
    /// survives a failed attempt. A file naming a different live process is
    /// refused even when the OS lock was free.
    pub fn acquire(path: &Path, liveness: &dyn Liveness) -> Result<Self, LifecycleError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file =
            OpenOptions::new().read(true).write(true).create(true).truncate(false).open(path)?;
        file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

        let mut previous = String::new();
        file.read_to_string(&mut previous)?;
        let own = std::process::id();
        if let Some(pid) = previous.trim().parse::<u32>().ok().filter(|pid| *pid != own) {
            if liveness.is_alive(pid) {
                return Err(LifecycleError::AlreadyRunning(pid));
            }
            info!(pid, "replacing stale PID file");
        }

        file.set_len(0)?;
        file.rewind()?;
        writeln!(file, "{}", own)?;
        file.flush()?;
        Ok(Self { path: path.to_path_buf(), file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the PID file and drop the lock.
    pub fn release(self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove PID file");
        }
        drop(self.file);
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
