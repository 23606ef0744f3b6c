// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Copy fixed framework files into every project that carries an older
//! framework, then restart those projects' agents.
//!
//! The framework tree is canonical: a project's copy of a framework file is
//! overwritten even if the project changed it locally.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wd_adapters::ProcessController;
use wd_core::{Liveness, PropagationResult, Registry};

use crate::interventor::escapes;

/// Hex characters kept from the content hash.
const VERSION_LEN: usize = 12;

/// Directories never part of the framework's identity.
const IGNORED_DIRS: &[&str] = &[".git", "node_modules"];

/// Records whose framework version differs from `current`.
pub fn get_outdated(registry: &Registry, current: &str) -> Vec<String> {
    registry
        .projects
        .values()
        .filter(|r| r.framework_version != current)
        .map(|r| r.name.clone())
        .collect()
}

/// Short content hash of the framework tree: every file's relative path and
/// bytes, in sorted path order.
pub fn framework_version(root: &Path) -> std::io::Result<String> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    for rel in &files {
        hasher.update(rel.to_string_lossy().as_bytes());
        hasher.update([0]);
        hasher.update(fs::read(root.join(rel))?);
        hasher.update([0]);
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    Ok(hex[..VERSION_LEN].to_string())
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if IGNORED_DIRS.iter().any(|d| name == *d) {
                continue;
            }
            collect_files(root, &entry.path(), out)?;
        } else if file_type.is_file() {
            if let Ok(rel) = entry.path().strip_prefix(root) {
                out.push(rel.to_path_buf());
            }
        }
    }
    Ok(())
}

/// Copying a file onto itself truncates it.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

pub struct Propagator<P: ProcessController> {
    framework_root: PathBuf,
    process: Arc<P>,
    liveness: Arc<dyn Liveness>,
}

impl<P: ProcessController> Propagator<P> {
    pub fn new(framework_root: impl Into<PathBuf>, process: Arc<P>, liveness: Arc<dyn Liveness>) -> Self {
        Self { framework_root: framework_root.into(), process, liveness }
    }

    pub fn framework_root(&self) -> &Path {
        &self.framework_root
    }

    /// Copy `rel_path` from the framework into each target and restart the
    /// target's agent if it is running. One result per target; a failing
    /// target never stops the others.
    pub async fn propagate(
        &self,
        rel_path: &str,
        targets: &[String],
        registry: &mut Registry,
        now: DateTime<Utc>,
    ) -> Vec<PropagationResult> {
        if rel_path.is_empty() || escapes(Path::new(rel_path)) {
            tracing::warn!(file = rel_path, "refusing to propagate a path outside the framework tree");
            return targets
                .iter()
                .map(|t| PropagationResult::failed(t.as_str(), format!("not a framework-relative path: {}", rel_path)))
                .collect();
        }
        let source = self.framework_root.join(rel_path);
        let version = match framework_version(&self.framework_root) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(root = %self.framework_root.display(), error = %e, "cannot hash framework tree");
                None
            }
        };

        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let result = self.propagate_one(&source, rel_path, target, version.as_deref(), registry, now).await;
            match result.error {
                Some(ref error) => tracing::warn!(project = %target, file = rel_path, %error, "propagation failed"),
                None => tracing::info!(project = %target, file = rel_path, restarted = result.restarted, "propagated fix"),
            }
            results.push(result);
        }
        results
    }

    async fn propagate_one(
        &self,
        source: &Path,
        rel_path: &str,
        target: &str,
        version: Option<&str>,
        registry: &mut Registry,
        now: DateTime<Utc>,
    ) -> PropagationResult {
        let Some(record) = registry.get_mut(target) else {
            return PropagationResult::failed(target, "not in registry");
        };
        if !record.path.is_dir() {
            return PropagationResult::failed(
                target,
                format!("project directory missing: {}", record.path.display()),
            );
        }

        let dest = record.path.join(rel_path);
        if same_file(source, &dest) {
            return PropagationResult::failed(target, "project copy is the framework file itself");
        }
        let copied = dest
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::copy(source, &dest));
        if let Err(e) = copied {
            return PropagationResult::failed(target, format!("copy failed: {}", e));
        }

        let mut result = PropagationResult {
            project: target.to_string(),
            success: true,
            files_copied: 1,
            ..PropagationResult::default()
        };
        if let Some(version) = version {
            record.framework_version = version.to_string();
            result.new_version = Some(version.to_string());
        }

        if !record.is_running() {
            return result;
        }
        if let Some(pid) = record.agent_pid.filter(|pid| self.liveness.is_alive(*pid)) {
            self.process.kill(pid).await;
        }
        match self.process.spawn(&record.path, None).await {
            Ok(pid) => {
                record.mark_running(pid, now);
                result.restarted = true;
            }
            Err(e) => {
                record.agent_pid = None;
                result.success = false;
                result.error = Some(format!("restart failed: {}", e));
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "propagator_tests.rs"]
mod tests;
