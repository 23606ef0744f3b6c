// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent process control: terminate a stuck agent, launch a fresh one.
//!
//! Spawned agents run in their own process group with stdio detached from
//! the supervisor, so they outlive it and never receive its terminal
//! signals.

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::{self, Pid};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use wd_core::{Liveness, SignalLiveness};

/// Environment variable carrying the restart directive to the agent.
pub const PREAMBLE_ENV: &str = "WARDEN_RESTART_PREAMBLE";

/// Grace period between SIGTERM and SIGKILL.
pub const KILL_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("agent command is empty")]
    EmptyCommand,
    #[error("project directory does not exist: {0}")]
    MissingDirectory(PathBuf),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
}

/// Result of a kill request. Killing never fails from the caller's point of
/// view except when the OS refuses the signal outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillOutcome {
    /// No such process; nothing to do
    AlreadyDead,
    /// Exited within the grace window after SIGTERM
    Terminated,
    /// Needed SIGKILL
    ForceKilled,
    /// Signal delivery was refused (e.g. a foreign process)
    Failed(String),
}

impl KillOutcome {
    /// Whether the PID is (as far as we can tell) gone.
    pub fn is_gone(&self) -> bool {
        !matches!(self, KillOutcome::Failed(_))
    }
}

#[async_trait]
pub trait ProcessController: Send + Sync + 'static {
    /// SIGTERM, wait [`KILL_GRACE`], SIGKILL if still alive.
    async fn kill(&self, pid: u32) -> KillOutcome;

    /// Launch the agent for a project, returning its PID without waiting on it.
    async fn spawn(&self, project_path: &Path, preamble: Option<&str>) -> Result<u32, ProcessError>;
}

/// Runs the configured agent command as a local child process.
#[derive(Clone)]
pub struct LocalProcessController {
    command: Vec<String>,
    /// Agent stdout/stderr, relative to the project root
    log_file: PathBuf,
    grace: Duration,
    liveness: Arc<dyn Liveness>,
}

impl LocalProcessController {
    pub fn new(command: Vec<String>, log_file: impl Into<PathBuf>) -> Self {
        Self {
            command,
            log_file: log_file.into(),
            grace: KILL_GRACE,
            liveness: Arc::new(SignalLiveness),
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    fn open_log(&self, project_path: &Path) -> Option<(Stdio, Stdio)> {
        let path = project_path.join(&self.log_file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
        let err = file.try_clone().ok()?;
        Some((Stdio::from(file), Stdio::from(err)))
    }
}

/// Signal the process group when the PID leads one (agents we spawned do),
/// otherwise the single process.
fn signal_tree(pid: Pid, sig: Signal) -> Result<(), Errno> {
    match unistd::getpgid(Some(pid)) {
        Ok(pgid) if pgid == pid => signal::killpg(pgid, sig),
        _ => signal::kill(pid, sig),
    }
}

#[async_trait]
impl ProcessController for LocalProcessController {
    async fn kill(&self, pid: u32) -> KillOutcome {
        let Ok(raw) = i32::try_from(pid) else {
            return KillOutcome::AlreadyDead;
        };
        if raw <= 0 || !self.liveness.is_alive(pid) {
            return KillOutcome::AlreadyDead;
        }
        let target = Pid::from_raw(raw);

        match signal_tree(target, Signal::SIGTERM) {
            Ok(()) => {}
            Err(Errno::ESRCH) => return KillOutcome::AlreadyDead,
            Err(e) => {
                tracing::warn!(pid, error = %e, "SIGTERM refused");
                return KillOutcome::Failed(e.to_string());
            }
        }

        tokio::time::sleep(self.grace).await;
        if !self.liveness.is_alive(pid) {
            tracing::info!(pid, "agent terminated");
            return KillOutcome::Terminated;
        }

        match signal_tree(target, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {
                tracing::info!(pid, "agent force-killed after grace period");
                KillOutcome::ForceKilled
            }
            Err(e) => {
                tracing::warn!(pid, error = %e, "SIGKILL refused");
                KillOutcome::Failed(e.to_string())
            }
        }
    }

    async fn spawn(&self, project_path: &Path, preamble: Option<&str>) -> Result<u32, ProcessError> {
        let (program, args) = self.command.split_first().ok_or(ProcessError::EmptyCommand)?;
        if !project_path.is_dir() {
            return Err(ProcessError::MissingDirectory(project_path.to_path_buf()));
        }

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args).current_dir(project_path).stdin(Stdio::null()).process_group(0);
        match self.open_log(project_path) {
            Some((out, err)) => {
                cmd.stdout(out).stderr(err);
            }
            None => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }
        if let Some(preamble) = preamble {
            cmd.env(PREAMBLE_ENV, preamble);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ProcessError::SpawnFailed(format!("{}: {}", program, e)))?;
        let pid = child
            .id()
            .ok_or_else(|| ProcessError::SpawnFailed("child exited before reporting a pid".into()))?;

        // Reap the child so it never lingers as a zombie; the supervisor does
        // not otherwise wait on it.
        let project = project_path.display().to_string();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => tracing::info!(pid, %project, %status, "agent process exited"),
                Err(e) => tracing::warn!(pid, %project, error = %e, "failed to wait on agent process"),
            }
        });

        tracing::info!(pid, project = %project_path.display(), preamble = preamble.is_some(), "agent spawned");
        Ok(pid)
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{KillOutcome, ProcessController, ProcessError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use wd_core::FakeLiveness;

    /// Recorded process operation
    #[derive(Debug, Clone, PartialEq)]
    pub enum ProcessCall {
        Kill(u32),
        Spawn { path: PathBuf, preamble: Option<String> },
    }

    struct FakeProcessState {
        calls: Vec<ProcessCall>,
        next_pid: u32,
        failing_paths: HashSet<PathBuf>,
    }

    /// Fake process controller: hands out sequential PIDs and keeps a
    /// shared [`FakeLiveness`] in step with spawns and kills.
    #[derive(Clone)]
    pub struct FakeProcessController {
        inner: Arc<Mutex<FakeProcessState>>,
        liveness: FakeLiveness,
    }

    impl FakeProcessController {
        pub fn new(liveness: FakeLiveness) -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeProcessState {
                    calls: Vec::new(),
                    next_pid: 5000,
                    failing_paths: HashSet::new(),
                })),
                liveness,
            }
        }

        /// Make spawns in this directory fail.
        pub fn fail_spawn_in(&self, path: impl Into<PathBuf>) {
            self.inner.lock().failing_paths.insert(path.into());
        }

        pub fn calls(&self) -> Vec<ProcessCall> {
            self.inner.lock().calls.clone()
        }

        pub fn spawned_paths(&self) -> Vec<PathBuf> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    ProcessCall::Spawn { path, .. } => Some(path),
                    ProcessCall::Kill(_) => None,
                })
                .collect()
        }

        pub fn killed(&self) -> Vec<u32> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    ProcessCall::Kill(pid) => Some(pid),
                    ProcessCall::Spawn { .. } => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl ProcessController for FakeProcessController {
        async fn kill(&self, pid: u32) -> KillOutcome {
            self.inner.lock().calls.push(ProcessCall::Kill(pid));
            use wd_core::Liveness;
            if self.liveness.is_alive(pid) {
                self.liveness.set_dead(pid);
                KillOutcome::Terminated
            } else {
                KillOutcome::AlreadyDead
            }
        }

        async fn spawn(&self, project_path: &Path, preamble: Option<&str>) -> Result<u32, ProcessError> {
            let mut inner = self.inner.lock();
            inner.calls.push(ProcessCall::Spawn {
                path: project_path.to_path_buf(),
                preamble: preamble.map(str::to_string),
            });
            if inner.failing_paths.contains(project_path) {
                return Err(ProcessError::SpawnFailed("fake spawn failure".into()));
            }
            inner.next_pid += 1;
            let pid = inner.next_pid;
            self.liveness.set_alive(pid);
            Ok(pid)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcessController, ProcessCall};

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
