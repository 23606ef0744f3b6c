// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the specs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;

pub use assert_cmd::Command;

pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

/// Environment variables that would leak the developer's setup into a spec.
const SCRUBBED_ENV: &[&str] = &[
    "WARDEN_POLL_INTERVAL",
    "WARDEN_STALE_THRESHOLD",
    "WARDEN_TELEGRAM_TOKEN",
    "WARDEN_TELEGRAM_CHAT_ID",
    "XDG_STATE_HOME",
];

/// The binary without a state directory, for help and version output.
pub fn cli() -> Spec {
    Spec { cmd: warden_command(None) }
}

fn warden_command(state_dir: Option<&Path>) -> Command {
    let mut cmd = Command::cargo_bin("warden").unwrap();
    for key in SCRUBBED_ENV {
        cmd.env_remove(key);
    }
    cmd.env("RUST_LOG", "warn");
    if let Some(dir) = state_dir {
        cmd.env("WARDEN_STATE_DIR", dir);
    }
    cmd
}

pub struct Spec {
    cmd: Command,
}

impl Spec {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> RunOutput {
        let output = self.cmd.output().unwrap();
        let out = RunOutput::from(output);
        assert!(out.success, "expected success\nstdout:\n{}\nstderr:\n{}", out.stdout, out.stderr);
        out
    }

    pub fn fails(mut self) -> RunOutput {
        let output = self.cmd.output().unwrap();
        let out = RunOutput::from(output);
        assert!(!out.success, "expected failure\nstdout:\n{}\nstderr:\n{}", out.stdout, out.stderr);
        out
    }
}

pub struct RunOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for RunOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl RunOutput {
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout missing {:?}:\n{}", needle, self.stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr missing {:?}:\n{}", needle, self.stderr);
        self
    }
}

/// A state directory plus a directory for fake project trees.
pub struct Fleet {
    state: TempDir,
    projects: TempDir,
}

impl Fleet {
    /// Agents are spawned with `true` so nothing outlives the test.
    pub fn new() -> Self {
        let fleet = Self { state: TempDir::new().unwrap(), projects: TempDir::new().unwrap() };
        fleet.config("agent_command = [\"true\"]\n");
        fleet
    }

    pub fn state_dir(&self) -> &Path {
        self.state.path()
    }

    pub fn config(&self, toml: &str) {
        std::fs::write(self.state.path().join("config.toml"), toml).unwrap();
    }

    pub fn warden(&self) -> Spec {
        Spec { cmd: warden_command(Some(self.state.path())) }
    }

    /// Raw command for specs that manage the child process themselves.
    pub fn warden_process(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin("warden"));
        for key in SCRUBBED_ENV {
            cmd.env_remove(key);
        }
        cmd.env("WARDEN_STATE_DIR", self.state.path()).env("RUST_LOG", "info");
        cmd
    }

    /// Create a project directory and return its path.
    pub fn project_dir(&self, name: &str) -> PathBuf {
        let dir = self.projects.path().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn pid_path(&self) -> PathBuf {
        self.state.path().join("warden.pid")
    }

    pub fn write_registry(&self, projects: &[Value]) {
        let map: serde_json::Map<String, Value> = projects
            .iter()
            .map(|p| (p["name"].as_str().unwrap().to_string(), p.clone()))
            .collect();
        let registry = json!({ "projects": map, "lastUpdated": "" });
        std::fs::write(
            self.state.path().join("registry.json"),
            serde_json::to_string_pretty(&registry).unwrap(),
        )
        .unwrap();
    }

    pub fn registry(&self) -> Value {
        let raw = std::fs::read_to_string(self.state.path().join("registry.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    pub fn audit(&self) -> String {
        std::fs::read_to_string(self.state.path().join("audit.log")).unwrap_or_default()
    }
}

/// A registry row for a running project.
pub fn running_project(name: &str, path: &Path, heartbeat: DateTime<Utc>, pid: Option<u32>) -> Value {
    json!({
        "name": name,
        "path": path,
        "status": "running",
        "heartbeat": heartbeat,
        "currentPhase": 2,
        "frameworkVersion": "v1",
        "agentPid": pid,
    })
}

/// Poll `check` until it returns true or `max_ms` passes.
pub fn wait_for(max_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    check()
}
