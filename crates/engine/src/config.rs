// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine tunables, resolved by the daemon from its configuration file.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Heartbeats younger than this are healthy
    pub stale_threshold: Duration,
    /// Restart budget for agents blocked on input
    pub max_restarts: u32,
    /// Canonical framework tree; framework fixes escalate when unset
    pub framework_root: Option<PathBuf>,
    /// Top-level directories inside a project that belong to the framework
    pub framework_dirs: Vec<String>,
    /// Run in the framework tree after every framework fix
    pub validate_commands: Vec<String>,
    /// Run in the project tree when a project fix exceeds its budget
    pub project_validate_commands: Vec<String>,
    pub validate_timeout: Duration,
    pub session_timeout: Duration,
    /// Largest change, in lines, a fix may make without forced validation
    pub fix_line_budget: u32,
    pub notify_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stale_threshold: Duration::from_secs(15 * 60),
            max_restarts: 3,
            framework_root: None,
            framework_dirs: vec!["orchestrator".to_string(), ".claude".to_string()],
            validate_commands: vec!["npm run build".to_string(), "npm test".to_string()],
            project_validate_commands: Vec::new(),
            validate_timeout: Duration::from_secs(10 * 60),
            session_timeout: Duration::from_secs(10 * 60),
            fix_line_budget: 30,
            notify_timeout: Duration::from_secs(30),
        }
    }
}
