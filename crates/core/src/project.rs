// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised projects and the shared registry that lists them.
//!
//! The registry is written by two kinds of processes: each project's agent
//! (heartbeat, phase, PID) and the supervisor (recovery). Every field is
//! therefore tolerant of absence so a partially written record still loads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Lifecycle status of a supervised project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Idle,
    Running,
    Stalled,
    Complete,
    Error,
}

crate::simple_display! {
    ProjectStatus {
        Idle => "idle",
        Running => "running",
        Stalled => "stalled",
        Complete => "complete",
        Error => "error",
    }
}

/// One registry row per supervised project.
///
/// `agent_pid` is only set while `status` is `Running`; use
/// [`ProjectRecord::mark_running`] and [`ProjectRecord::mark_idle`] to keep
/// the two in step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Last liveness report from the project's agent
    #[serde(default)]
    pub heartbeat: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_phase: Option<u32>,
    /// Opaque token identifying the framework copy inside the project
    #[serde(default)]
    pub framework_version: String,
    #[serde(default)]
    pub agent_pid: Option<u32>,
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_completed_phase: Option<u32>,
}

impl ProjectRecord {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            status: ProjectStatus::Idle,
            heartbeat: None,
            current_phase: None,
            framework_version: String::new(),
            agent_pid: None,
            registered_at: None,
            last_completed_phase: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ProjectStatus::Running
    }

    /// Record a freshly spawned agent process.
    ///
    /// The heartbeat is reset so the new process gets a full staleness
    /// window before it is judged again.
    pub fn mark_running(&mut self, pid: u32, now: DateTime<Utc>) {
        self.status = ProjectStatus::Running;
        self.agent_pid = Some(pid);
        self.heartbeat = Some(now);
    }

    /// The agent process is gone and nothing replaced it.
    pub fn mark_idle(&mut self) {
        self.status = ProjectStatus::Idle;
        self.agent_pid = None;
    }

    /// Milliseconds since the last heartbeat, or `None` when no heartbeat
    /// was ever recorded.
    pub fn heartbeat_age_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        self.heartbeat.map(|hb| (now - hb).num_milliseconds())
    }
}

/// The shared registry: every known project plus the last write stamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectRecord>,
    /// RFC 3339 timestamp of the last supervisor write; empty when never written
    #[serde(default)]
    pub last_updated: String,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&ProjectRecord> {
        self.projects.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ProjectRecord> {
        self.projects.get_mut(name)
    }

    pub fn insert(&mut self, record: ProjectRecord) {
        self.projects.insert(record.name.clone(), record);
    }

    pub fn running(&self) -> impl Iterator<Item = &ProjectRecord> {
        self.projects.values().filter(|r| r.is_running())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod builder {
    use super::{ProjectRecord, ProjectStatus};
    use chrono::{DateTime, Utc};
    use std::path::PathBuf;

    /// Test builder for [`ProjectRecord`] with running defaults.
    pub struct ProjectRecordBuilder {
        record: ProjectRecord,
    }

    impl Default for ProjectRecordBuilder {
        fn default() -> Self {
            let mut record = ProjectRecord::new("test-project", "/tmp/test-project");
            record.status = ProjectStatus::Running;
            record.current_phase = Some(1);
            record.framework_version = "v-test".to_string();
            Self { record }
        }
    }

    impl ProjectRecordBuilder {
        pub fn name(mut self, name: impl Into<String>) -> Self {
            self.record.name = name.into();
            self
        }

        pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
            self.record.path = path.into();
            self
        }

        pub fn status(mut self, status: ProjectStatus) -> Self {
            self.record.status = status;
            self
        }

        pub fn heartbeat(mut self, at: DateTime<Utc>) -> Self {
            self.record.heartbeat = Some(at);
            self
        }

        pub fn phase(mut self, phase: u32) -> Self {
            self.record.current_phase = Some(phase);
            self
        }

        pub fn pid(mut self, pid: u32) -> Self {
            self.record.agent_pid = Some(pid);
            self
        }

        pub fn version(mut self, version: impl Into<String>) -> Self {
            self.record.framework_version = version.into();
            self
        }

        pub fn build(self) -> ProjectRecord {
            self.record
        }
    }

    impl ProjectRecord {
        /// Create a builder with test defaults (running, phase 1).
        pub fn builder() -> ProjectRecordBuilder {
            ProjectRecordBuilder::default()
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use builder::ProjectRecordBuilder;

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
