// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Results of the diagnose / fix / propagate pipeline.

use crate::stall::Confidence;
use serde::{Deserialize, Serialize};

/// Where the root cause of a stall lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BugLocation {
    /// Code shared by every project
    FrameworkBug,
    /// Code generated inside one project
    ProjectBug,
    /// Unsafe to fix automatically
    HumanRequired,
}

crate::simple_display! {
    BugLocation {
        FrameworkBug => "framework_bug",
        ProjectBug => "project_bug",
        HumanRequired => "human_required",
    }
}

/// Structured output of a diagnosis session.
///
/// `bug_location`, `confidence` and `root_cause` are required when parsing a
/// session transcript; a transcript without them is rejected rather than
/// partially trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticResult {
    pub bug_location: BugLocation,
    pub confidence: Confidence,
    pub root_cause: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default = "unknown_category")]
    pub error_category: String,
    #[serde(default)]
    pub multi_project_pattern: bool,
    #[serde(default)]
    pub affected_projects: Vec<String>,
}

/// Error category of the fail-safe verdict used when no diagnosis was made.
pub const DIAGNOSIS_UNAVAILABLE: &str = "diagnosis_unavailable";

fn unknown_category() -> String {
    "unknown".to_string()
}

impl DiagnosticResult {
    /// The fail-safe verdict: escalate to a human, trust nothing.
    pub fn human_required(reason: impl Into<String>) -> Self {
        Self {
            bug_location: BugLocation::HumanRequired,
            confidence: Confidence::Low,
            root_cause: reason.into(),
            file_path: None,
            error_category: DIAGNOSIS_UNAVAILABLE.to_string(),
            multi_project_pattern: false,
            affected_projects: Vec::new(),
        }
    }

    /// True for the fail-safe verdict, which carries no evidence to refine.
    pub fn is_fallback(&self) -> bool {
        self.bug_location == BugLocation::HumanRequired && self.error_category == DIAGNOSIS_UNAVAILABLE
    }
}

/// Outcome of a hot-fix attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotFixResult {
    pub success: bool,
    pub file_path: Option<String>,
    pub lines_changed: u32,
    pub validation_passed: bool,
    pub reverted_on_failure: bool,
    pub details: String,
    pub session_cost_usd: f64,
}

impl HotFixResult {
    pub fn failed(details: impl Into<String>) -> Self {
        Self { details: details.into(), ..Self::default() }
    }
}

/// Outcome of copying a fixed file into one target project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationResult {
    pub project: String,
    pub success: bool,
    pub files_copied: u32,
    pub new_version: Option<String>,
    pub restarted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PropagationResult {
    pub fn failed(project: impl Into<String>, error: impl Into<String>) -> Self {
        Self { project: project.into(), error: Some(error.into()), ..Self::default() }
    }
}

#[cfg(test)]
#[path = "diagnosis_tests.rs"]
mod tests;
