// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnose / fix pipeline for execution errors.
//!
//! A read-only session diagnoses the stall, the verdict is corrected by
//! rules the supervisor can check itself (credentials, cross-project
//! patterns, file location), and, unless a human is needed, a second
//! session applies a small fix that is validated and reverted on failure.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use wd_adapters::{
    git_modified_files, git_restore_files, run_shell, FixMemory, MemoryProvider, SessionAccess, SessionProvider,
    SessionRequest,
};
use wd_core::{
    BugLocation, Confidence, DiagnosticResult, HotFixResult, ProjectRecord, StallClassification,
};

use crate::config::EngineConfig;
use crate::json_extract::extract_last;

/// Root causes mentioning any of these need a human: no fix can mint
/// credentials.
const CREDENTIAL_MARKERS: &[&str] = &[
    "credential",
    "api key",
    "api_key",
    "apikey",
    "authenticat",
    "unauthorized",
    "unauthorised",
    "password",
    "secret",
    "token expired",
    "expired token",
    "invalid token",
    "login",
];

/// Top-level project directories holding project-owned code.
const PROJECT_DIRS: &[&str] = &["src", "test", "tests"];

const RECALL_PER_SCOPE: usize = 3;
const RECALL_LIMIT: usize = 5;

/// Which tree a reported file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOwner {
    Framework,
    Project,
    /// Inside the tree but in no directory either side claims
    Unclaimed,
    /// Absolute outside both trees, or climbing out with `..`
    Outside,
}

/// True when a relative path is absolute or climbs above its root.
pub(crate) fn escapes(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
}

/// What a fix session reports about its own change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixReport {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default = "default_files_changed")]
    files_changed: u32,
    lines_changed: u32,
    #[serde(default)]
    summary: String,
}

fn default_success() -> bool {
    true
}

fn default_files_changed() -> u32 {
    1
}

/// A fix that already failed once in this process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FixKey {
    project: String,
    phase: Option<u32>,
    file_path: Option<String>,
    error_category: String,
}

impl FixKey {
    fn new(record: &ProjectRecord, diagnosis: &DiagnosticResult) -> Self {
        Self {
            project: record.name.clone(),
            phase: record.current_phase,
            file_path: diagnosis.file_path.clone(),
            error_category: diagnosis.error_category.clone(),
        }
    }
}

/// Result of one pass through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Intervention {
    pub diagnosis: DiagnosticResult,
    pub fix: Option<HotFixResult>,
    /// Why a human must take over; `None` when a fix landed
    pub escalation: Option<String>,
}

impl Intervention {
    pub fn fixed(&self) -> bool {
        self.fix.as_ref().is_some_and(|f| f.success)
    }
}

pub struct Interventor<S: SessionProvider> {
    session: Arc<S>,
    memory: Option<Arc<dyn MemoryProvider>>,
    config: EngineConfig,
    failed_fixes: HashSet<FixKey>,
}

impl<S: SessionProvider> Interventor<S> {
    pub fn new(
        session: Arc<S>,
        memory: Option<Arc<dyn MemoryProvider>>,
        config: EngineConfig,
    ) -> Self {
        Self { session, memory, config, failed_fixes: HashSet::new() }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the whole pipeline for one execution error.
    ///
    /// `stalls` is every stall seen this cycle, used to spot failures shared
    /// across projects.
    pub async fn intervene(
        &mut self,
        record: &ProjectRecord,
        classification: &StallClassification,
        stalls: &[StallClassification],
        now: DateTime<Utc>,
    ) -> Intervention {
        let raw = self.diagnose(record, classification).await;
        let diagnosis = self.classify_bug_location(raw, record, classification, stalls);
        tracing::info!(
            project = %record.name,
            bug_location = %diagnosis.bug_location,
            confidence = %diagnosis.confidence,
            file = ?diagnosis.file_path,
            "diagnosis complete"
        );

        if let Some(reason) = self.escalation_reason(record, &diagnosis) {
            return Intervention { diagnosis, fix: None, escalation: Some(reason) };
        }

        let fix = self.apply_fix(record, &diagnosis).await;
        self.record_outcome(record, &diagnosis, &fix, now).await;
        let escalation = (!fix.success).then(|| format!("fix failed: {}", fix.details));
        Intervention { diagnosis, fix: Some(fix), escalation }
    }

    /// Ask a read-only session what went wrong. Any failure becomes a
    /// low-confidence `human_required` verdict.
    pub async fn diagnose(
        &self,
        record: &ProjectRecord,
        classification: &StallClassification,
    ) -> DiagnosticResult {
        let query = format!("{} {}", classification.stall_type, classification.details);
        let recalled = self.recall(&record.name, &query).await;
        let prompt = diagnosis_prompt(record, classification, &recalled);

        let request = SessionRequest {
            prompt,
            cwd: record.path.clone(),
            access: SessionAccess::ReadOnly,
            timeout: self.config.session_timeout,
        };
        let output = match self.session.run(request).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(project = %record.name, error = %e, "diagnosis session failed");
                return DiagnosticResult::human_required(format!("diagnosis failed: {}", e));
            }
        };
        match extract_last::<DiagnosticResult>(&output.transcript) {
            Some(diagnosis) => diagnosis,
            None => {
                tracing::warn!(project = %record.name, "diagnosis transcript had no usable result");
                DiagnosticResult::human_required("diagnosis output could not be parsed")
            }
        }
    }

    /// Similar past fixes: this project's first, then any project's,
    /// without duplicates. Memory failures are logged and yield nothing.
    pub async fn recall(&self, project: &str, query: &str) -> Vec<FixMemory> {
        let Some(ref memory) = self.memory else {
            return Vec::new();
        };
        let scoped = memory.search(query, Some(project), RECALL_PER_SCOPE).await;
        let global = memory.search(query, None, RECALL_PER_SCOPE).await;

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for result in [scoped, global] {
            match result {
                Ok(found) => {
                    for m in found {
                        let key = (m.project.clone(), m.phase, m.file_path.clone(), m.root_cause.clone());
                        if seen.insert(key) {
                            out.push(m);
                        }
                    }
                }
                Err(e) => tracing::warn!(project, error = %e, "memory recall failed"),
            }
        }
        out.truncate(RECALL_LIMIT);
        out
    }

    /// Correct the session's verdict with rules that do not need a model.
    ///
    /// In order: credential problems always need a human; the same stall in
    /// two or more projects is a framework bug; otherwise the file location
    /// decides; otherwise the session's verdict stands. File paths come back
    /// relative to the tree that owns them. A path outside both trees, or a
    /// fail-safe verdict, is never upgraded to something a fix session acts on.
    pub fn classify_bug_location(
        &self,
        mut diagnosis: DiagnosticResult,
        record: &ProjectRecord,
        classification: &StallClassification,
        stalls: &[StallClassification],
    ) -> DiagnosticResult {
        let location = diagnosis
            .file_path
            .as_deref()
            .map(|path| self.locate(path, &record.path));
        if let Some((_, ref relative)) = location {
            diagnosis.file_path = Some(relative.clone());
        }
        let outside = matches!(location, Some((FileOwner::Outside, _)));

        let haystack = format!("{} {}", diagnosis.root_cause, diagnosis.error_category).to_lowercase();
        if CREDENTIAL_MARKERS.iter().any(|m| haystack.contains(m)) {
            diagnosis.bug_location = BugLocation::HumanRequired;
            return diagnosis;
        }

        let mut affected: BTreeSet<String> = stalls
            .iter()
            .filter(|s| s.same_pattern(classification))
            .map(|s| s.project.clone())
            .collect();
        affected.insert(classification.project.clone());
        if affected.len() >= 2 {
            diagnosis.multi_project_pattern = true;
            diagnosis.affected_projects = affected.into_iter().collect();
            if diagnosis.is_fallback() || outside {
                diagnosis.bug_location = BugLocation::HumanRequired;
            } else {
                diagnosis.bug_location = BugLocation::FrameworkBug;
                diagnosis.confidence = Confidence::High;
            }
            return diagnosis;
        }

        match location {
            Some((FileOwner::Framework, _)) => diagnosis.bug_location = BugLocation::FrameworkBug,
            Some((FileOwner::Project, _)) => diagnosis.bug_location = BugLocation::ProjectBug,
            Some((FileOwner::Outside, _)) => diagnosis.bug_location = BugLocation::HumanRequired,
            Some((FileOwner::Unclaimed, _)) | None => {}
        }
        diagnosis
    }

    /// Which tree a reported path belongs to, and the path relative to it.
    fn locate(&self, path: &str, project_root: &Path) -> (FileOwner, String) {
        let p = Path::new(path);
        let mut relative = p.to_path_buf();
        if p.is_absolute() {
            if let Some(rel) = self.config.framework_root.as_deref().and_then(|r| p.strip_prefix(r).ok()) {
                if escapes(rel) {
                    return (FileOwner::Outside, path.to_string());
                }
                return (FileOwner::Framework, rel.display().to_string());
            }
            match p.strip_prefix(project_root) {
                Ok(rel) => relative = rel.to_path_buf(),
                Err(_) => return (FileOwner::Outside, path.to_string()),
            }
        }
        if escapes(&relative) {
            return (FileOwner::Outside, path.to_string());
        }

        let first = relative.components().find_map(|c| match c {
            Component::Normal(name) => name.to_str().map(str::to_string),
            _ => None,
        });
        let owner = match first.as_deref() {
            Some(dir) if self.config.framework_dirs.iter().any(|d| d == dir) => FileOwner::Framework,
            Some(dir) if PROJECT_DIRS.contains(&dir) => FileOwner::Project,
            _ => FileOwner::Unclaimed,
        };
        (owner, relative.display().to_string())
    }

    /// Why this diagnosis goes straight to a human, if it does.
    pub fn escalation_reason(
        &self,
        record: &ProjectRecord,
        diagnosis: &DiagnosticResult,
    ) -> Option<String> {
        if diagnosis.bug_location == BugLocation::HumanRequired {
            return Some(format!("human required: {}", diagnosis.root_cause));
        }
        if diagnosis.bug_location == BugLocation::FrameworkBug && self.config.framework_root.is_none() {
            return Some("framework bug but no framework root is configured".to_string());
        }
        if self.failed_fixes.contains(&FixKey::new(record, diagnosis)) {
            return Some("an identical fix already failed for this project and phase".to_string());
        }
        None
    }

    fn fix_root(&self, record: &ProjectRecord, diagnosis: &DiagnosticResult) -> Option<PathBuf> {
        match diagnosis.bug_location {
            BugLocation::FrameworkBug => self.config.framework_root.clone(),
            BugLocation::ProjectBug => Some(record.path.clone()),
            BugLocation::HumanRequired => None,
        }
    }

    /// Have a write-capable session make the fix, then validate it.
    pub async fn apply_fix(&self, record: &ProjectRecord, diagnosis: &DiagnosticResult) -> HotFixResult {
        let Some(root) = self.fix_root(record, diagnosis) else {
            return HotFixResult::failed("no tree to fix for this diagnosis");
        };
        let framework = diagnosis.bug_location == BugLocation::FrameworkBug;
        // Changes already present are not the fix session's to revert
        let before = match git_modified_files(&root).await {
            Ok(files) => Some(files),
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "cannot list working-tree changes");
                None
            }
        };

        let request = SessionRequest {
            prompt: fix_prompt(record, diagnosis, self.config.fix_line_budget),
            cwd: root.clone(),
            access: SessionAccess::Write,
            timeout: self.config.session_timeout,
        };
        let output = match self.session.run(request).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(project = %record.name, error = %e, "fix session failed");
                let mut result = HotFixResult::failed(format!("fix session failed: {}", e));
                result.file_path = diagnosis.file_path.clone();
                result.reverted_on_failure = self.revert(&root, diagnosis.file_path.as_deref(), before.as_ref()).await;
                return result;
            }
        };

        let report = extract_last::<FixReport>(&output.transcript);
        let file_path = report
            .as_ref()
            .and_then(|r| r.file_path.as_deref())
            .and_then(|p| match self.locate(p, &root) {
                (FileOwner::Outside, _) => None,
                (_, relative) => Some(relative),
            })
            .or_else(|| diagnosis.file_path.clone());
        let mut result = HotFixResult {
            file_path: file_path.clone(),
            lines_changed: report.as_ref().map(|r| r.lines_changed).unwrap_or(0),
            session_cost_usd: output.cost_usd,
            ..HotFixResult::default()
        };

        if let Some(ref r) = report {
            if !r.success {
                result.details = format!("session gave up: {}", r.summary);
                result.reverted_on_failure = self.revert(&root, file_path.as_deref(), before.as_ref()).await;
                return result;
            }
        }

        // An unreadable report cannot prove the change stayed in budget
        let over_budget = report.as_ref().is_none_or(|r| {
            r.files_changed > 1 || r.lines_changed > self.config.fix_line_budget
        });
        let commands = if framework {
            &self.config.validate_commands
        } else {
            &self.config.project_validate_commands
        };

        if framework || over_budget {
            if let Err(failure) = self.validate(&root, commands).await {
                tracing::warn!(project = %record.name, file = ?file_path, "fix failed validation, reverting");
                result.details = format!("validation failed: {}", failure);
                result.reverted_on_failure = self.revert(&root, file_path.as_deref(), before.as_ref()).await;
                return result;
            }
        }

        result.success = true;
        result.validation_passed = true;
        result.details = report
            .map(|r| r.summary)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "fix applied".to_string());
        tracing::info!(
            project = %record.name,
            file = ?result.file_path,
            lines = result.lines_changed,
            validated = framework || over_budget,
            "fix applied"
        );
        result
    }

    /// Run each command in order; the first failure stops the run.
    async fn validate(&self, root: &Path, commands: &[String]) -> Result<(), String> {
        for command in commands {
            let outcome = run_shell(root, command, self.config.validate_timeout).await;
            if !outcome.success {
                return Err(format!("`{}`: {}", command, outcome.output.trim()));
            }
        }
        Ok(())
    }

    /// Restore every tracked file the fix session changed, plus the file it
    /// reported. Files already modified before the session are left alone.
    async fn revert(&self, root: &Path, file: Option<&str>, before: Option<&BTreeSet<String>>) -> bool {
        let now = match git_modified_files(root).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "cannot list changes to revert");
                return false;
            }
        };
        let files: Vec<String> = now
            .into_iter()
            .filter(|f| before.is_some_and(|b| !b.contains(f)) || file == Some(f.as_str()))
            .collect();
        if files.is_empty() {
            tracing::info!(root = %root.display(), "fix left no tracked changes");
            return true;
        }

        let outcome = git_restore_files(root, &files).await;
        if outcome.success {
            tracing::info!(root = %root.display(), files = ?files, "fix reverted");
        } else {
            tracing::warn!(root = %root.display(), files = ?files, error = %outcome.output, "revert failed");
        }
        outcome.success
    }

    /// Remember failures for the escalate gate and successes for recall.
    async fn record_outcome(
        &mut self,
        record: &ProjectRecord,
        diagnosis: &DiagnosticResult,
        fix: &HotFixResult,
        now: DateTime<Utc>,
    ) {
        if !fix.success {
            self.failed_fixes.insert(FixKey::new(record, diagnosis));
            return;
        }
        let Some(ref memory) = self.memory else {
            return;
        };
        let entry = FixMemory {
            project: record.name.clone(),
            phase: record.current_phase,
            error_category: diagnosis.error_category.clone(),
            file_path: fix.file_path.clone(),
            root_cause: diagnosis.root_cause.clone(),
            outcome: fix.details.clone(),
            timestamp: now,
        };
        if let Err(e) = memory.store(entry).await {
            tracing::warn!(project = %record.name, error = %e, "failed to store fix memory");
        }
    }
}

fn diagnosis_prompt(
    record: &ProjectRecord,
    classification: &StallClassification,
    recalled: &[FixMemory],
) -> String {
    let phase = record.current_phase.map(|p| p.to_string()).unwrap_or_else(|| "unknown".into());
    let mut prompt = format!(
        "An autonomous build agent stopped making progress.\n\n\
         Project: {}\nPath: {}\nPhase: {}\nStall: {}\nDetails: {}\n\n\
         Investigate the project (read-only) and find the root cause. Decide whether it \
         lives in the shared framework code, in this project's own code, or needs a human \
         (credentials, external services, ambiguous requirements).\n",
        record.name,
        record.path.display(),
        phase,
        classification.stall_type,
        classification.details,
    );
    if !recalled.is_empty() {
        prompt.push_str("\nSimilar past fixes:\n");
        for m in recalled {
            let _ = writeln!(prompt, "- {}", m.summary());
        }
    }
    prompt.push_str(
        "\nEnd your answer with a single JSON object:\n\
         {\"bugLocation\": \"framework_bug\" | \"project_bug\" | \"human_required\", \
         \"confidence\": \"high\" | \"medium\" | \"low\", \"rootCause\": \"...\", \
         \"filePath\": \"relative/path\" or null, \"errorCategory\": \"...\"}\n",
    );
    prompt
}

fn fix_prompt(record: &ProjectRecord, diagnosis: &DiagnosticResult, line_budget: u32) -> String {
    let file = diagnosis.file_path.as_deref().unwrap_or("(locate the file yourself)");
    format!(
        "Apply a hot fix for a stalled build agent.\n\n\
         Project: {}\nRoot cause: {}\nCategory: {}\nFile: {}\n\n\
         Keep the change under {} lines, one file only. Do not refactor, do not touch \
         other files, and verify the change compiles if you can.\n\n\
         End your answer with a single JSON object:\n\
         {{\"success\": true | false, \"filePath\": \"relative/path\", \"filesChanged\": 1, \
         \"linesChanged\": <n>, \"summary\": \"...\"}}\n",
        record.name, diagnosis.root_cause, diagnosis.error_category, file, line_budget,
    )
}

#[cfg(test)]
#[path = "interventor_tests.rs"]
mod tests;
