// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One supervision cycle.
//!
//! Read the registry once, classify every running project, act on each
//! stalled project in turn, audit every action, write the registry once.
//! A failure handling one project becomes that project's outcome text and
//! never aborts the cycle; only persisting the registry can fail it.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use wd_adapters::{KillOutcome, MemoryProvider, NotifyAdapter, ProcessController, SessionProvider};
use wd_core::{
    AuditEntry, BugLocation, Clock, Liveness, RecoveryAction, RecoveryKind, Registry,
    StallClassification,
};
use wd_storage::{AuditLog, RegistryError, RegistryStore, SnapshotReader};

use crate::classifier::classify;
use crate::config::EngineConfig;
use crate::interventor::{Intervention, Interventor};
use crate::notifier::{Notification, Notifier, Severity};
use crate::propagator::{framework_version, get_outdated, Propagator};
use crate::recovery::{decide, RestartHistory, RESTART_PREAMBLE};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("failed to persist registry: {0}")]
    Registry(#[from] RegistryError),
}

/// Everything a monitor talks to outside its own state.
pub struct MonitorDeps<P, S, N> {
    pub process: Arc<P>,
    pub session: Arc<S>,
    pub notifier: N,
    pub liveness: Arc<dyn Liveness>,
    pub memory: Option<Arc<dyn MemoryProvider>>,
    pub registry: RegistryStore,
    pub audit: AuditLog,
    pub snapshots: SnapshotReader,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionReport {
    pub project: String,
    pub kind: RecoveryKind,
    pub outcome: String,
}

/// Summary of one cycle, for logs and the `run-once` command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Running projects examined
    pub checked: usize,
    pub stalled: usize,
    pub actions: Vec<ActionReport>,
    pub registry_written: bool,
}

pub struct Monitor<P, S, N, C>
where
    P: ProcessController,
    S: SessionProvider,
    N: NotifyAdapter,
    C: Clock,
{
    process: Arc<P>,
    liveness: Arc<dyn Liveness>,
    store: RegistryStore,
    audit: AuditLog,
    snapshots: SnapshotReader,
    notifier: Notifier<N>,
    interventor: Interventor<S>,
    propagator: Option<Propagator<P>>,
    history: RestartHistory,
    config: EngineConfig,
    clock: C,
}

impl<P, S, N, C> Monitor<P, S, N, C>
where
    P: ProcessController,
    S: SessionProvider,
    N: NotifyAdapter,
    C: Clock,
{
    pub fn new(deps: MonitorDeps<P, S, N>, config: EngineConfig, clock: C) -> Self {
        let propagator = config
            .framework_root
            .clone()
            .map(|root| Propagator::new(root, Arc::clone(&deps.process), Arc::clone(&deps.liveness)));
        Self {
            interventor: Interventor::new(deps.session, deps.memory, config.clone()),
            notifier: Notifier::new(deps.notifier, config.notify_timeout),
            process: deps.process,
            liveness: deps.liveness,
            store: deps.registry,
            audit: deps.audit,
            snapshots: deps.snapshots,
            propagator,
            history: RestartHistory::new(),
            config,
            clock,
        }
    }

    pub fn history(&self) -> &RestartHistory {
        &self.history
    }

    /// Run one full cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, MonitorError> {
        let now = self.clock.now();
        let mut registry = self.store.read();
        let (checked, stalls) = self.detect(&registry, now);
        let mut report = CycleReport { checked, stalled: stalls.len(), ..CycleReport::default() };

        // Projects given a fresh agent this cycle, by restart or propagation
        let mut restarted = HashSet::new();
        for stall in &stalls {
            let entry = self.handle(stall, &stalls, &mut registry, &mut restarted, now).await;
            tracing::info!(
                project = %entry.project,
                stall = %entry.stall_type,
                action = %entry.action,
                outcome = %entry.outcome,
                "handled stall"
            );
            self.audit.append(&entry);
            report.actions.push(ActionReport {
                project: entry.project,
                kind: entry.action,
                outcome: entry.outcome,
            });
        }

        if !stalls.is_empty() {
            self.store.write(&mut registry, now)?;
            report.registry_written = true;
        }
        tracing::info!(
            checked = report.checked,
            stalled = report.stalled,
            actions = report.actions.len(),
            "cycle complete"
        );
        Ok(report)
    }

    /// Classify every running project.
    fn detect(&mut self, registry: &Registry, now: DateTime<Utc>) -> (usize, Vec<StallClassification>) {
        let mut checked = 0;
        let mut stalls = Vec::new();
        for record in registry.running() {
            checked += 1;
            self.history.observe_phase(&record.name, record.current_phase);
            let pid_alive = record.agent_pid.is_some_and(|pid| self.liveness.is_alive(pid));
            let snapshot = if pid_alive { self.snapshots.read(&record.path) } else { None };
            if let Some(stall) =
                classify(record, pid_alive, snapshot.as_ref(), now, self.config.stale_threshold)
            {
                tracing::info!(
                    project = %stall.project,
                    stall = %stall.stall_type,
                    confidence = %stall.confidence,
                    details = %stall.details,
                    "stall detected"
                );
                stalls.push(stall);
            }
        }
        (checked, stalls)
    }

    /// Decide and execute exactly one action for a stalled project.
    async fn handle(
        &mut self,
        stall: &StallClassification,
        stalls: &[StallClassification],
        registry: &mut Registry,
        restarted: &mut HashSet<String>,
        now: DateTime<Utc>,
    ) -> AuditEntry {
        let name = stall.project.as_str();
        let skip = |outcome: &str| {
            AuditEntry::new(now, name, stall.phase, stall.stall_type, RecoveryKind::Skip, outcome)
        };
        let Some(record) = registry.get(name).cloned() else {
            return skip("record disappeared from registry");
        };
        if restarted.contains(name) {
            return skip("already restarted this cycle");
        }

        let action = decide(stall, self.history.count(name, stall.phase), self.config.max_restarts);
        let mut entry =
            AuditEntry::new(now, name, stall.phase, stall.stall_type, action.kind, String::new());

        match action.kind {
            RecoveryKind::Restart | RecoveryKind::RestartWithPreamble => {
                let preamble =
                    (action.kind == RecoveryKind::RestartWithPreamble).then_some(RESTART_PREAMBLE);
                let result = self.restart(name, preamble, registry, now).await;
                self.history.record_attempt(name, stall.phase);
                restarted.insert(name.to_string());
                // Routine restarts are recorded in the audit log only
                match result {
                    Ok(outcome) => entry.outcome = outcome,
                    Err(outcome) => {
                        entry.outcome = outcome;
                        self.notify(Notification::for_action(Severity::Warning, &action, &entry.outcome))
                            .await;
                    }
                }
            }
            RecoveryKind::Escalate => {
                entry.outcome = "escalated to human".to_string();
                self.notify(Notification::for_action(Severity::Critical, &action, &entry.outcome))
                    .await;
            }
            RecoveryKind::Diagnose => {
                let intervention = self.interventor.intervene(&record, stall, stalls, now).await;
                entry.bug_location = Some(intervention.diagnosis.bug_location);
                entry.root_cause = Some(intervention.diagnosis.root_cause.clone());
                entry.file_path = intervention
                    .fix
                    .as_ref()
                    .and_then(|f| f.file_path.clone())
                    .or_else(|| intervention.diagnosis.file_path.clone());
                self.after_intervention(&action, &intervention, registry, restarted, now, &mut entry)
                    .await;
            }
            RecoveryKind::Skip => entry.outcome = "skipped".to_string(),
        }
        entry
    }

    /// Restart a project's agent, recording the new PID.
    ///
    /// A failed spawn leaves the record running with no PID, so the next
    /// cycle sees a crash and tries again. Both arms carry the outcome text.
    async fn restart(
        &self,
        name: &str,
        preamble: Option<&str>,
        registry: &mut Registry,
        now: DateTime<Utc>,
    ) -> Result<String, String> {
        let Some(record) = registry.get_mut(name) else {
            return Err("record disappeared from registry".to_string());
        };

        let mut note = String::new();
        if let Some(pid) = record.agent_pid.filter(|pid| self.liveness.is_alive(*pid)) {
            if let KillOutcome::Failed(e) = self.process.kill(pid).await {
                note = format!(" (kill {} failed: {})", pid, e);
            }
        }

        match self.process.spawn(&record.path, preamble).await {
            Ok(pid) => {
                record.mark_running(pid, now);
                Ok(format!("restarted (pid {}){}", pid, note))
            }
            Err(e) => {
                tracing::warn!(project = name, error = %e, "restart failed");
                record.status = wd_core::ProjectStatus::Running;
                record.agent_pid = None;
                Err(format!("restart failed: {}{}", e, note))
            }
        }
    }

    async fn after_intervention(
        &mut self,
        action: &RecoveryAction,
        intervention: &Intervention,
        registry: &mut Registry,
        restarted: &mut HashSet<String>,
        now: DateTime<Utc>,
        entry: &mut AuditEntry,
    ) {
        let name = action.project();
        let diagnosis = &intervention.diagnosis;

        if let Some(ref reason) = intervention.escalation {
            entry.outcome = format!("escalated: {}", reason);
            let mut message = Notification::for_action(Severity::Critical, action, &entry.outcome)
                .with_diagnosis(diagnosis);
            if let Some(ref fix) = intervention.fix {
                message = message.with_fix(fix);
            }
            self.notify(message).await;
            return;
        }

        let Some(ref fix) = intervention.fix else {
            entry.outcome = "no fix attempted".to_string();
            return;
        };
        let file = fix.file_path.clone().unwrap_or_else(|| "unknown file".to_string());

        let outcome = match diagnosis.bug_location {
            BugLocation::FrameworkBug => {
                let summary =
                    self.propagate(fix.file_path.as_deref(), registry, restarted, now, entry).await;
                format!("framework fix applied to {}; {}", file, summary)
            }
            _ => {
                let restart = self.restart(name, None, registry, now).await.unwrap_or_else(|e| e);
                restarted.insert(name.to_string());
                format!("project fix applied to {}; {}", file, restart)
            }
        };
        entry.outcome = outcome;
        let message = Notification::for_action(Severity::Info, action, &entry.outcome)
            .with_diagnosis(diagnosis)
            .with_fix(fix);
        self.notify(message).await;
    }

    /// Push a fixed framework file to every outdated project.
    async fn propagate(
        &self,
        file: Option<&str>,
        registry: &mut Registry,
        restarted: &mut HashSet<String>,
        now: DateTime<Utc>,
        entry: &mut AuditEntry,
    ) -> String {
        let Some(ref propagator) = self.propagator else {
            return "propagation skipped: no framework root".to_string();
        };
        let Some(file) = file else {
            return "propagation skipped: fixed file unknown".to_string();
        };
        let version = match framework_version(propagator.framework_root()) {
            Ok(v) => v,
            Err(e) => return format!("propagation skipped: cannot hash framework: {}", e),
        };

        let targets = get_outdated(registry, &version);
        let results = propagator.propagate(file, &targets, registry, now).await;
        let mut failed = Vec::new();
        for result in &results {
            if result.restarted {
                restarted.insert(result.project.clone());
            }
            if result.success {
                entry.propagated_to.push(result.project.clone());
            } else {
                failed.push(format!(
                    "{} ({})",
                    result.project,
                    result.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }

        let mut summary =
            format!("propagated to {}/{} projects", entry.propagated_to.len(), results.len());
        if !failed.is_empty() {
            summary.push_str(&format!("; failed: {}", failed.join(", ")));
        }
        summary
    }

    async fn notify(&self, notification: Notification) {
        self.notifier.send(&notification).await;
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
