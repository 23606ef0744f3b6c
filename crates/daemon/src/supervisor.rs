// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring and the persistent loop.
//!
//! Ticks are awaited one after another, so cycles never overlap; a cycle
//! that overruns the interval delays the next tick instead of bursting.
//! Shutdown stops the timer between cycles. Supervised agents keep running.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;
use wd_adapters::{
    ClaudeCliSession, FileMemory, LocalProcessController, MemoryProvider, NotifyAdapter,
    ProcessController, SessionProvider,
};
use wd_core::{Clock, Liveness, SignalLiveness, SystemClock};
use wd_engine::{CycleReport, Monitor, MonitorDeps, MonitorError};
use wd_storage::{AuditLog, RegistryStore, SnapshotReader};

use crate::channel::Channel;
use crate::config::Config;
use crate::lifecycle::{LifecycleError, PidLock};

/// Monitor with the production adapters
pub type DaemonMonitor = Monitor<LocalProcessController, ClaudeCliSession, Channel, SystemClock>;

pub fn build_monitor(config: &Config) -> DaemonMonitor {
    let liveness: Arc<dyn Liveness> = Arc::new(SignalLiveness);
    let memory = config
        .memory_enabled
        .then(|| Arc::new(FileMemory::new(&config.memory_path)) as Arc<dyn MemoryProvider>);
    let channel = Channel::from_config(config.telegram.as_ref());
    info!(channel = channel.name(), memory = config.memory_enabled, "notification channel ready");

    let deps = MonitorDeps {
        process: Arc::new(LocalProcessController::new(
            config.agent_command.clone(),
            &config.agent_log,
        )),
        session: Arc::new(ClaudeCliSession::new(&config.session_command)),
        notifier: channel,
        liveness,
        memory,
        registry: RegistryStore::new(&config.registry_path),
        audit: AuditLog::new(&config.audit_path),
        snapshots: SnapshotReader::new(&config.snapshot_file),
    };
    Monitor::new(deps, config.engine.clone(), SystemClock)
}

/// `warden run-once`: one cycle under the lock.
pub async fn run_once(config: &Config) -> anyhow::Result<CycleReport> {
    let lock = PidLock::acquire(&config.lock_path, &SignalLiveness)?;
    let mut monitor = build_monitor(config);
    let result = monitor.run_cycle().await;
    lock.release();
    Ok(result?)
}

/// `warden start`: cycle every poll interval until SIGINT or SIGTERM.
pub async fn start(config: &Config) -> anyhow::Result<()> {
    // Handlers are installed before the PID file is written
    let shutdown = shutdown_signal().map_err(LifecycleError::Io)?;
    let lock = PidLock::acquire(&config.lock_path, &SignalLiveness)?;

    info!(
        state_dir = %config.state_dir.display(),
        interval = ?config.poll_interval,
        pid = std::process::id(),
        "warden started"
    );
    let mut monitor = build_monitor(config);
    let result = run_loop(&mut monitor, config.poll_interval, shutdown).await;

    lock.release();
    info!("warden stopped");
    result.map(|_| ()).map_err(Into::into)
}

/// Run cycles until `shutdown` resolves. Returns the number of completed
/// cycles. A registry write failure ends the loop.
pub async fn run_loop<P, S, N, C>(
    monitor: &mut Monitor<P, S, N, C>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<u64, MonitorError>
where
    P: ProcessController,
    S: SessionProvider,
    N: NotifyAdapter,
    C: Clock,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut cycles = 0;
    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!(cycles, "shutdown requested");
                return Ok(cycles);
            }
            _ = ticker.tick() => {
                monitor.run_cycle().await?;
                cycles += 1;
            }
        }
    }
}

/// Resolves on the first SIGINT or SIGTERM.
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    Ok(async move {
        tokio::select! {
            _ = terminate.recv() => info!("received SIGTERM"),
            _ = interrupt.recv() => info!("received SIGINT"),
        }
    })
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
