// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use tempfile::{tempdir, TempDir};
use wd_adapters::{FakeNotifyAdapter, FakeProcessController, FakeSession};
use wd_core::{FakeClock, FakeLiveness, ProjectRecord, Registry};
use wd_engine::EngineConfig;

type FakeMonitor = Monitor<FakeProcessController, FakeSession, FakeNotifyAdapter, FakeClock>;

fn fake_monitor(state: &TempDir, process: &FakeProcessController, liveness: &FakeLiveness) -> FakeMonitor {
    let deps = MonitorDeps {
        process: Arc::new(process.clone()),
        session: Arc::new(FakeSession::new()),
        notifier: FakeNotifyAdapter::new(),
        liveness: Arc::new(liveness.clone()) as Arc<dyn Liveness>,
        memory: None,
        registry: RegistryStore::new(state.path().join("registry.json")),
        audit: AuditLog::new(state.path().join("audit.log")),
        snapshots: SnapshotReader::new(".orchestrator/state.json"),
    };
    Monitor::new(deps, EngineConfig::default(), FakeClock::new())
}

#[tokio::test(start_paused = true)]
async fn loop_ticks_every_interval_until_shutdown() {
    let state = tempdir().unwrap();
    let liveness = FakeLiveness::new();
    let process = FakeProcessController::new(liveness.clone());
    let mut monitor = fake_monitor(&state, &process, &liveness);

    let interval = Duration::from_secs(60);
    let shutdown = tokio::time::sleep(Duration::from_secs(150));
    let cycles = run_loop(&mut monitor, interval, shutdown).await.unwrap();

    // Ticks at 0s, 60s and 120s
    assert_eq!(cycles, 3);
}

#[tokio::test(start_paused = true)]
async fn restarted_agent_is_not_restarted_again() {
    let state = tempdir().unwrap();
    let projects = tempdir().unwrap();
    let liveness = FakeLiveness::new();
    let process = FakeProcessController::new(liveness.clone());
    let mut monitor = fake_monitor(&state, &process, &liveness);

    let mut registry = Registry::default();
    registry.insert(ProjectRecord::builder().name("alpha").path(projects.path()).build());
    let store = RegistryStore::new(state.path().join("registry.json"));
    store.write(&mut registry, FakeClock::new().now()).unwrap();

    let shutdown = tokio::time::sleep(Duration::from_secs(150));
    run_loop(&mut monitor, Duration::from_secs(60), shutdown).await.unwrap();

    // The first cycle restarts it; the fresh heartbeat keeps later cycles quiet
    assert_eq!(process.spawned_paths().len(), 1);
    assert!(store.read().get("alpha").unwrap().agent_pid.is_some());
}

#[tokio::test]
async fn immediate_shutdown_runs_no_cycle() {
    let state = tempdir().unwrap();
    let liveness = FakeLiveness::new();
    let process = FakeProcessController::new(liveness.clone());
    let mut monitor = fake_monitor(&state, &process, &liveness);

    let cycles = run_loop(&mut monitor, Duration::from_secs(60), std::future::ready(())).await.unwrap();
    assert_eq!(cycles, 0);
}

fn config_in(dir: &TempDir) -> Config {
    for key in ["WARDEN_POLL_INTERVAL", "WARDEN_STALE_THRESHOLD", "WARDEN_TELEGRAM_TOKEN", "WARDEN_TELEGRAM_CHAT_ID"] {
        std::env::remove_var(key);
    }
    Config::load_from(dir.path()).unwrap()
}

#[tokio::test]
#[serial]
async fn run_once_on_empty_state_releases_lock() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir);

    let report = run_once(&config).await.unwrap();
    assert_eq!(report.checked, 0);
    assert!(!config.lock_path.exists());
    assert!(!config.registry_path.exists());
}

#[tokio::test]
#[serial]
async fn run_once_refuses_when_another_instance_is_live() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir);
    // PID 1 always exists
    std::fs::write(&config.lock_path, "1\n").unwrap();

    let err = run_once(&config).await.unwrap_err();
    let lifecycle = err.downcast_ref::<LifecycleError>().unwrap();
    assert!(matches!(lifecycle, LifecycleError::AlreadyRunning(1)));
    assert_eq!(std::fs::read_to_string(&config.lock_path).unwrap(), "1\n");
}
