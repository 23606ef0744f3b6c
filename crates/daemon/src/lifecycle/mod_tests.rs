// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;
use wd_core::FakeLiveness;

#[test]
fn acquire_writes_own_pid_and_release_removes_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("warden.pid");

    let lock = PidLock::acquire(&path, &FakeLiveness::new()).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.trim(), std::process::id().to_string());
    assert_eq!(lock.path(), path);

    lock.release();
    assert!(!path.exists());
}

#[test]
fn live_foreign_pid_refuses_and_keeps_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("warden.pid");
    std::fs::write(&path, "4242\n").unwrap();

    let err = PidLock::acquire(&path, &FakeLiveness::with_alive([4242])).unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyRunning(4242)));
    assert!(err.is_foreign_lock());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "4242\n");
}

#[test]
fn stale_pid_file_is_taken_over() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("warden.pid");
    std::fs::write(&path, "4242\n").unwrap();

    let lock = PidLock::acquire(&path, &FakeLiveness::new()).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), std::process::id().to_string());
    lock.release();
}

#[test]
fn garbage_pid_file_is_overwritten() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("warden.pid");
    std::fs::write(&path, "not a pid, and quite a bit longer than one\n").unwrap();

    let lock = PidLock::acquire(&path, &FakeLiveness::new()).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), format!("{}\n", std::process::id()));
    lock.release();
}

#[test]
fn held_lock_fails_without_touching_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("warden.pid");
    std::fs::write(&path, "12345").unwrap();

    // Simulate a running instance holding the lock
    let holder = OpenOptions::new().write(true).open(&path).unwrap();
    holder.lock_exclusive().unwrap();

    match PidLock::acquire(&path, &FakeLiveness::new()) {
        Err(LifecycleError::LockFailed(_)) => {}
        Err(e) => panic!("expected LockFailed, got: {e}"),
        Ok(_) => panic!("expected LockFailed, but acquire succeeded"),
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "12345");
}
