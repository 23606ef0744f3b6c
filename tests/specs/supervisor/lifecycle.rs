// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `warden start` lifecycle specs: lock, signal handling, cleanup.

use std::process::Stdio;

use crate::prelude::*;

fn send_signal(pid: u32, signal: &str) {
    let status = std::process::Command::new("kill").args([signal, &pid.to_string()]).status().unwrap();
    assert!(status.success());
}

#[test]
fn start_holds_lock_and_exits_cleanly_on_sigterm() {
    let fleet = Fleet::new();
    fleet.config("agent_command = [\"true\"]\npoll_interval = \"1h\"\n");

    let mut child = fleet.warden_process().arg("start").stdout(Stdio::null()).stderr(Stdio::null()).spawn().unwrap();
    let pid_path = fleet.pid_path();
    let expected = child.id().to_string();
    let locked = wait_for(SPEC_WAIT_MAX_MS, || {
        std::fs::read_to_string(&pid_path).is_ok_and(|s| s.trim() == expected)
    });
    assert!(locked, "warden should write its PID");

    // A second instance is refused while the first runs
    fleet.warden().args(&["run-once"]).fails();

    send_signal(child.id(), "-TERM");
    let exited = wait_for(SPEC_WAIT_MAX_MS, || child.try_wait().unwrap().is_some());
    if !exited {
        let _ = child.kill();
        panic!("warden did not exit on SIGTERM");
    }
    assert!(child.wait().unwrap().success());
    assert!(!pid_path.exists(), "PID file removed on shutdown");
}

#[test]
fn start_writes_daily_log_file() {
    let fleet = Fleet::new();
    fleet.config("agent_command = [\"true\"]\npoll_interval = \"1h\"\n");

    let mut child = fleet.warden_process().arg("start").stdout(Stdio::null()).stderr(Stdio::null()).spawn().unwrap();
    let logs = fleet.state_dir().join("logs");
    let logged = wait_for(SPEC_WAIT_MAX_MS, || {
        std::fs::read_dir(&logs)
            .map(|entries| entries.flatten().any(|e| e.file_name().to_string_lossy().starts_with("warden.log")))
            .unwrap_or(false)
    });

    send_signal(child.id(), "-INT");
    let exited = wait_for(SPEC_WAIT_MAX_MS, || child.try_wait().unwrap().is_some());
    if !exited {
        let _ = child.kill();
    }
    assert!(logged, "log file created under logs/");
    assert!(exited, "warden exits on SIGINT");
}
