// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: WARDEN_STATE_DIR > XDG_STATE_HOME/warden > ~/.local/state/warden
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Some(dir) = non_empty("WARDEN_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("warden"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/warden"))
}

/// Poll interval override, in the duration grammar (`30s`, `5m`, `1h`)
pub fn poll_interval() -> Option<String> {
    non_empty("WARDEN_POLL_INTERVAL")
}

/// Stale threshold override
pub fn stale_threshold() -> Option<String> {
    non_empty("WARDEN_STALE_THRESHOLD")
}

pub fn telegram_token() -> Option<String> {
    non_empty("WARDEN_TELEGRAM_TOKEN")
}

pub fn telegram_chat_id() -> Option<String> {
    non_empty("WARDEN_TELEGRAM_CHAT_ID")
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
