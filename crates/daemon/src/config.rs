// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: fixed paths under the state directory plus an
//! optional `config.toml`, with a few environment overrides on top.
//!
//! ```toml
//! poll_interval = "15m"
//! framework_root = "~/agent-framework"
//! agent_command = ["npm", "run", "orchestrate"]
//!
//! [telegram]
//! bot_token = "123:abc"
//! chat_id = "-100200300"
//!
//! [memory]
//! enabled = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use wd_core::parse_duration;
use wd_engine::EngineConfig;

use crate::env;
use crate::lifecycle::LifecycleError;

pub const CONFIG_FILE: &str = "config.toml";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_SNAPSHOT_FILE: &str = ".orchestrator/state.json";
const DEFAULT_AGENT_LOG: &str = ".orchestrator/agent.log";
const DEFAULT_SESSION_COMMAND: &str = "claude";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid duration for {key}: {message}")]
    Duration { key: &'static str, message: String },

    #[error("agent_command must not be empty")]
    EmptyAgentCommand,
}

/// `config.toml` as written by the user. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    poll_interval: Option<String>,
    stale_threshold: Option<String>,
    max_restarts: Option<u32>,
    framework_root: Option<PathBuf>,
    framework_dirs: Option<Vec<String>>,
    snapshot_file: Option<PathBuf>,
    agent_command: Option<Vec<String>>,
    agent_log: Option<PathBuf>,
    session_command: Option<String>,
    session_timeout: Option<String>,
    validate_commands: Option<Vec<String>>,
    project_validate_commands: Option<Vec<String>>,
    validate_timeout: Option<String>,
    fix_line_budget: Option<u32>,
    notify_timeout: Option<String>,
    telegram: TelegramSection,
    memory: MemorySection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TelegramSection {
    bot_token: Option<String>,
    chat_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MemorySection {
    enabled: bool,
}

#[derive(Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig").field("chat_id", &self.chat_id).finish_non_exhaustive()
    }
}

/// Resolved daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/warden)
    pub state_dir: PathBuf,
    /// Shared project registry
    pub registry_path: PathBuf,
    /// Lock/PID file
    pub lock_path: PathBuf,
    /// Append-only action log
    pub audit_path: PathBuf,
    /// Long-term fix memory (JSONL)
    pub memory_path: PathBuf,
    /// Rolling daemon logs
    pub log_dir: PathBuf,
    pub poll_interval: Duration,
    /// Agent state snapshot, relative to each project root
    pub snapshot_file: PathBuf,
    /// Command that starts an agent inside a project directory
    pub agent_command: Vec<String>,
    /// Agent stdout/stderr, relative to each project root
    pub agent_log: PathBuf,
    /// Program used for diagnosis and fix sessions
    pub session_command: String,
    /// Chat bot credentials; desktop notifications when unset
    pub telegram: Option<TelegramConfig>,
    pub memory_enabled: bool,
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration for the state directory resolved from the
    /// environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self::load_from(state_dir)?)
    }

    /// Load `config.toml` from `state_dir` (if present) and apply
    /// environment overrides.
    pub fn load_from(state_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let state_dir = state_dir.into();
        let path = state_dir.join(CONFIG_FILE);
        let file = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|source| ConfigError::Parse { path: path.clone(), source })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        Self::resolve(state_dir, file)
    }

    fn resolve(state_dir: PathBuf, file: FileConfig) -> Result<Self, ConfigError> {
        let defaults = EngineConfig::default();

        let poll_interval = env::poll_interval().or(file.poll_interval);
        let stale_threshold = env::stale_threshold().or(file.stale_threshold);
        let engine = EngineConfig {
            stale_threshold: duration("stale_threshold", stale_threshold, defaults.stale_threshold)?,
            max_restarts: file.max_restarts.unwrap_or(defaults.max_restarts),
            framework_root: file.framework_root.map(|p| expand_home(&p)),
            framework_dirs: file.framework_dirs.unwrap_or(defaults.framework_dirs),
            validate_commands: file.validate_commands.unwrap_or(defaults.validate_commands),
            project_validate_commands: file
                .project_validate_commands
                .unwrap_or(defaults.project_validate_commands),
            validate_timeout: duration("validate_timeout", file.validate_timeout, defaults.validate_timeout)?,
            session_timeout: duration("session_timeout", file.session_timeout, defaults.session_timeout)?,
            fix_line_budget: file.fix_line_budget.unwrap_or(defaults.fix_line_budget),
            notify_timeout: duration("notify_timeout", file.notify_timeout, defaults.notify_timeout)?,
        };

        let agent_command = file
            .agent_command
            .unwrap_or_else(|| ["npm", "run", "orchestrate"].map(String::from).to_vec());
        if agent_command.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(ConfigError::EmptyAgentCommand);
        }

        let token = env::telegram_token().or(file.telegram.bot_token);
        let chat_id = env::telegram_chat_id().or(file.telegram.chat_id);
        let telegram = match (token, chat_id) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!("telegram needs both bot_token and chat_id; using desktop notifications");
                None
            }
            (None, None) => None,
        };

        Ok(Self {
            registry_path: state_dir.join("registry.json"),
            lock_path: state_dir.join("warden.pid"),
            audit_path: state_dir.join("audit.log"),
            memory_path: state_dir.join("memory.jsonl"),
            log_dir: state_dir.join("logs"),
            poll_interval: duration("poll_interval", poll_interval, DEFAULT_POLL_INTERVAL)?,
            snapshot_file: file.snapshot_file.unwrap_or_else(|| DEFAULT_SNAPSHOT_FILE.into()),
            agent_command,
            agent_log: file.agent_log.unwrap_or_else(|| DEFAULT_AGENT_LOG.into()),
            session_command: file
                .session_command
                .unwrap_or_else(|| DEFAULT_SESSION_COMMAND.to_string()),
            telegram,
            memory_enabled: file.memory.enabled,
            engine,
            state_dir,
        })
    }
}

fn duration(key: &'static str, value: Option<String>, default: Duration) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match parse_duration(&value) {
        Ok(d) if d.is_zero() => Err(ConfigError::Duration { key, message: "must be positive".into() }),
        Ok(d) => Ok(d),
        Err(message) => Err(ConfigError::Duration { key, message }),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
