// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use tempfile::tempdir;

fn clear_env() {
    for key in [
        "WARDEN_POLL_INTERVAL",
        "WARDEN_STALE_THRESHOLD",
        "WARDEN_TELEGRAM_TOKEN",
        "WARDEN_TELEGRAM_CHAT_ID",
    ] {
        std::env::remove_var(key);
    }
}

fn load(toml: &str) -> Result<Config, ConfigError> {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE), toml).unwrap();
    Config::load_from(dir.path())
}

#[test]
#[serial]
fn missing_file_gives_defaults() {
    clear_env();
    let dir = tempdir().unwrap();
    let config = Config::load_from(dir.path()).unwrap();

    assert_eq!(config.poll_interval, Duration::from_secs(900));
    assert_eq!(config.engine.stale_threshold, Duration::from_secs(900));
    assert_eq!(config.engine.max_restarts, 3);
    assert_eq!(config.engine.fix_line_budget, 30);
    assert_eq!(config.engine.framework_root, None);
    assert_eq!(config.agent_command, vec!["npm", "run", "orchestrate"]);
    assert_eq!(config.snapshot_file, PathBuf::from(".orchestrator/state.json"));
    assert_eq!(config.session_command, "claude");
    assert_eq!(config.telegram, None);
    assert!(!config.memory_enabled);
    assert_eq!(config.registry_path, dir.path().join("registry.json"));
    assert_eq!(config.lock_path, dir.path().join("warden.pid"));
    assert_eq!(config.audit_path, dir.path().join("audit.log"));
}

#[test]
#[serial]
fn file_values_override_defaults() {
    clear_env();
    let config = load(
        r#"
poll_interval = "5m"
stale_threshold = "90s"
max_restarts = 5
framework_root = "/opt/framework"
framework_dirs = ["orchestrator"]
agent_command = ["node", "agent.js"]
validate_commands = ["make check"]
fix_line_budget = 10

[telegram]
bot_token = "123:abc"
chat_id = "42"

[memory]
enabled = true
"#,
    )
    .unwrap();

    assert_eq!(config.poll_interval, Duration::from_secs(300));
    assert_eq!(config.engine.stale_threshold, Duration::from_secs(90));
    assert_eq!(config.engine.max_restarts, 5);
    assert_eq!(config.engine.framework_root, Some(PathBuf::from("/opt/framework")));
    assert_eq!(config.engine.framework_dirs, vec!["orchestrator"]);
    assert_eq!(config.agent_command, vec!["node", "agent.js"]);
    assert_eq!(config.engine.validate_commands, vec!["make check"]);
    assert_eq!(config.engine.fix_line_budget, 10);
    assert_eq!(
        config.telegram,
        Some(TelegramConfig { bot_token: "123:abc".into(), chat_id: "42".into() })
    );
    assert!(config.memory_enabled);
}

#[test]
#[serial]
fn environment_overrides_file() {
    clear_env();
    std::env::set_var("WARDEN_POLL_INTERVAL", "30s");
    std::env::set_var("WARDEN_STALE_THRESHOLD", "2m");
    std::env::set_var("WARDEN_TELEGRAM_TOKEN", "env-token");
    std::env::set_var("WARDEN_TELEGRAM_CHAT_ID", "7");

    let config = load("poll_interval = \"1h\"\n[telegram]\nbot_token = \"file-token\"\n").unwrap();
    clear_env();

    assert_eq!(config.poll_interval, Duration::from_secs(30));
    assert_eq!(config.engine.stale_threshold, Duration::from_secs(120));
    assert_eq!(config.telegram.map(|t| t.bot_token), Some("env-token".to_string()));
}

#[test]
#[serial]
fn half_configured_telegram_falls_back_to_desktop() {
    clear_env();
    let config = load("[telegram]\nbot_token = \"123:abc\"\n").unwrap();
    assert_eq!(config.telegram, None);
}

#[yare::parameterized(
    bad_suffix = { "poll_interval = \"5 fortnights\"" },
    zero = { "stale_threshold = \"0s\"" },
    not_a_number = { "session_timeout = \"soon\"" },
)]
#[serial]
fn invalid_durations_are_rejected(toml: &str) {
    clear_env();
    assert!(matches!(load(toml), Err(ConfigError::Duration { .. })));
}

#[test]
#[serial]
fn unknown_keys_and_bad_syntax_are_parse_errors() {
    clear_env();
    assert!(matches!(load("pol_interval = \"5m\""), Err(ConfigError::Parse { .. })));
    assert!(matches!(load("poll_interval = "), Err(ConfigError::Parse { .. })));
}

#[test]
#[serial]
fn empty_agent_command_is_rejected() {
    clear_env();
    assert!(matches!(load("agent_command = []"), Err(ConfigError::EmptyAgentCommand)));
}

#[test]
fn telegram_debug_hides_token() {
    let t = TelegramConfig { bot_token: "secret-token".into(), chat_id: "42".into() };
    let debug = format!("{:?}", t);
    assert!(!debug.contains("secret-token"));
    assert!(debug.contains("42"));
}

#[test]
fn tilde_paths_expand_to_home() {
    let expanded = expand_home(Path::new("~/framework"));
    if let Some(home) = dirs::home_dir() {
        assert_eq!(expanded, home.join("framework"));
    }
    assert_eq!(expand_home(Path::new("/abs")), PathBuf::from("/abs"));
}
