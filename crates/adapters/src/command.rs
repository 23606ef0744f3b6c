// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded shell commands: fix validation and version-control reverts.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

/// Keep this many trailing bytes of command output for reports.
const OUTPUT_TAIL_BYTES: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Tail of combined stdout/stderr, or the reason the command never ran
    pub output: String,
}

impl CommandOutcome {
    fn not_run(command: &str, reason: String) -> Self {
        Self { command: command.to_string(), success: false, exit_code: None, output: reason }
    }
}

/// Run `command_line` through `bash -c` in `cwd`, killed after `timeout`.
pub async fn run_shell(cwd: &Path, command_line: &str, timeout: Duration) -> CommandOutcome {
    let mut cmd = tokio::process::Command::new("bash");
    cmd.arg("-c")
        .arg(command_line)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return CommandOutcome::not_run(command_line, format!("failed to run: {}", e)),
        Err(_) => {
            tracing::warn!(command = command_line, ?timeout, "command timed out");
            return CommandOutcome::not_run(
                command_line,
                format!("timed out after {}s", timeout.as_secs()),
            );
        }
    };

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    CommandOutcome {
        command: command_line.to_string(),
        success: output.status.success(),
        exit_code: output.status.code(),
        output: tail(&combined, OUTPUT_TAIL_BYTES),
    }
}

/// Tracked files under `repo` that differ from `HEAD`, relative to `repo`.
pub async fn git_modified_files(repo: &Path) -> Result<BTreeSet<String>, String> {
    let outcome = git(repo, &["diff", "--name-only", "--relative", "HEAD"]).await;
    if !outcome.success {
        return Err(outcome.output);
    }
    Ok(outcome.output.lines().filter(|l| !l.is_empty()).map(str::to_string).collect())
}

/// Restore `files` (relative to `repo`) to their committed content.
pub async fn git_restore_files(repo: &Path, files: &[String]) -> CommandOutcome {
    let mut args = vec!["checkout", "HEAD", "--"];
    args.extend(files.iter().map(String::as_str));
    git(repo, &args).await
}

async fn git(repo: &Path, args: &[&str]) -> CommandOutcome {
    let label = format!("git {}", args.join(" "));
    let mut cmd = tokio::process::Command::new("git");
    cmd.args(args)
        .current_dir(repo)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    match cmd.output().await {
        Ok(output) => {
            let stream = if output.status.success() { &output.stdout } else { &output.stderr };
            CommandOutcome {
                success: output.status.success(),
                exit_code: output.status.code(),
                output: String::from_utf8_lossy(stream).trim().to_string(),
                command: label,
            }
        }
        Err(e) => CommandOutcome::not_run(&label, format!("failed to run git: {}", e)),
    }
}

fn tail(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].to_string()
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
