// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversational AI sessions used for diagnosis and hot fixes.
//!
//! A session is a black box: a prompt goes in, free text comes out. Callers
//! pull structured results out of the transcript themselves.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;

/// Tools a diagnosis session may use: inspection only.
const READ_ONLY_TOOLS: &str = "Read,Grep,Glob,LS,Bash(git log:*),Bash(git diff:*),Bash(cat:*)";

/// Tools a fix session may use.
const WRITE_TOOLS: &str = "Read,Grep,Glob,LS,Edit,Write,Bash";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to start session: {0}")]
    Spawn(String),
    #[error("session timed out after {0:?}")]
    Timeout(Duration),
    #[error("session failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAccess {
    ReadOnly,
    Write,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    pub prompt: String,
    pub cwd: PathBuf,
    pub access: SessionAccess,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOutput {
    pub transcript: String,
    pub cost_usd: f64,
}

#[async_trait]
pub trait SessionProvider: Send + Sync + 'static {
    async fn run(&self, request: SessionRequest) -> Result<SessionOutput, SessionError>;
}

/// Envelope printed by `claude --output-format json`.
#[derive(Debug, Deserialize)]
struct CliEnvelope {
    #[serde(default)]
    result: String,
    #[serde(default)]
    total_cost_usd: f64,
    #[serde(default)]
    is_error: bool,
}

/// Runs sessions through the `claude` command-line client in print mode.
#[derive(Debug, Clone)]
pub struct ClaudeCliSession {
    program: String,
}

impl ClaudeCliSession {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    fn command(&self, request: &SessionRequest) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.arg("-p")
            .arg(&request.prompt)
            .args(["--output-format", "json"])
            .current_dir(&request.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        match request.access {
            SessionAccess::ReadOnly => {
                cmd.args(["--allowedTools", READ_ONLY_TOOLS]);
            }
            SessionAccess::Write => {
                cmd.args(["--allowedTools", WRITE_TOOLS, "--permission-mode", "acceptEdits"]);
            }
        }
        cmd
    }
}

impl Default for ClaudeCliSession {
    fn default() -> Self {
        Self::new("claude")
    }
}

#[async_trait]
impl SessionProvider for ClaudeCliSession {
    async fn run(&self, request: SessionRequest) -> Result<SessionOutput, SessionError> {
        tracing::info!(
            cwd = %request.cwd.display(),
            access = ?request.access,
            timeout_secs = request.timeout.as_secs(),
            "starting AI session"
        );
        let child = self
            .command(&request)
            .spawn()
            .map_err(|e| SessionError::Spawn(format!("{}: {}", self.program, e)))?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(request.timeout, child.wait_with_output())
            .await
            .map_err(|_| SessionError::Timeout(request.timeout))?
            .map_err(|e| SessionError::Failed(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SessionError::Failed(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let parsed = parse_cli_output(&stdout)?;
        tracing::info!(cost_usd = parsed.cost_usd, "AI session finished");
        Ok(parsed)
    }
}

/// Unwrap the CLI's JSON envelope; output that is not an envelope is taken
/// as the transcript itself.
fn parse_cli_output(stdout: &str) -> Result<SessionOutput, SessionError> {
    match serde_json::from_str::<CliEnvelope>(stdout.trim()) {
        Ok(env) if env.is_error => Err(SessionError::Failed(env.result)),
        Ok(env) => Ok(SessionOutput { transcript: env.result, cost_usd: env.total_cost_usd }),
        Err(_) => Ok(SessionOutput { transcript: stdout.to_string(), cost_usd: 0.0 }),
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{SessionError, SessionOutput, SessionProvider, SessionRequest};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct FakeSessionState {
        responses: VecDeque<Result<SessionOutput, SessionError>>,
        requests: Vec<SessionRequest>,
        edits: VecDeque<Vec<(PathBuf, String)>>,
    }

    /// Fake session: replays queued responses in order and records every
    /// request. An empty queue answers with a session failure.
    #[derive(Clone)]
    pub struct FakeSession {
        inner: Arc<Mutex<FakeSessionState>>,
    }

    impl Default for FakeSession {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeSessionState {
                    responses: VecDeque::new(),
                    requests: Vec::new(),
                    edits: VecDeque::new(),
                })),
            }
        }
    }

    impl FakeSession {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a successful transcript.
        pub fn respond(&self, transcript: impl Into<String>) -> &Self {
            self.push(Ok(SessionOutput { transcript: transcript.into(), cost_usd: 0.05 }), Vec::new())
        }

        /// Queue a transcript that also writes `content` to `path` when the
        /// session runs, standing in for an edit made by the session.
        pub fn respond_with_edit(
            &self,
            transcript: impl Into<String>,
            path: impl Into<PathBuf>,
            content: impl Into<String>,
        ) -> &Self {
            self.respond_with_edits(transcript, vec![(path.into(), content.into())])
        }

        /// Like [`respond_with_edit`](Self::respond_with_edit), touching
        /// several files.
        pub fn respond_with_edits(
            &self,
            transcript: impl Into<String>,
            edits: Vec<(PathBuf, String)>,
        ) -> &Self {
            self.push(Ok(SessionOutput { transcript: transcript.into(), cost_usd: 0.05 }), edits)
        }

        /// Queue a failure.
        pub fn fail(&self, error: SessionError) -> &Self {
            self.push(Err(error), Vec::new())
        }

        fn push(
            &self,
            response: Result<SessionOutput, SessionError>,
            edits: Vec<(PathBuf, String)>,
        ) -> &Self {
            let mut inner = self.inner.lock();
            inner.responses.push_back(response);
            inner.edits.push_back(edits);
            self
        }

        pub fn requests(&self) -> Vec<SessionRequest> {
            self.inner.lock().requests.clone()
        }
    }

    #[async_trait]
    impl SessionProvider for FakeSession {
        async fn run(&self, request: SessionRequest) -> Result<SessionOutput, SessionError> {
            let (response, edits) = {
                let mut inner = self.inner.lock();
                inner.requests.push(request);
                (inner.responses.pop_front(), inner.edits.pop_front().unwrap_or_default())
            };
            for (path, content) in edits {
                if let Some(parent) = path.parent() {
                    let _ = std::fs::create_dir_all(parent);
                }
                let _ = std::fs::write(&path, content);
            }
            response.unwrap_or_else(|| Err(SessionError::Failed("no scripted response".into())))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSession;

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
