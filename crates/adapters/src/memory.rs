// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Long-term memory of past fixes, recalled by similarity before diagnosis.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("memory encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A fix worth remembering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixMemory {
    pub project: String,
    pub phase: Option<u32>,
    pub error_category: String,
    pub file_path: Option<String>,
    pub root_cause: String,
    pub outcome: String,
    pub timestamp: DateTime<Utc>,
}

impl FixMemory {
    /// Text used for similarity matching.
    fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.error_category,
            self.root_cause,
            self.file_path.as_deref().unwrap_or("")
        )
    }

    /// One-line summary for prompts.
    pub fn summary(&self) -> String {
        let phase = self.phase.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        format!(
            "[{}] phase {} ({}): {} -> {} in {}",
            self.project,
            phase,
            self.error_category,
            self.root_cause,
            self.outcome,
            self.file_path.as_deref().unwrap_or("unknown file")
        )
    }
}

#[async_trait]
pub trait MemoryProvider: Send + Sync + 'static {
    async fn store(&self, memory: FixMemory) -> Result<(), MemoryError>;

    /// Most similar memories first, at most `limit`, optionally restricted to
    /// one project.
    async fn search(
        &self,
        query: &str,
        project: Option<&str>,
        limit: usize,
    ) -> Result<Vec<FixMemory>, MemoryError>;
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard overlap of lowercase word tokens.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (tokens(a), tokens(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(&b).count() as f64;
    let union = a.union(&b).count() as f64;
    shared / union
}

fn rank(memories: Vec<FixMemory>, query: &str, project: Option<&str>, limit: usize) -> Vec<FixMemory> {
    let mut scored: Vec<(f64, FixMemory)> = memories
        .into_iter()
        .filter(|m| project.is_none_or(|p| m.project == p))
        .map(|m| (similarity(query, &m.search_text()), m))
        .filter(|(score, _)| *score > 0.0)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.timestamp.cmp(&a.1.timestamp)));
    scored.into_iter().take(limit).map(|(_, m)| m).collect()
}

/// JSON-lines file of fix memories.
#[derive(Debug, Clone)]
pub struct FileMemory {
    path: PathBuf,
}

impl FileMemory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<FixMemory>, MemoryError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(MemoryError::Io { path: self.path.clone(), source }),
        };
        // Skip torn or foreign lines rather than losing the whole store.
        Ok(content.lines().filter_map(|line| serde_json::from_str(line).ok()).collect())
    }
}

#[async_trait]
impl MemoryProvider for FileMemory {
    async fn store(&self, memory: FixMemory) -> Result<(), MemoryError> {
        let io_err = |source: std::io::Error| MemoryError::Io { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut line = serde_json::to_string(&memory)?;
        line.push('\n');
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).map_err(io_err)?;
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        project: Option<&str>,
        limit: usize,
    ) -> Result<Vec<FixMemory>, MemoryError> {
        Ok(rank(self.load()?, query, project, limit))
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{rank, FixMemory, MemoryError, MemoryProvider};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// In-memory provider; can be switched to fail every call.
    #[derive(Clone, Default)]
    pub struct InMemoryMemory {
        inner: Arc<Mutex<(Vec<FixMemory>, bool)>>,
    }

    impl InMemoryMemory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_failing(&self, fail: bool) {
            self.inner.lock().1 = fail;
        }

        pub fn stored(&self) -> Vec<FixMemory> {
            self.inner.lock().0.clone()
        }

        fn check(&self) -> Result<(), MemoryError> {
            if self.inner.lock().1 {
                return Err(MemoryError::Io {
                    path: "memory".into(),
                    source: std::io::Error::other("fake failure"),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MemoryProvider for InMemoryMemory {
        async fn store(&self, memory: FixMemory) -> Result<(), MemoryError> {
            self.check()?;
            self.inner.lock().0.push(memory);
            Ok(())
        }

        async fn search(
            &self,
            query: &str,
            project: Option<&str>,
            limit: usize,
        ) -> Result<Vec<FixMemory>, MemoryError> {
            self.check()?;
            Ok(rank(self.stored(), query, project, limit))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::InMemoryMemory;

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
