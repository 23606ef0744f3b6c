// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-facing notifications: formatting, channel escaping, splitting and
//! bounded delivery.

use std::time::Duration;
use wd_adapters::{Markup, NotifyAdapter};
use wd_core::{DiagnosticResult, HotFixResult, RecoveryAction};

/// Characters Telegram MarkdownV2 reserves outside entities.
const MARKDOWN_V2_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

wd_core::simple_display! {
    Severity {
        Info => "INFO",
        Warning => "WARNING",
        Critical => "CRITICAL",
    }
}

/// A message before it is rendered for a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub severity: Severity,
    pub headline: String,
    pub fields: Vec<(String, String)>,
}

impl Notification {
    pub fn new(severity: Severity, headline: impl Into<String>) -> Self {
        Self { severity, headline: headline.into(), fields: Vec::new() }
    }

    pub fn field(mut self, label: &str, value: impl Into<String>) -> Self {
        self.fields.push((label.to_string(), value.into()));
        self
    }

    /// Report for a recovery action: project, phase, stall, details, action
    /// and retry count.
    pub fn for_action(severity: Severity, action: &RecoveryAction, outcome: &str) -> Self {
        let c = &action.classification;
        let phase = c.phase.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
        Self::new(severity, format!("{} on {}", action.kind, c.project))
            .field("Project", c.project.clone())
            .field("Phase", phase)
            .field("Stall", format!("{} ({} confidence)", c.stall_type, c.confidence))
            .field("Details", c.details.clone())
            .field("Action", action.kind.to_string())
            .field("Retries", action.retry_count.to_string())
            .field("Outcome", outcome)
    }

    /// Attach what the diagnose/fix pipeline found.
    pub fn with_diagnosis(mut self, diagnosis: &DiagnosticResult) -> Self {
        self = self
            .field(
                "Diagnosis",
                format!("{} ({} confidence)", diagnosis.bug_location, diagnosis.confidence),
            )
            .field("Root cause", diagnosis.root_cause.clone());
        if let Some(ref file) = diagnosis.file_path {
            self = self.field("File", file.clone());
        }
        if diagnosis.multi_project_pattern {
            self = self.field("Affected", diagnosis.affected_projects.join(", "));
        }
        self
    }

    pub fn with_fix(self, fix: &HotFixResult) -> Self {
        self.field(
            "Fix",
            format!(
                "success={} validated={} reverted={} lines={}: {}",
                fix.success,
                fix.validation_passed,
                fix.reverted_on_failure,
                fix.lines_changed,
                fix.details
            ),
        )
    }

    pub fn title(&self) -> String {
        format!("[{}] Warden: {}", self.severity, self.headline)
    }

    /// Render title and body for a channel. Dynamic text is escaped; the
    /// bold labels are markup.
    pub fn render(&self, markup: Markup) -> (String, String) {
        let esc = |s: &str| match markup {
            Markup::Plain => s.to_string(),
            Markup::MarkdownV2 => escape_markdown_v2(s),
        };
        let body = self
            .fields
            .iter()
            .map(|(label, value)| match markup {
                Markup::Plain => format!("{}: {}", label, value),
                Markup::MarkdownV2 => format!("*{}:* {}", esc(label), esc(value)),
            })
            .collect::<Vec<_>>()
            .join("\n");
        (esc(&self.title()), body)
    }
}

/// Escape every MarkdownV2 reserved character with a backslash.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        if MARKDOWN_V2_RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Split `text` into chunks of at most `max` characters, breaking at line
/// boundaries. A single line longer than `max` is hard-split, never between
/// an escaping backslash and the character it escapes.
pub fn split_message(text: &str, max: usize) -> Vec<String> {
    let max = max.max(2);
    if text.chars().count() <= max {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { current_len + 1 + line_len };
        if needed <= max {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            current_len = needed;
            continue;
        }
        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len <= max {
            current.push_str(line);
            current_len = line_len;
        } else {
            chunks.extend(hard_split(line, max));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn hard_split(line: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let mut end = (start + max).min(chars.len());
        if end < chars.len() && ends_with_dangling_escape(&chars[start..end]) {
            end -= 1;
        }
        pieces.push(chars[start..end].iter().collect());
        start = end;
    }
    pieces
}

/// An odd run of trailing backslashes escapes the next character.
fn ends_with_dangling_escape(chars: &[char]) -> bool {
    let run = chars.iter().rev().take_while(|c| **c == '\\').count();
    run % 2 == 1 && run < chars.len()
}

/// Sends notifications through one channel, never failing the caller.
pub struct Notifier<N: NotifyAdapter> {
    adapter: N,
    timeout: Duration,
}

impl<N: NotifyAdapter> Notifier<N> {
    pub fn new(adapter: N, timeout: Duration) -> Self {
        Self { adapter, timeout }
    }

    pub fn adapter(&self) -> &N {
        &self.adapter
    }

    /// Deliver a notification, split across messages when it exceeds the
    /// channel limit. Returns whether every part was delivered.
    pub async fn send(&self, notification: &Notification) -> bool {
        let markup = self.adapter.markup();
        let (title, body) = notification.render(markup);
        // Leave room for the title and a part counter like " (2/3)"
        let overhead = title.chars().count() + 16;
        let budget = self.adapter.max_len().saturating_sub(overhead).max(64);
        let parts = split_message(&body, budget);
        let total = parts.len();

        let mut delivered = true;
        for (i, part) in parts.iter().enumerate() {
            let part_title = if total > 1 {
                let counter = format!(" ({}/{})", i + 1, total);
                match markup {
                    Markup::Plain => format!("{}{}", title, counter),
                    Markup::MarkdownV2 => format!("{}{}", title, escape_markdown_v2(&counter)),
                }
            } else {
                title.clone()
            };
            match tokio::time::timeout(self.timeout, self.adapter.notify(&part_title, part)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(title = %notification.title(), error = %e, "notification failed");
                    delivered = false;
                }
                Err(_) => {
                    tracing::warn!(title = %notification.title(), timeout = ?self.timeout, "notification timed out");
                    delivered = false;
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
