// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound notification channels for escalations and recovery reports.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Telegram's per-message character limit.
pub const TELEGRAM_MAX_LEN: usize = 4096;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Errors from notify operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("channel rejected message: {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Markup dialect a channel renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Plain,
    /// Telegram MarkdownV2: reserved characters in dynamic text must be escaped
    MarkdownV2,
}

/// Adapter for sending notifications
#[async_trait]
pub trait NotifyAdapter: Send + Sync + 'static {
    /// Send a notification with a title and message body. Both are already
    /// rendered in this adapter's [`Markup`].
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;

    fn markup(&self) -> Markup {
        Markup::Plain
    }

    /// Largest body this channel accepts in one message, in characters.
    fn max_len(&self) -> usize {
        TELEGRAM_MAX_LEN
    }
}

/// Telegram bot API adapter.
#[derive(Clone)]
pub struct TelegramNotifyAdapter {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifyAdapter {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: TELEGRAM_API.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Point at a different bot API host.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base.trim_end_matches('/'), self.token)
    }
}

impl std::fmt::Debug for TelegramNotifyAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifyAdapter")
            .field("api_base", &self.api_base)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NotifyAdapter for TelegramNotifyAdapter {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let text = if title.is_empty() {
            message.to_string()
        } else {
            format!("*{}*\n\n{}", title, message)
        };
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "MarkdownV2",
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(self.send_url())
            .timeout(Duration::from_secs(30))
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::SendFailed(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status: status.as_u16(), body });
        }
        tracing::info!(chat_id = %self.chat_id, "telegram notification sent");
        Ok(())
    }

    fn markup(&self) -> Markup {
        Markup::MarkdownV2
    }
}

/// Desktop notification adapter using notify-rust.
///
/// On macOS, `notify-rust` uses `mac-notification-sys`, whose first call runs
/// an AppleScript bundle lookup that blocks forever in a daemon without
/// Automation permissions. The bundle identifier is pre-set at construction
/// to skip that lookup.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopNotifyAdapter;

impl DesktopNotifyAdapter {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }
}

#[async_trait]
impl NotifyAdapter for DesktopNotifyAdapter {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        let title = title.to_string();
        let message = message.to_string();
        // show() is synchronous; keep it off the async runtime.
        tokio::task::spawn_blocking(move || {
            match notify_rust::Notification::new().summary(&title).body(&message).show() {
                Ok(_) => tracing::info!(%title, "desktop notification sent"),
                Err(e) => tracing::warn!(%title, error = %e, "desktop notification failed"),
            }
        });
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{Markup, NotifyAdapter, NotifyError, TELEGRAM_MAX_LEN};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    /// Recorded notification
    #[derive(Debug, Clone)]
    pub struct NotifyCall {
        pub title: String,
        pub message: String,
    }

    struct FakeNotifyState {
        calls: Vec<NotifyCall>,
        fail: bool,
        delay: Option<Duration>,
    }

    /// Fake notification adapter for testing
    #[derive(Clone)]
    pub struct FakeNotifyAdapter {
        inner: Arc<Mutex<FakeNotifyState>>,
        markup: Markup,
        max_len: usize,
    }

    impl Default for FakeNotifyAdapter {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeNotifyState {
                    calls: Vec::new(),
                    fail: false,
                    delay: None,
                })),
                markup: Markup::Plain,
                max_len: TELEGRAM_MAX_LEN,
            }
        }
    }

    impl FakeNotifyAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_markup(mut self, markup: Markup) -> Self {
            self.markup = markup;
            self
        }

        pub fn with_max_len(mut self, max_len: usize) -> Self {
            self.max_len = max_len;
            self
        }

        /// Make every send fail after recording it.
        pub fn set_failing(&self, fail: bool) {
            self.inner.lock().fail = fail;
        }

        /// Make every send stall for `delay` before completing.
        pub fn set_delay(&self, delay: Duration) {
            self.inner.lock().delay = Some(delay);
        }

        /// Get all recorded notifications
        pub fn calls(&self) -> Vec<NotifyCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl NotifyAdapter for FakeNotifyAdapter {
        async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
            let (fail, delay) = {
                let mut inner = self.inner.lock();
                inner
                    .calls
                    .push(NotifyCall { title: title.to_string(), message: message.to_string() });
                (inner.fail, inner.delay)
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(NotifyError::SendFailed("fake failure".into()));
            }
            Ok(())
        }

        fn markup(&self) -> Markup {
            self.markup
        }

        fn max_len(&self) -> usize {
            self.max_len
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
