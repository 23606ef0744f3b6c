// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The notification channel chosen from configuration.

use async_trait::async_trait;
use wd_adapters::{DesktopNotifyAdapter, Markup, NotifyAdapter, NotifyError, TelegramNotifyAdapter};

use crate::config::TelegramConfig;

/// Chat bot when credentials are configured, desktop otherwise.
#[derive(Clone)]
pub enum Channel {
    Telegram(TelegramNotifyAdapter),
    Desktop(DesktopNotifyAdapter),
}

impl Channel {
    pub fn from_config(telegram: Option<&TelegramConfig>) -> Self {
        match telegram {
            Some(t) => Self::Telegram(TelegramNotifyAdapter::new(&t.bot_token, &t.chat_id)),
            None => Self::Desktop(DesktopNotifyAdapter::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Telegram(_) => "telegram",
            Self::Desktop(_) => "desktop",
        }
    }
}

#[async_trait]
impl NotifyAdapter for Channel {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        match self {
            Self::Telegram(a) => a.notify(title, message).await,
            Self::Desktop(a) => a.notify(title, message).await,
        }
    }

    fn markup(&self) -> Markup {
        match self {
            Self::Telegram(a) => a.markup(),
            Self::Desktop(a) => a.markup(),
        }
    }

    fn max_len(&self) -> usize {
        match self {
            Self::Telegram(a) => a.max_len(),
            Self::Desktop(a) => a.max_len(),
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
