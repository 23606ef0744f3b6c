// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup.
//!
//! Everything goes to stderr, filtered by `RUST_LOG` (default `info`). The
//! persistent loop also writes a daily-rolling file under the state
//! directory's `logs/`.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub const LOG_FILE_PREFIX: &str = "warden.log";

/// Flushes the file writer when dropped; hold it for the process lifetime.
#[must_use]
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(log_dir: Option<&Path>) -> LogGuard {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match log_dir.map(|dir| std::fs::create_dir_all(dir).map(|()| dir)) {
        Some(Ok(dir)) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("warden: cannot create log directory: {}", e);
            (None, None)
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(env_filter())
        .try_init();
    LogGuard { _file_guard: guard }
}
