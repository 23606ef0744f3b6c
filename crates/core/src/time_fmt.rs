// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duration parsing for configuration and elapsed-time formatting for
//! human-facing details.

use std::time::Duration;

/// Parse a duration string like "30s", "5m", "1h" into a Duration
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str.parse().map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "ms" | "millis" | "milliseconds" => return Ok(Duration::from_millis(num)),
        "" | "s" | "sec" | "secs" | "seconds" => 1,
        "m" | "min" | "mins" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    let secs = num
        .checked_mul(multiplier)
        .ok_or_else(|| format!("duration out of range: {}", s))?;
    Ok(Duration::from_secs(secs))
}

/// Format elapsed milliseconds compactly: "45s", "20m", "3h12m", "2d4h".
pub fn format_elapsed_ms(ms: i64) -> String {
    if ms == i64::MAX {
        return "never".to_string();
    }
    let secs = ms.max(0) / 1000;
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        let (h, m) = (secs / 3600, (secs % 3600) / 60);
        if m == 0 {
            format!("{}h", h)
        } else {
            format!("{}h{}m", h, m)
        }
    } else {
        let (d, h) = (secs / 86400, (secs % 86400) / 3600);
        if h == 0 {
            format!("{}d", d)
        } else {
            format!("{}d{}h", d, h)
        }
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
