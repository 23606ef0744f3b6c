// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup rotation for files the supervisor is about to overwrite.

use std::fs;
use std::path::{Path, PathBuf};

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

/// Copy an unreadable file aside before the next write replaces it.
pub(crate) fn preserve_corrupt(path: &Path) {
    let target = rotate_bak_path(path);
    match fs::copy(path, &target) {
        Ok(_) => tracing::warn!(
            path = %path.display(),
            backup = %target.display(),
            "preserved unreadable file before overwrite"
        ),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to back up unreadable file"),
    }
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
