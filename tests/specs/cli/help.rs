// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help output specs

use crate::prelude::*;

#[test]
fn warden_help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("start")
        .stdout_has("run-once")
        .stdout_has("status")
        .stdout_has("prune");
}

#[test]
fn warden_without_command_shows_usage_and_fails() {
    cli().fails().stderr_has("Usage:");
}

#[test]
fn warden_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}

#[test]
fn unknown_command_fails() {
    cli().args(&["restart-everything"]).fails().stderr_has("unrecognized subcommand");
}
