// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help output lists every command.

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    let mut out = cli().args(&["--help"]).passes().stdout_has("Usage:");
    for command in ["submit", "status", "logs", "list", "delete", "templates", "render", "config"] {
        out = out.stdout_has(command);
    }
}

#[test]
fn no_command_prints_usage_and_fails() {
    cli().fails_with(2).stderr_has("Usage:");
}

#[test]
fn submit_help_lists_job_kinds() {
    cli().args(&["submit", "--help"]).passes().stdout_has("app").stdout_has("appset").stdout_has("infra");
}

#[test]
fn submit_app_help_lists_publish_flags() {
    cli()
        .args(&["submit", "app", "--help"])
        .passes()
        .stdout_has("--app-name")
        .stdout_has("--sync-policy")
        .stdout_has("--gitops-repo")
        .stdout_has("--save-manifest");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}
