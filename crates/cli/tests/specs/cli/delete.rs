// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd delete` argument checks happen before any cluster access.

use crate::prelude::*;

#[test]
fn nothing_selected_is_rejected() {
    cli().args(&["delete"]).fails_with(2).stderr_has("--all");
}

#[test]
fn bulk_delete_requires_confirmation() {
    cli().args(&["delete", "-l", "team=payments"]).fails_with(2).stderr_has("--yes");
    cli().args(&["delete", "--all"]).fails_with(2).stderr_has("--yes");
}

#[test]
fn name_and_all_are_exclusive() {
    cli().args(&["delete", "wf-abc12", "--all"]).fails_with(2);
}

#[test]
fn malformed_label_is_a_usage_error() {
    cli().args(&["delete", "-l", "team", "--yes"]).fails_with(2).stderr_has("key=value");
}
