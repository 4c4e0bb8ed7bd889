// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd templates show` works offline.

use crate::prelude::*;

#[test]
fn builtin_template_is_printed() {
    cli()
        .args(&["templates", "show", "create-argocd-application"])
        .passes()
        .stdout_has("kind: WorkflowTemplate")
        .stdout_has("name: create-argocd-application")
        .stdout_has("namespace: argo")
        .stdout_has("apply-application");
}

#[test]
fn namespace_flag_is_applied() {
    cli()
        .args(&["-n", "workflows", "templates", "show", "provision-infrastructure"])
        .passes()
        .stdout_has("namespace: workflows");
}

#[test]
fn unknown_template_is_a_validation_failure() {
    cli().args(&["templates", "show", "no-such-template"]).fails_with(2).stderr_has("no-such-template");
}
