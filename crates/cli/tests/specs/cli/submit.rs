// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd submit` validates its input before reaching for a cluster.

use crate::prelude::*;

#[test]
fn missing_app_name_fails_before_connecting() {
    cli()
        .env("KUBECONFIG", "/nonexistent/kubeconfig")
        .args(&["submit", "app", "--repo-url", "https://charts.bitnami.com/bitnami", "--chart-path", "nginx"])
        .fails_with(2)
        .stderr_has("missing required parameter: app_name");
}

#[test]
fn invalid_appset_fails_before_connecting() {
    cli()
        .env("KUBECONFIG", "/nonexistent/kubeconfig")
        .args(&[
            "submit",
            "appset",
            "--appset-name",
            "guestbook",
            "--repo-url",
            "https://github.com/argoproj/argocd-example-apps.git",
            "--chart-path",
            "helm-guestbook",
        ])
        .fails_with(2)
        .stderr_has("environments");
}

#[test]
fn invalid_infra_namespace_fails_before_connecting() {
    cli()
        .env("KUBECONFIG", "/nonexistent/kubeconfig")
        .args(&["submit", "infra", "Team_A"])
        .fails_with(2)
        .stderr_has("namespace");
}
