// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd render` prints manifests without a cluster.

use crate::prelude::*;

const NGINX: &[&str] = &[
    "render",
    "app",
    "--app-name",
    "nginx-dev",
    "--repo-url",
    "https://charts.bitnami.com/bitnami",
    "--chart-path",
    "nginx",
    "--destination-namespace",
    "dev",
];

#[test]
fn application_manifest_is_printed() {
    cli()
        .args(NGINX)
        .passes()
        .stdout_has("apiVersion: argoproj.io/v1alpha1")
        .stdout_has("kind: Application")
        .stdout_has("name: nginx-dev")
        .stdout_has("chart: nginx")
        .stdout_has("CreateNamespace=true")
        .stdout_lacks("automated");
}

#[test]
fn rendering_twice_gives_identical_bytes() {
    let sandbox = Sandbox::new();
    let first = sandbox.flowcd().args(NGINX).passes().stdout;
    let second = sandbox.flowcd().args(NGINX).passes().stdout;
    similar_asserts::assert_eq!(first, second);
}

#[test]
fn json_output_is_the_same_document() {
    let out = cli().args(NGINX).args(&["-o", "json"]).passes();
    let doc: serde_json::Value = serde_json::from_str(&out.stdout).unwrap();
    assert_eq!(doc["kind"], "Application");
    assert_eq!(doc["metadata"]["namespace"], "argocd");
    assert_eq!(doc["spec"]["destination"]["namespace"], "dev");
}

#[test]
fn sync_preset_renders_automation() {
    cli()
        .args(NGINX)
        .args(&["--sync-policy", "auto-prune"])
        .passes()
        .stdout_has("automated:")
        .stdout_has("prune: true")
        .stdout_has("selfHeal: false");
}

#[test]
fn missing_application_name_is_a_validation_failure() {
    cli()
        .args(&["render", "app", "--repo-url", "https://charts.bitnami.com/bitnami", "--chart-path", "nginx"])
        .fails_with(2)
        .stderr_has("missing required parameter: app_name");
}

#[test]
fn escaping_chart_path_is_rejected() {
    cli()
        .args(&["render", "app", "--app-name", "x", "--repo-url", "https://github.com/acme/charts.git"])
        .args(&["--chart-path", "../secrets"])
        .fails_with(2)
        .stderr_has("chart_path");
}

#[test]
fn unknown_sync_policy_is_a_usage_error() {
    cli().args(NGINX).args(&["--sync-policy", "sometimes"]).fails_with(2).stderr_has("unknown sync policy");
}

#[test]
fn values_file_must_be_a_mapping() {
    let sandbox = Sandbox::new();
    let values = sandbox.file("values.yaml", "- one\n- two\n");
    sandbox
        .flowcd()
        .args(NGINX)
        .args(&["--values-file", values.to_str().unwrap()])
        .fails_with(2)
        .stderr_has("invalid values file");
}

#[test]
fn values_file_is_referenced() {
    let sandbox = Sandbox::new();
    let values = sandbox.file("values.yaml", "replicaCount: 2\n");
    sandbox
        .flowcd()
        .args(NGINX)
        .args(&["--values-file", values.to_str().unwrap()])
        .passes()
        .stdout_has("valueFiles:")
        .stdout_has("values.yaml");
}

#[test]
fn applicationset_reads_environments_file() {
    let sandbox = Sandbox::new();
    let envs = sandbox.file(
        "envs.json",
        r#"[{"name":"dev","namespace":"guestbook-dev","cluster":"https://kubernetes.default.svc"},
            {"name":"prod","namespace":"guestbook","cluster_url":"https://prod.example.com"}]"#,
    );
    sandbox
        .flowcd()
        .args(&["render", "appset", "--appset-name", "guestbook"])
        .args(&["--repo-url", "https://github.com/argoproj/argocd-example-apps.git"])
        .args(&["--chart-path", "helm-guestbook", "--environments", envs.to_str().unwrap()])
        .passes()
        .stdout_has("kind: ApplicationSet")
        .stdout_has("guestbook-{{name}}")
        .stdout_has("guestbook-dev")
        .stdout_has("https://prod.example.com");
}

#[test]
fn applicationset_without_environments_fails() {
    cli()
        .args(&["render", "appset", "--appset-name", "guestbook"])
        .args(&["--repo-url", "https://github.com/argoproj/argocd-example-apps.git", "--chart-path", "helm-guestbook"])
        .fails_with(2)
        .stderr_has("environments");
}
