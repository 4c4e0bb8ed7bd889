// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd config show` resolves file, environment and flags.

use crate::prelude::*;

#[test]
fn defaults_are_shown() {
    cli()
        .args(&["config", "show"])
        .passes()
        .stdout_has("namespace = \"argo\"")
        .stdout_has("poll_interval_ms = 2000")
        .stdout_has("branch = \"main\"")
        .stdout_has("path = \"argocd-manifests\"")
        .stdout_has("token = \"(unset)\"");
}

#[test]
fn token_is_never_printed() {
    cli()
        .env("GIT_USERNAME", "deploy-bot")
        .env("GIT_TOKEN", "ghp_supersecret")
        .args(&["config", "show"])
        .passes()
        .stdout_has("username = \"deploy-bot\"")
        .stdout_has("[redacted]")
        .stdout_lacks("ghp_supersecret");
}

#[test]
fn flag_beats_environment_beats_file() {
    let sandbox = Sandbox::new();
    sandbox.file("config.toml", "namespace = \"from-file\"\n");

    sandbox.flowcd().args(&["config", "show"]).passes().stdout_has("namespace = \"from-file\"");
    sandbox
        .flowcd()
        .env("FLOWCD_NAMESPACE", "from-env")
        .args(&["config", "show"])
        .passes()
        .stdout_has("namespace = \"from-env\"");
    sandbox
        .flowcd()
        .env("FLOWCD_NAMESPACE", "from-env")
        .args(&["-n", "from-flag", "config", "show"])
        .passes()
        .stdout_has("namespace = \"from-flag\"");
}

#[test]
fn gitops_section_is_read() {
    let sandbox = Sandbox::new();
    sandbox.file(
        "config.toml",
        "[gitops]\nrepo = \"https://github.com/acme/deployments\"\nbranch = \"release\"\n\n[gitops.author]\nname = \"flowcd\"\nemail = \"flowcd@example.com\"\n",
    );
    let out = sandbox.flowcd().args(&["-o", "json", "config", "show"]).passes();
    let doc: serde_json::Value = serde_json::from_str(&out.stdout).unwrap();
    assert_eq!(doc["gitops"]["repo"], "https://github.com/acme/deployments");
    assert_eq!(doc["gitops"]["branch"], "release");
    assert_eq!(doc["gitops"]["author"]["email"], "flowcd@example.com");
}

#[test]
fn unknown_config_key_is_an_error() {
    let sandbox = Sandbox::new();
    sandbox.file("config.toml", "namespac = \"typo\"\n");
    sandbox.flowcd().args(&["config", "show"]).fails_with(1).stderr_has("invalid config");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let sandbox = Sandbox::new();
    let missing = sandbox.path().join("nope.toml");
    sandbox
        .flowcd()
        .args(&["--config", missing.to_str().unwrap(), "config", "show"])
        .fails_with(1)
        .stderr_has("cannot read");
}
