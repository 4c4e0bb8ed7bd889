// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::{FileConfig, GitopsFile, Overrides};
use clap::Parser;
use flowcd_core::{bind, TemplateCatalog, APPLICATIONSET_TEMPLATE, APPLICATION_TEMPLATE, INFRASTRUCTURE_TEMPLATE};
use flowcd_engine::{ExecutionError, GitPublishResult, PublishError};

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: SubmitCommand,
}

fn parse(args: &[&str]) -> SubmitCommand {
    Cli::try_parse_from(std::iter::once("test").chain(args.iter().copied())).unwrap().command
}

#[test]
fn app_flags_bind_to_the_application_template() {
    let SubmitCommand::App { input, publish } = parse(&[
        "app",
        "--app-name",
        "nginx-dev",
        "--repo-url",
        "https://charts.bitnami.com/bitnami",
        "--chart-path",
        "nginx",
        "--sync-policy",
        "auto-prune",
        "--helm-parameters",
        "replicaCount=2",
        "--job-name",
        "deploy-nginx",
    ]) else {
        panic!("expected app");
    };
    assert_eq!(publish.job_name.as_deref(), Some("deploy-nginx"));

    let catalog = TemplateCatalog::builtin();
    let params = bind(catalog.get(APPLICATION_TEMPLATE).unwrap(), &input.to_input()).unwrap();
    assert_eq!(params.get("app_name"), Some("nginx-dev"));
    assert_eq!(params.get("destination_namespace"), Some("nginx-dev"));
    assert_eq!(params.get("helm_parameters"), Some("replicaCount=2"));
    assert_eq!(params.get("sync_policy_automated"), Some("true"));
    assert_eq!(params.get("sync_policy_prune"), Some("true"));
    assert_eq!(params.get("sync_policy_self_heal"), Some("false"));
}

#[test]
fn app_namespace_maps_to_the_resource_namespace() {
    let input = AppInput { app_namespace: Some("platform".to_string()), ..AppInput::default() };
    assert_eq!(input.to_input().get("namespace"), Some(&serde_json::Value::from("platform")));
}

#[test]
fn unknown_sync_policy_is_rejected_by_the_parser() {
    let err = Cli::try_parse_from(["test", "app", "--sync-policy", "sometimes"]).err().unwrap();
    assert!(err.to_string().contains("unknown sync policy"));
}

#[test]
fn missing_flags_are_left_to_the_binder() {
    let SubmitCommand::App { input, .. } = parse(&["app"]) else {
        panic!("expected app");
    };
    let catalog = TemplateCatalog::builtin();
    let err = bind(catalog.get(APPLICATION_TEMPLATE).unwrap(), &input.to_input()).unwrap_err();
    assert_eq!(err, flowcd_core::ValidationError::MissingParameter("app_name".to_string()));
}

#[yare::parameterized(
    app_without_name     = { &["app", "--repo-url", "https://charts.bitnami.com/bitnami", "--chart-path", "nginx"], "app_name" },
    app_with_parent_path = { &["app", "--app-name", "api", "--repo-url", "https://github.com/acme/charts.git", "--chart-path", "../api"], "chart_path" },
    appset_without_envs  = { &["appset", "--appset-name", "guestbook", "--repo-url", "https://github.com/acme/charts.git", "--chart-path", "guestbook"], "environments" },
    infra_bad_namespace  = { &["infra", "Team_A"], "namespace" },
)]
fn preflight_rejects_bad_input_offline(args: &[&str], field: &str) {
    let err = preflight(&parse(args)).unwrap_err();
    assert_eq!(err.code, codes::VALIDATION);
    assert!(err.message.contains(field), "{}", err.message);
}

#[test]
fn preflight_accepts_complete_input() {
    let command = parse(&[
        "app",
        "--app-name",
        "nginx-dev",
        "--repo-url",
        "https://charts.bitnami.com/bitnami",
        "--chart-path",
        "nginx",
    ]);
    assert!(preflight(&command).is_ok());
    assert!(preflight(&parse(&["infra", "team-a"])).is_ok());
}

#[yare::parameterized(
    inline_array  = { r#"[{"name":"dev"}]"#, r#"[{"name":"dev"}]"# },
    inline_object = { r#"{"name":"dev"}"#, r#"{"name":"dev"}"# },
    reference     = { "@envs.json", "@envs.json" },
    bare_path     = { "envs.json", "@envs.json" },
)]
fn structured_arguments(arg: &str, expected: &str) {
    assert_eq!(structured(arg), expected);
}

#[test]
fn appset_environments_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("envs.json");
    std::fs::write(&path, r#"[{"name":"dev","namespace":"dev","cluster":"https://kubernetes.default.svc"}]"#)
        .unwrap();
    let input = AppSetInput {
        appset_name: Some("guestbook".to_string()),
        repo_url: Some("https://github.com/argoproj/argocd-example-apps.git".to_string()),
        chart_path: Some("helm-guestbook".to_string()),
        environments: Some(path.display().to_string()),
        ..AppSetInput::default()
    };
    let catalog = TemplateCatalog::builtin();
    let params = bind(catalog.get(APPLICATIONSET_TEMPLATE).unwrap(), &input.to_input()).unwrap();
    assert!(params.value("environments").starts_with("[{"));
    assert_eq!(params.get("generator_type"), Some("list"));
}

#[test]
fn infra_takes_the_namespace_positionally() {
    let SubmitCommand::Infra(input) = parse(&["infra", "team-a", "--custom-scripts", "echo ready"]) else {
        panic!("expected infra");
    };
    let catalog = TemplateCatalog::builtin();
    let params = bind(catalog.get(INFRASTRUCTURE_TEMPLATE).unwrap(), &input.to_input()).unwrap();
    assert_eq!(params.get("namespace"), Some("team-a"));
    assert_eq!(params.get("secrets"), Some("[]"));
    assert_eq!(params.get("custom_scripts"), Some("echo ready"));
}

fn settings(repo: Option<&str>) -> Settings {
    let file = FileConfig {
        gitops: GitopsFile {
            repo: repo.map(String::from),
            path: Some("applications".to_string()),
            ..GitopsFile::default()
        },
        ..FileConfig::default()
    };
    Settings::resolve(file, None, Overrides::default()).unwrap()
}

#[test]
fn no_repository_means_no_publish_targets() {
    assert!(PublishArgs::default().targets(&settings(None)).is_empty());
}

#[test]
fn configured_repository_is_a_git_target() {
    let targets = PublishArgs::default().targets(&settings(Some("https://github.com/acme/deployments")));
    let [PublishTarget::Git(git)] = targets.as_slice() else {
        panic!("expected one git target, got {targets:?}");
    };
    assert_eq!(git.repo_url, "https://github.com/acme/deployments");
    assert_eq!(git.branch, "main");
    assert_eq!(git.path, "applications");
    assert!(git.credentials.is_none());
}

#[test]
fn flags_override_configured_repository_and_add_local_target() {
    let args = PublishArgs {
        gitops_repo: Some("https://github.com/acme/other".to_string()),
        gitops_branch: Some("staging".to_string()),
        save_manifest: Some(PathBuf::from("/tmp/manifests")),
        ..PublishArgs::default()
    };
    let targets = args.targets(&settings(Some("https://github.com/acme/deployments")));
    assert_eq!(targets.len(), 2);
    let PublishTarget::Git(git) = &targets[0] else {
        panic!("expected git target first");
    };
    assert_eq!(git.repo_url, "https://github.com/acme/other");
    assert_eq!(git.branch, "staging");
    assert_eq!(git.path, "applications");
    assert!(matches!(&targets[1], PublishTarget::Local { dir, path } if dir == &PathBuf::from("/tmp/manifests") && path.is_empty()));
}

fn report(phase: Phase, publish: Vec<PublishStatus>) -> FlowReport {
    let handle = JobHandle::new("create-argocd-application-x7k2p", "argo");
    let mut snapshot = ExecutionSnapshot::pending(handle.clone());
    snapshot.phase = phase;
    FlowReport { handle, failure: ExecutionError::from_snapshot(&snapshot), snapshot, publish }
}

fn exit_code(result: Result<()>) -> Option<i32> {
    result.err().map(|e| e.downcast_ref::<ExitError>().map_or(1, |exit| exit.code))
}

#[test]
fn succeeded_and_published_exits_cleanly() {
    let published = PublishStatus::Published(GitPublishResult {
        outcome: flowcd_engine::PublishOutcome::Created,
        sha: Some("abc123".to_string()),
        path: "applications/nginx-dev.yaml".to_string(),
    });
    assert_eq!(exit_code(report_exit(&report(Phase::Succeeded, vec![published]))), None);
}

#[test]
fn failed_job_exits_with_execution_code() {
    let code = exit_code(report_exit(&report(Phase::Failed, vec![PublishStatus::Skipped])));
    assert_eq!(code, Some(codes::EXECUTION));
}

#[test]
fn publish_failure_exits_with_publish_code() {
    let failed = PublishStatus::Failed {
        result: GitPublishResult::failed("applications/nginx-dev.yaml"),
        error: PublishError::Conflict { path: "applications/nginx-dev.yaml".to_string(), attempts: 3 },
    };
    let result = report_exit(&report(Phase::Succeeded, vec![failed]));
    let err = result.unwrap_err();
    let exit = err.downcast_ref::<ExitError>().unwrap();
    assert_eq!(exit.code, codes::PUBLISH);
    assert!(exit.message.contains("argo/create-argocd-application-x7k2p succeeded"));
}
