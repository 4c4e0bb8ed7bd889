// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use flowcd_adapters::{EngineCall, FakeWorkflowEngine};
use flowcd_core::{bind, RawInput, TemplateCatalog, APPLICATION_TEMPLATE};

fn app_params() -> ParameterSet {
    let catalog = TemplateCatalog::builtin();
    let raw = RawInput::new()
        .set("app_name", "nginx-dev")
        .set("repo_url", "https://charts.bitnami.com/bitnami")
        .set("chart_path", "nginx")
        .set("destination_namespace", "dev");
    bind(catalog.get(APPLICATION_TEMPLATE).unwrap(), &raw).unwrap()
}

fn gateway(engine: &FakeWorkflowEngine, suffixes: &[&str]) -> SubmissionGateway<FakeWorkflowEngine> {
    engine.script_suffixes(suffixes.iter().copied());
    SubmissionGateway::new(engine.clone())
}

fn conflict() -> EngineError {
    EngineError::Conflict("already exists".to_string())
}

#[tokio::test]
async fn submit_returns_the_engine_generated_name() {
    let engine = FakeWorkflowEngine::with_templates("argo", &[APPLICATION_TEMPLATE]);
    let handle = gateway(&engine, &["x7k2p"])
        .submit(APPLICATION_TEMPLATE, &app_params(), "argo")
        .await
        .unwrap();

    assert_eq!(handle, JobHandle::new("create-argocd-application-x7k2p", "argo"));
    let submits = engine.submits();
    assert_eq!(submits.len(), 1);
    assert_eq!(submits[0].name, JobName::Prefix("create-argocd-application-".to_string()));
    assert_eq!(submits[0].labels.get(TEMPLATE_LABEL).map(String::as_str), Some(APPLICATION_TEMPLATE));
    let params: BTreeMap<_, _> = submits[0].parameters.iter().cloned().collect();
    assert_eq!(params.get("destination_namespace").map(String::as_str), Some("dev"));
    assert_eq!(params.get("namespace").map(String::as_str), Some("argocd"));
}

#[tokio::test]
async fn missing_template_fails_without_submitting() {
    let engine = FakeWorkflowEngine::with_templates("argo", &["provision-infrastructure"]);
    let err = gateway(&engine, &[]).submit(APPLICATION_TEMPLATE, &app_params(), "argo").await.unwrap_err();

    assert_eq!(
        err,
        SubmissionError::TemplateNotFound {
            template: APPLICATION_TEMPLATE.to_string(),
            namespace: "argo".to_string()
        }
    );
    assert!(engine.submits().is_empty());
}

#[tokio::test]
async fn template_check_is_cached_per_namespace() {
    let engine = FakeWorkflowEngine::with_templates("argo", &[APPLICATION_TEMPLATE]);
    let gateway = gateway(&engine, &[]);
    gateway.submit(APPLICATION_TEMPLATE, &app_params(), "argo").await.unwrap();
    gateway.submit(APPLICATION_TEMPLATE, &app_params(), "argo").await.unwrap();

    let listings = engine.calls().into_iter().filter(|c| matches!(c, EngineCall::ListTemplates(_))).count();
    assert_eq!(listings, 1);
}

#[tokio::test]
async fn stale_cache_hit_surfaces_template_not_found() {
    let engine = FakeWorkflowEngine::with_templates("argo", &[APPLICATION_TEMPLATE]);
    let gateway = gateway(&engine, &[]);
    gateway.submit(APPLICATION_TEMPLATE, &app_params(), "argo").await.unwrap();

    engine.remove_template("argo", APPLICATION_TEMPLATE);
    let err = gateway.submit(APPLICATION_TEMPLATE, &app_params(), "argo").await.unwrap_err();
    assert!(matches!(err, SubmissionError::TemplateNotFound { .. }));
}

#[tokio::test]
async fn name_collision_is_resubmitted_for_a_fresh_name() {
    let engine = FakeWorkflowEngine::with_templates("argo", &[APPLICATION_TEMPLATE]);
    let gateway = gateway(&engine, &["aaaaa", "aaaaa", "bbbbb"]);
    gateway.submit(APPLICATION_TEMPLATE, &app_params(), "argo").await.unwrap();

    // The engine hands out a taken name once, then a free one.
    let handle = gateway.submit(APPLICATION_TEMPLATE, &app_params(), "argo").await.unwrap();

    assert_eq!(handle.name, "create-argocd-application-bbbbb");
    let submits = engine.submits();
    assert_eq!(submits.len(), 3);
    assert!(submits.iter().all(|r| r.name == JobName::Prefix("create-argocd-application-".to_string())));
}

#[tokio::test]
async fn collisions_give_up_after_three_attempts() {
    let engine = FakeWorkflowEngine::with_templates("argo", &[APPLICATION_TEMPLATE]);
    engine.fail_submits([conflict(), conflict(), conflict()]);
    let err = gateway(&engine, &[])
        .submit(APPLICATION_TEMPLATE, &app_params(), "argo")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SubmissionError::ConflictExhausted {
            attempts: SUBMIT_ATTEMPTS,
            name: "create-argocd-application-*".to_string()
        }
    );
    assert!(err.is_retryable());
    assert_eq!(engine.submits().len(), 3);
}

#[tokio::test]
async fn explicit_name_is_not_retried() {
    let engine = FakeWorkflowEngine::with_templates("argo", &[APPLICATION_TEMPLATE]);
    engine.fail_submits([conflict()]);
    let options = SubmitOptions { name: Some("nginx-dev-deploy".to_string()), ..Default::default() };
    let err = gateway(&engine, &[])
        .submit_with(APPLICATION_TEMPLATE, &app_params(), "argo", &options)
        .await
        .unwrap_err();

    assert_eq!(err, SubmissionError::ConflictExhausted { attempts: 1, name: "nginx-dev-deploy".to_string() });
    assert_eq!(engine.submits().len(), 1);
    assert_eq!(engine.submits()[0].name, JobName::Exact("nginx-dev-deploy".to_string()));
}

#[yare::parameterized(
    forbidden   = { EngineError::Forbidden("workflows is forbidden".into()) },
    unavailable = { EngineError::Unavailable("connection refused".into()) },
    invalid     = { EngineError::Invalid("spec.arguments invalid".into()) },
)]
fn rejections_are_terminal(error: EngineError) {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    runtime.block_on(async {
        let engine = FakeWorkflowEngine::with_templates("argo", &[APPLICATION_TEMPLATE]);
        engine.fail_submits([error.clone(), error.clone()]);
        let err = gateway(&engine, &[])
            .submit(APPLICATION_TEMPLATE, &app_params(), "argo")
            .await
            .unwrap_err();

        assert_eq!(err, SubmissionError::Rejected(error));
        assert!(!err.is_retryable());
        assert_eq!(engine.submits().len(), 1);
    });
}

#[tokio::test]
async fn parameters_bound_for_another_template_are_refused() {
    let engine = FakeWorkflowEngine::with_templates("argo", &[APPLICATION_TEMPLATE, "provision-infrastructure"]);
    let err = gateway(&engine, &[])
        .submit("provision-infrastructure", &app_params(), "argo")
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::TemplateMismatch { .. }));
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn extra_labels_are_attached() {
    let engine = FakeWorkflowEngine::with_templates("argo", &[APPLICATION_TEMPLATE]);
    let options = SubmitOptions {
        labels: BTreeMap::from([("flowcd.io/resource".to_string(), "nginx-dev".to_string())]),
        ..Default::default()
    };
    gateway(&engine, &[]).submit_with(APPLICATION_TEMPLATE, &app_params(), "argo", &options).await.unwrap();

    let labels = &engine.submits()[0].labels;
    assert_eq!(labels.get("flowcd.io/resource").map(String::as_str), Some("nginx-dev"));
    assert_eq!(labels.get(TEMPLATE_LABEL).map(String::as_str), Some(APPLICATION_TEMPLATE));
}
