// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parameterized job templates and the built-in catalog.
//!
//! A [`JobTemplate`] is registered once and never edited; a schema change
//! produces a new template. The catalog can render each template as an
//! engine-native `WorkflowTemplate` document for installation on a cluster.

use crate::validate::Check;
use serde::Serialize;

pub const APPLICATION_TEMPLATE: &str = "create-argocd-application";
pub const APPLICATIONSET_TEMPLATE: &str = "create-argocd-applicationset";
pub const INFRASTRUCTURE_TEMPLATE: &str = "provision-infrastructure";

const SERVICE_ACCOUNT: &str = "argo-workflow-sa";
const KUBECTL_IMAGE: &str = "bitnami/kubectl:latest";
const ALPINE_IMAGE: &str = "alpine:3.18";

/// How a raw value is normalized into its string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamKind {
    #[default]
    Scalar,
    /// JSON document; accepts inline literals or `@path` references and is
    /// stored as canonical JSON.
    Structured,
    /// Path to a local YAML values file that must exist and parse.
    ValuesFile,
}

/// Default applied when a parameter is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamDefault {
    Literal(String),
    /// Copy the bound value of an earlier parameter.
    FromParam(String),
}

/// One entry in a template's ordered parameter schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub required: bool,
    pub default: Option<ParamDefault>,
    pub kind: ParamKind,
    pub check: Option<Check>,
}

impl ParamSpec {
    pub fn required(name: &str) -> Self {
        Self { name: name.to_string(), required: true, default: None, kind: ParamKind::Scalar, check: None }
    }

    pub fn optional(name: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            default: Some(ParamDefault::Literal(default.to_string())),
            kind: ParamKind::Scalar,
            check: None,
        }
    }

    pub fn defaults_to(mut self, param: &str) -> Self {
        self.default = Some(ParamDefault::FromParam(param.to_string()));
        self
    }

    pub fn kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.check = Some(check);
        self
    }

    /// Literal default, if any, as shown in a rendered template.
    fn literal_default(&self) -> Option<&str> {
        match &self.default {
            Some(ParamDefault::Literal(value)) => Some(value),
            _ => None,
        }
    }
}

/// One script step of a template; steps run sequentially.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSpec {
    pub name: String,
    pub image: &'static str,
    pub source: String,
    /// Engine expression guarding the step.
    pub when: Option<String>,
    pub retry_limit: u32,
}

impl StepSpec {
    fn script(name: &str, image: &'static str, source: &str) -> Self {
        Self { name: name.to_string(), image, source: source.to_string(), when: None, retry_limit: 2 }
    }

    fn when(mut self, expr: &str) -> Self {
        self.when = Some(expr.to_string());
        self
    }

    fn retries(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }
}

/// A named, parameterized job definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTemplate {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub steps: Vec<StepSpec>,
}

impl JobTemplate {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.required)
    }

    /// Entrypoint name of the rendered workflow.
    pub fn entrypoint(&self) -> &str {
        &self.name
    }

    /// Render as an engine `WorkflowTemplate` document in `namespace`.
    pub fn to_workflow_template(&self, namespace: &str) -> WorkflowTemplateDoc {
        let parameters = self
            .params
            .iter()
            .map(|p| ArgParameter { name: p.name.clone(), value: p.literal_default().map(String::from) })
            .collect();
        let mut templates = vec![TemplateEntry {
            name: self.entrypoint().to_string(),
            steps: Some(
                self.steps
                    .iter()
                    .map(|s| {
                        vec![StepRef { name: s.name.clone(), template: s.name.clone(), when: s.when.clone() }]
                    })
                    .collect(),
            ),
            script: None,
            retry_strategy: None,
        }];
        templates.extend(self.steps.iter().map(|s| TemplateEntry {
            name: s.name.clone(),
            steps: None,
            script: Some(Script { image: s.image.to_string(), command: vec!["sh".to_string()], source: s.source.clone() }),
            retry_strategy: Some(RetryStrategy { limit: s.retry_limit.to_string(), retry_policy: "OnError".to_string() }),
        }));
        WorkflowTemplateDoc {
            api_version: "argoproj.io/v1alpha1".to_string(),
            kind: "WorkflowTemplate".to_string(),
            metadata: TemplateMetadata { name: self.name.clone(), namespace: namespace.to_string() },
            spec: TemplateSpec {
                service_account_name: SERVICE_ACCOUNT.to_string(),
                entrypoint: self.entrypoint().to_string(),
                arguments: Arguments { parameters },
                templates,
            },
        }
    }
}

/// Engine-native `WorkflowTemplate` resource. Field order is fixed so the
/// rendered document is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplateDoc {
    pub api_version: String,
    pub kind: String,
    pub metadata: TemplateMetadata,
    pub spec: TemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateMetadata {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    pub service_account_name: String,
    pub entrypoint: String,
    pub arguments: Arguments,
    pub templates: Vec<TemplateEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arguments {
    pub parameters: Vec<ArgParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgParameter {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Vec<StepRef>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_strategy: Option<RetryStrategy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRef {
    pub name: String,
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Script {
    pub image: String,
    pub command: Vec<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryStrategy {
    pub limit: String,
    pub retry_policy: String,
}

/// The registered templates, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCatalog {
    templates: Vec<JobTemplate>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateCatalog {
    /// Catalog holding the three built-in templates.
    pub fn builtin() -> Self {
        Self { templates: vec![application(), applicationset(), infrastructure()] }
    }

    pub fn get(&self, name: &str) -> Option<&JobTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobTemplate> {
        self.templates.iter()
    }
}

const GENERATOR_TYPES: &[&str] = &["list", "git"];

fn sync_flags() -> [ParamSpec; 3] {
    [
        ParamSpec::optional("sync_policy_automated", "false").check(Check::Bool),
        ParamSpec::optional("sync_policy_self_heal", "false").check(Check::Bool),
        ParamSpec::optional("sync_policy_prune", "false").check(Check::Bool),
    ]
}

fn application() -> JobTemplate {
    let mut params = vec![
        ParamSpec::required("app_name").check(Check::DnsLabel),
        ParamSpec::optional("namespace", "argocd").check(Check::DnsLabel),
        ParamSpec::required("repo_url").check(Check::RepoUrl),
        ParamSpec::required("chart_path").check(Check::ChartPath),
        ParamSpec::optional("destination_cluster", "https://kubernetes.default.svc"),
        ParamSpec::optional("destination_namespace", "")
            .defaults_to("app_name")
            .check(Check::DnsLabel),
        ParamSpec::optional("values_file", "").kind(ParamKind::ValuesFile),
        ParamSpec::optional("helm_parameters", "").check(Check::HelmParameters),
    ];
    params.extend(sync_flags());
    JobTemplate {
        name: APPLICATION_TEMPLATE.to_string(),
        description: "Create an Argo CD Application for a Helm chart".to_string(),
        params,
        steps: vec![
            StepSpec::script("validate-inputs", ALPINE_IMAGE, scripts::APP_VALIDATE),
            StepSpec::script("create-namespace", KUBECTL_IMAGE, scripts::APP_NAMESPACE),
            StepSpec::script("apply-application", KUBECTL_IMAGE, scripts::APP_APPLY).retries(3),
            StepSpec::script("verify-creation", KUBECTL_IMAGE, scripts::APP_VERIFY),
        ],
    }
}

fn applicationset() -> JobTemplate {
    let mut params = vec![
        ParamSpec::required("appset_name").check(Check::DnsLabel),
        ParamSpec::optional("namespace", "argocd").check(Check::DnsLabel),
        ParamSpec::required("repo_url").check(Check::RepoUrl),
        ParamSpec::required("chart_path").check(Check::ChartPath),
        ParamSpec::optional("generator_type", "list").check(Check::OneOf(GENERATOR_TYPES)),
        ParamSpec::required("environments").kind(ParamKind::Structured).check(Check::Environments),
    ];
    params.extend(sync_flags());
    JobTemplate {
        name: APPLICATIONSET_TEMPLATE.to_string(),
        description: "Create an Argo CD ApplicationSet fanning out over environments".to_string(),
        params,
        steps: vec![
            StepSpec::script("validate-inputs", ALPINE_IMAGE, scripts::APPSET_VALIDATE),
            StepSpec::script("apply-applicationset", KUBECTL_IMAGE, scripts::APPSET_APPLY).retries(3),
        ],
    }
}

fn infrastructure() -> JobTemplate {
    JobTemplate {
        name: INFRASTRUCTURE_TEMPLATE.to_string(),
        description: "Provision a namespace with secrets, config maps and custom scripts".to_string(),
        params: vec![
            ParamSpec::required("namespace").check(Check::DnsLabel),
            ParamSpec::optional("secrets", "[]").kind(ParamKind::Structured),
            ParamSpec::optional("configmaps", "[]").kind(ParamKind::Structured),
            ParamSpec::optional("custom_scripts", ""),
        ],
        steps: vec![
            StepSpec::script("create-namespace", KUBECTL_IMAGE, scripts::INFRA_NAMESPACE),
            StepSpec::script("create-secrets", KUBECTL_IMAGE, scripts::INFRA_SECRETS),
            StepSpec::script("create-configmaps", KUBECTL_IMAGE, scripts::INFRA_CONFIGMAPS),
            StepSpec::script("execute-custom-scripts", KUBECTL_IMAGE, scripts::INFRA_CUSTOM)
                .when("'{{workflow.parameters.custom_scripts}}' != ''"),
        ],
    }
}

/// Step sources. Parameters are substituted by the engine.
mod scripts {
    pub const APP_VALIDATE: &str = include_str!("scripts/app_validate.sh");
    pub const APP_NAMESPACE: &str = include_str!("scripts/app_namespace.sh");
    pub const APP_APPLY: &str = include_str!("scripts/app_apply.sh");
    pub const APP_VERIFY: &str = include_str!("scripts/app_verify.sh");
    pub const APPSET_VALIDATE: &str = include_str!("scripts/appset_validate.sh");
    pub const APPSET_APPLY: &str = include_str!("scripts/appset_apply.sh");
    pub const INFRA_NAMESPACE: &str = include_str!("scripts/infra_namespace.sh");
    pub const INFRA_SECRETS: &str = include_str!("scripts/infra_secrets.sh");
    pub const INFRA_CONFIGMAPS: &str = include_str!("scripts/infra_configmaps.sh");
    pub const INFRA_CUSTOM: &str = include_str!("scripts/infra_custom.sh");
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
