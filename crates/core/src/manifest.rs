// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment manifests published to GitOps repositories.
//!
//! Rendering is byte-stable: the document is built from structs with a fixed
//! field order and serialized with `serde_yaml`, so identical inputs always
//! produce identical bytes. The publisher relies on this to detect no-op
//! writes.

use crate::binder::{ParameterSet, ValidationError};
use crate::validate::{parse_environments, parse_helm_parameters};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const API_VERSION: &str = "argoproj.io/v1alpha1";
const PROJECT: &str = "default";
const DEFAULT_VALUES_FILE: &str = "values.yaml";
const HELM_REPO_MARKERS: &[&str] = &["charts.", "artifacthub.io", "chartmuseum"];

/// Automated sync flags. Self-heal and prune only apply when automated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncPolicy {
    pub automated: bool,
    pub self_heal: bool,
    pub prune: bool,
}

impl SyncPolicy {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            automated: params.flag("sync_policy_automated"),
            self_heal: params.flag("sync_policy_self_heal"),
            prune: params.flag("sync_policy_prune"),
        }
    }

    fn block(self) -> SyncPolicyBlock {
        SyncPolicyBlock {
            automated: self
                .automated
                .then_some(Automated { prune: self.prune, self_heal: self.self_heal }),
            sync_options: vec!["CreateNamespace=true".to_string()],
        }
    }
}

/// Named sync policy shorthand accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPreset {
    #[default]
    Manual,
    Auto,
    AutoPrune,
    AutoHeal,
}

impl SyncPreset {
    pub const NAMES: &'static [&'static str] = &["manual", "auto", "auto-prune", "auto-heal"];

    pub fn policy(self) -> SyncPolicy {
        match self {
            SyncPreset::Manual => SyncPolicy::default(),
            SyncPreset::Auto => SyncPolicy { automated: true, ..SyncPolicy::default() },
            SyncPreset::AutoPrune => SyncPolicy { automated: true, prune: true, self_heal: false },
            SyncPreset::AutoHeal => SyncPolicy { automated: true, prune: false, self_heal: true },
        }
    }
}

crate::simple_display! {
    SyncPreset {
        Manual => "manual",
        Auto => "auto",
        AutoPrune => "auto-prune",
        AutoHeal => "auto-heal",
    }
}

impl FromStr for SyncPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manual" => Ok(SyncPreset::Manual),
            "auto" => Ok(SyncPreset::Auto),
            "auto-prune" => Ok(SyncPreset::AutoPrune),
            "auto-heal" => Ok(SyncPreset::AutoHeal),
            other => Err(format!("unknown sync policy {other:?} (expected {})", Self::NAMES.join(", "))),
        }
    }
}

/// One deployment target of an application set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub namespace: String,
    #[serde(alias = "cluster_url")]
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_file: Option<String>,
}

/// Whether the manifest describes a single application or a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    Application,
    ApplicationSet,
}

crate::simple_display! {
    ManifestKind {
        Application => "Application",
        ApplicationSet => "ApplicationSet",
    }
}

/// Rendered deployment resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    pub spec: ManifestSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ManifestSpec {
    Application(ApplicationSpec),
    ApplicationSet(ApplicationSetSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    pub project: String,
    pub source: Source,
    pub destination: Destination,
    pub sync_policy: SyncPolicyBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub target_revision: String,
    pub helm: Helm,
}

impl Source {
    /// Chart repositories are addressed by chart name at any version; git
    /// repositories by path at `HEAD`.
    fn new(repo_url: &str, chart_path: &str, helm: Helm) -> Self {
        if is_helm_repository(repo_url) {
            Self {
                repo_url: repo_url.to_string(),
                chart: Some(chart_path.to_string()),
                path: None,
                target_revision: "*".to_string(),
                helm,
            }
        } else {
            Self {
                repo_url: repo_url.to_string(),
                chart: None,
                path: Some(chart_path.to_string()),
                target_revision: "HEAD".to_string(),
                helm,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Helm {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub value_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<HelmParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelmParameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    pub server: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicyBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automated: Option<Automated>,
    pub sync_options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Automated {
    pub prune: bool,
    pub self_heal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSetSpec {
    pub generators: Vec<Generator>,
    pub template: AppTemplate,
}

/// One generator entry; exactly one of the fields is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Generator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<ListGenerator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitGenerator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListGenerator {
    pub elements: Vec<Environment>,
}

/// Reads one environment per file from `<chart_path>/environments/*.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitGenerator {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    pub revision: String,
    pub files: Vec<GitFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitFile {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppTemplate {
    pub metadata: TemplateName,
    pub spec: ApplicationSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateName {
    pub name: String,
}

/// True when the URL points at a Helm chart repository rather than git.
pub fn is_helm_repository(repo_url: &str) -> bool {
    HELM_REPO_MARKERS.iter().any(|marker| repo_url.contains(marker))
}

impl Manifest {
    /// Application manifest from parameters bound to the application template.
    pub fn application(params: &ParameterSet) -> Result<Self, ValidationError> {
        let helm_parameters = parse_helm_parameters(params.value("helm_parameters")).map_err(|reason| {
            ValidationError::InvalidValue { name: "helm_parameters".to_string(), reason }
        })?;
        let helm = Helm {
            value_files: non_empty(params.value("values_file")).into_iter().collect(),
            parameters: helm_list(helm_parameters),
        };
        let name = params.value("app_name").to_string();
        Ok(Self {
            api_version: API_VERSION.to_string(),
            kind: ManifestKind::Application.to_string(),
            metadata: Metadata { name, namespace: params.value("namespace").to_string() },
            spec: ManifestSpec::Application(ApplicationSpec {
                project: PROJECT.to_string(),
                source: Source::new(params.value("repo_url"), params.value("chart_path"), helm),
                destination: Destination {
                    server: params.value("destination_cluster").to_string(),
                    namespace: params.value("destination_namespace").to_string(),
                },
                sync_policy: SyncPolicy::from_params(params).block(),
            }),
        })
    }

    /// Application set manifest from parameters bound to the set template.
    ///
    /// Generated applications are named `<set>-<environment>` and pick up
    /// the environment's cluster, namespace and values file.
    pub fn application_set(params: &ParameterSet) -> Result<Self, ValidationError> {
        let mut environments = parse_environments(params.value("environments")).map_err(|reason| {
            ValidationError::InvalidValue { name: "environments".to_string(), reason }
        })?;
        for env in environments.iter_mut() {
            env.values_file.get_or_insert_with(|| DEFAULT_VALUES_FILE.to_string());
        }
        let name = params.value("appset_name").to_string();
        let repo_url = params.value("repo_url");
        let chart_path = params.value("chart_path");
        let generator = match params.value("generator_type") {
            "git" => Generator {
                git: Some(GitGenerator {
                    repo_url: repo_url.to_string(),
                    revision: "HEAD".to_string(),
                    files: vec![GitFile { path: format!("{chart_path}/environments/*.json") }],
                }),
                ..Generator::default()
            },
            _ => Generator { list: Some(ListGenerator { elements: environments }), ..Generator::default() },
        };
        let helm = Helm { value_files: vec!["{{values_file}}".to_string()], parameters: Vec::new() };
        Ok(Self {
            api_version: API_VERSION.to_string(),
            kind: ManifestKind::ApplicationSet.to_string(),
            metadata: Metadata { name: name.clone(), namespace: params.value("namespace").to_string() },
            spec: ManifestSpec::ApplicationSet(ApplicationSetSpec {
                generators: vec![generator],
                template: AppTemplate {
                    metadata: TemplateName { name: format!("{name}-{{{{name}}}}") },
                    spec: ApplicationSpec {
                        project: PROJECT.to_string(),
                        source: Source::new(repo_url, chart_path, helm),
                        destination: Destination {
                            server: "{{cluster}}".to_string(),
                            namespace: "{{namespace}}".to_string(),
                        },
                        sync_policy: SyncPolicy::from_params(params).block(),
                    },
                },
            }),
        })
    }

    pub fn kind(&self) -> ManifestKind {
        match self.spec {
            ManifestSpec::Application(_) => ManifestKind::Application,
            ManifestSpec::ApplicationSet(_) => ManifestKind::ApplicationSet,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Stable YAML rendering.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn helm_list(params: IndexMap<String, String>) -> Vec<HelmParameter> {
    params.into_iter().map(|(name, value)| HelmParameter { name, value }).collect()
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
