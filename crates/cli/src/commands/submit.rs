// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd submit` - run a template and publish its manifest

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use flowcd_core::{
    bind, ExecutionSnapshot, JobHandle, ManifestKind, Phase, Progress, RawInput, SyncPreset,
    TemplateCatalog, ValidationError, INFRASTRUCTURE_TEMPLATE,
};
use flowcd_engine::{FlowError, FlowReport, FlowRequest, GitTarget, PublishStatus, PublishTarget};
use serde::Serialize;

use super::{cancel_on_ctrl_c, connect, load_settings, Globals};
use crate::config::Settings;
use crate::exit_error::{codes, ExitError};
use crate::output::{format_publish, format_snapshot, print_json, OutputFormat};

#[derive(Args)]
pub struct SubmitArgs {
    #[command(subcommand)]
    pub command: SubmitCommand,
}

#[derive(Subcommand)]
pub enum SubmitCommand {
    /// Create an Argo CD Application for a Helm chart
    App {
        #[command(flatten)]
        input: AppInput,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Create an Argo CD ApplicationSet over several environments
    Appset {
        #[command(flatten)]
        input: AppSetInput,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Provision a namespace with secrets and config maps
    Infra(InfraInput),
}

/// Application parameters, shared with `flowcd render app`.
#[derive(Args, Debug, Clone, Default)]
pub struct AppInput {
    /// Application name
    #[arg(long)]
    pub app_name: Option<String>,
    /// Namespace the Application resource lives in (default: argocd)
    #[arg(long)]
    pub app_namespace: Option<String>,
    /// Helm repository or Git repository URL
    #[arg(long)]
    pub repo_url: Option<String>,
    /// Chart name or path inside the repository
    #[arg(long)]
    pub chart_path: Option<String>,
    /// Helm values file (YAML mapping)
    #[arg(long)]
    pub values_file: Option<PathBuf>,
    /// Destination cluster API server
    #[arg(long)]
    pub destination_cluster: Option<String>,
    /// Destination namespace (default: the application name)
    #[arg(long)]
    pub destination_namespace: Option<String>,
    /// Sync policy: manual, auto, auto-prune, auto-heal
    #[arg(long, default_value_t)]
    pub sync_policy: SyncPreset,
    /// Helm parameters as key=value,key=value
    #[arg(long)]
    pub helm_parameters: Option<String>,
}

impl AppInput {
    pub fn to_input(&self) -> RawInput {
        let mut input = RawInput::new();
        put(&mut input, "app_name", &self.app_name);
        put(&mut input, "namespace", &self.app_namespace);
        put(&mut input, "repo_url", &self.repo_url);
        put(&mut input, "chart_path", &self.chart_path);
        put(&mut input, "destination_cluster", &self.destination_cluster);
        put(&mut input, "destination_namespace", &self.destination_namespace);
        if let Some(path) = &self.values_file {
            input.insert("values_file", path.display().to_string());
        }
        put(&mut input, "helm_parameters", &self.helm_parameters);
        put_sync(&mut input, self.sync_policy);
        input
    }
}

/// ApplicationSet parameters, shared with `flowcd render appset`.
#[derive(Args, Debug, Clone, Default)]
pub struct AppSetInput {
    /// ApplicationSet name
    #[arg(long)]
    pub appset_name: Option<String>,
    /// Namespace the ApplicationSet resource lives in (default: argocd)
    #[arg(long)]
    pub app_namespace: Option<String>,
    /// Helm repository or Git repository URL
    #[arg(long)]
    pub repo_url: Option<String>,
    /// Chart name or path inside the repository
    #[arg(long)]
    pub chart_path: Option<String>,
    /// Environments as a JSON array, or a path to a JSON file
    #[arg(long)]
    pub environments: Option<String>,
    /// Generator: list or git
    #[arg(long)]
    pub generator_type: Option<String>,
    /// Sync policy: manual, auto, auto-prune, auto-heal
    #[arg(long, default_value_t)]
    pub sync_policy: SyncPreset,
}

impl AppSetInput {
    pub fn to_input(&self) -> RawInput {
        let mut input = RawInput::new();
        put(&mut input, "appset_name", &self.appset_name);
        put(&mut input, "namespace", &self.app_namespace);
        put(&mut input, "repo_url", &self.repo_url);
        put(&mut input, "chart_path", &self.chart_path);
        if let Some(environments) = &self.environments {
            input.insert("environments", structured(environments));
        }
        put(&mut input, "generator_type", &self.generator_type);
        put_sync(&mut input, self.sync_policy);
        input
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct InfraInput {
    /// Namespace to provision
    #[arg(value_name = "NAMESPACE")]
    pub target: String,
    /// Secrets as a JSON array, or a path to a JSON file
    #[arg(long)]
    pub secrets: Option<String>,
    /// Config maps as a JSON array, or a path to a JSON file
    #[arg(long)]
    pub configmaps: Option<String>,
    /// Shell commands run after the namespace is ready
    #[arg(long)]
    pub custom_scripts: Option<String>,
}

impl InfraInput {
    pub fn to_input(&self) -> RawInput {
        let mut input = RawInput::new().set("namespace", self.target.as_str());
        if let Some(secrets) = &self.secrets {
            input.insert("secrets", structured(secrets));
        }
        if let Some(configmaps) = &self.configmaps {
            input.insert("configmaps", structured(configmaps));
        }
        put(&mut input, "custom_scripts", &self.custom_scripts);
        input
    }
}

/// Where a succeeded job's manifest goes.
#[derive(Args, Debug, Clone, Default)]
pub struct PublishArgs {
    /// Publish the manifest to this Git repository (default: config gitops.repo)
    #[arg(long)]
    pub gitops_repo: Option<String>,
    /// Branch to commit to (default: config gitops.branch, then main)
    #[arg(long)]
    pub gitops_branch: Option<String>,
    /// Directory inside the repository (default: config gitops.path)
    #[arg(long)]
    pub gitops_path: Option<String>,
    /// Also write the manifest into this local directory
    #[arg(long, value_name = "DIR")]
    pub save_manifest: Option<PathBuf>,
    /// Exact job name instead of a generated one
    #[arg(long)]
    pub job_name: Option<String>,
}

impl PublishArgs {
    pub fn targets(&self, settings: &Settings) -> Vec<PublishTarget> {
        let gitops = &settings.gitops;
        let mut targets = Vec::new();
        if let Some(repo_url) = self.gitops_repo.clone().or_else(|| gitops.repo.clone()) {
            targets.push(PublishTarget::Git(GitTarget {
                repo_url,
                branch: self.gitops_branch.clone().unwrap_or_else(|| gitops.branch.clone()),
                path: self.gitops_path.clone().unwrap_or_else(|| gitops.path.clone()),
                author: gitops.author.clone(),
                credentials: gitops.credentials.clone(),
            }));
        }
        if let Some(dir) = &self.save_manifest {
            targets.push(PublishTarget::Local { dir: dir.clone(), path: String::new() });
        }
        targets
    }

    fn request(&self, input: RawInput, settings: &Settings) -> FlowRequest {
        FlowRequest { input, job_name: self.job_name.clone(), publish: self.targets(settings) }
    }
}

fn put(input: &mut RawInput, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        input.insert(name, value.as_str());
    }
}

fn put_sync(input: &mut RawInput, preset: SyncPreset) {
    let policy = preset.policy();
    input.insert("sync_policy_automated", policy.automated);
    input.insert("sync_policy_self_heal", policy.self_heal);
    input.insert("sync_policy_prune", policy.prune);
}

/// Inline JSON stays as is; anything else names a file to read.
pub(crate) fn structured(arg: &str) -> String {
    let trimmed = arg.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') || trimmed.starts_with(flowcd_core::REFERENCE_MARKER) {
        arg.to_string()
    } else {
        format!("{}{arg}", flowcd_core::REFERENCE_MARKER)
    }
}

/// Prints a line whenever the phase or progress moves.
fn progress_printer(format: OutputFormat) -> impl FnMut(&ExecutionSnapshot) + Send {
    let mut last: Option<(Phase, Progress)> = None;
    move |snapshot: &ExecutionSnapshot| {
        if format == OutputFormat::Json {
            return;
        }
        if last.is_none() {
            eprintln!("submitted {}", snapshot.handle);
        }
        let current = (snapshot.phase, snapshot.progress);
        if last != Some(current) {
            eprintln!("  {} {}", crate::color::phase(snapshot.phase), snapshot.progress);
            last = Some(current);
        }
    }
}

/// Bind the input offline so bad flags are reported before any cluster call.
pub(crate) fn preflight(command: &SubmitCommand) -> Result<(), ExitError> {
    let catalog = TemplateCatalog::builtin();
    let checked: Result<(), FlowError> = match command {
        SubmitCommand::App { input, .. } => {
            flowcd_engine::render(&catalog, ManifestKind::Application, &input.to_input()).map(drop)
        }
        SubmitCommand::Appset { input, .. } => {
            flowcd_engine::render(&catalog, ManifestKind::ApplicationSet, &input.to_input()).map(drop)
        }
        SubmitCommand::Infra(input) => catalog
            .get(INFRASTRUCTURE_TEMPLATE)
            .ok_or_else(|| ValidationError::UnknownTemplate(INFRASTRUCTURE_TEMPLATE.to_string()))
            .and_then(|template| bind(template, &input.to_input()))
            .map(drop)
            .map_err(FlowError::from),
    };
    checked.map_err(ExitError::from)
}

pub async fn handle(command: SubmitCommand, globals: &Globals) -> Result<()> {
    let settings = load_settings(globals)?;
    preflight(&command)?;
    let flow = connect(globals, &settings).await?;
    let cancel = cancel_on_ctrl_c();
    let progress = progress_printer(globals.format);

    let report = match command {
        SubmitCommand::App { input, publish } => {
            let request = publish.request(input.to_input(), &settings);
            flow.submit_application(&request, cancel, progress).await
        }
        SubmitCommand::Appset { input, publish } => {
            let request = publish.request(input.to_input(), &settings);
            flow.submit_applicationset(&request, cancel, progress).await
        }
        SubmitCommand::Infra(input) => flow.provision(&input.to_input(), cancel, progress).await,
    }
    .map_err(ExitError::from)?;

    print_report(&report, globals.format)?;
    report_exit(&report)
}

/// Exit code of a finished flow: execution failures win over publish failures.
pub(crate) fn report_exit(report: &FlowReport) -> Result<()> {
    if let Some(failure) = &report.failure {
        return Err(ExitError::new(codes::EXECUTION, failure.to_string()).into());
    }
    if let Some(error) = report.publish_error() {
        let message = format!("job {} succeeded but its manifest was not published: {error}", report.handle);
        return Err(ExitError::new(codes::PUBLISH, message).into());
    }
    Ok(())
}

#[derive(Serialize)]
struct ReportView<'a> {
    job: &'a JobHandle,
    snapshot: &'a ExecutionSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
    publish: Vec<PublishView>,
}

#[derive(Serialize)]
struct PublishView {
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&PublishStatus> for PublishView {
    fn from(status: &PublishStatus) -> Self {
        match status {
            PublishStatus::Skipped => {
                PublishView { outcome: "skipped".to_string(), path: None, sha: None, error: None }
            }
            PublishStatus::Published(result) => PublishView {
                outcome: result.outcome.to_string(),
                path: Some(result.path.clone()),
                sha: result.sha.clone(),
                error: None,
            },
            PublishStatus::Failed { result, error } => PublishView {
                outcome: result.outcome.to_string(),
                path: Some(result.path.clone()),
                sha: None,
                error: Some(error.to_string()),
            },
        }
    }
}

fn print_report(report: &FlowReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&ReportView {
            job: &report.handle,
            snapshot: &report.snapshot,
            failure: report.failure.as_ref().map(ToString::to_string),
            publish: report.publish.iter().map(PublishView::from).collect(),
        }),
        OutputFormat::Text => {
            print!("{}", format_snapshot(&report.snapshot, Utc::now()));
            for status in &report.publish {
                println!("{}", format_publish(status));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "submit_tests.rs"]
mod tests;
