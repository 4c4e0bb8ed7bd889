// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestration facade
//!
//! Composes binding, submission, tracking and publishing into the
//! end-to-end flows, plus template installation, listing and teardown.
//! Validation and rendering happen before anything reaches the cluster.
//! A failed publish never undoes a successful job; both outcomes are
//! reported side by side.

use crate::gateway::{SubmissionError, SubmissionGateway, SubmitOptions};
use crate::logs::LogAggregator;
use crate::publisher::{
    GitOpsPublisher, GitPublishRequest, GitPublishResult, LocalPublisher, PublishError,
};
use crate::tracker::{build_snapshot, ExecutionError, ExecutionTracker, TrackError, TrackerConfig};
use flowcd_adapters::{
    CommitAuthor, Credentials, EngineError, RepoHost, WorkflowEngine, RESOURCE_LABEL,
};
use flowcd_core::{
    bind, ExecutionSnapshot, JobHandle, Manifest, ManifestKind, ParameterSet, RawInput,
    TemplateCatalog, ValidationError, APPLICATIONSET_TEMPLATE, APPLICATION_TEMPLATE,
    INFRASTRUCTURE_TEMPLATE,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_NAMESPACE: &str = "argo";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("cannot render manifest: {0}")]
    Render(String),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    /// The job exists but could not be followed to the end.
    #[error("job {handle} was submitted but tracking stopped: {source}")]
    Track { handle: JobHandle, source: TrackError },
    #[error("job {0} not found")]
    JobNotFound(JobHandle),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Adapters the orchestrator drives.
pub struct FlowDeps<E, H> {
    pub engine: E,
    pub repo: H,
}

impl<E, H> FlowDeps<E, H> {
    pub fn new(engine: E, repo: H) -> Self {
        Self { engine, repo }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// Namespace jobs and templates live in.
    pub namespace: String,
    pub tracker: TrackerConfig,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self { namespace: DEFAULT_NAMESPACE.to_string(), tracker: TrackerConfig::default() }
    }
}

/// Repository coordinates for publishing.
#[derive(Debug, Clone)]
pub struct GitTarget {
    pub repo_url: String,
    pub branch: String,
    pub path: String,
    pub author: Option<CommitAuthor>,
    pub credentials: Option<Credentials>,
}

/// Where a succeeded job's manifest goes.
#[derive(Debug, Clone)]
pub enum PublishTarget {
    Git(GitTarget),
    /// A directory standing in for the repository checkout.
    Local { dir: PathBuf, path: String },
}

/// Input for one end-to-end flow.
#[derive(Debug, Clone, Default)]
pub struct FlowRequest {
    pub input: RawInput,
    /// Exact job name instead of a generated one.
    pub job_name: Option<String>,
    pub publish: Vec<PublishTarget>,
}

/// A manifest rendered from validated input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub params: ParameterSet,
    pub manifest: Manifest,
    pub text: String,
}

/// A job accepted by the engine, not yet followed.
#[derive(Debug, Clone)]
pub struct Submitted {
    pub handle: JobHandle,
    pub rendered: Option<Rendered>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    /// The job did not succeed, so nothing was published.
    Skipped,
    Published(GitPublishResult),
    Failed { result: GitPublishResult, error: PublishError },
}

/// Outcome of an end-to-end flow.
#[derive(Debug, Clone)]
pub struct FlowReport {
    pub handle: JobHandle,
    /// Final snapshot of the job.
    pub snapshot: ExecutionSnapshot,
    /// Set when the job ended Failed or Error.
    pub failure: Option<ExecutionError>,
    /// One entry per requested target, in request order.
    pub publish: Vec<PublishStatus>,
}

impl FlowReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// First publish error, if any target failed.
    pub fn publish_error(&self) -> Option<&PublishError> {
        self.publish.iter().find_map(|status| match status {
            PublishStatus::Failed { error, .. } => Some(error),
            _ => None,
        })
    }
}

/// Which jobs a teardown removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownTarget {
    Job(JobHandle),
    /// Every job in the configured namespace carrying these labels.
    Labels(BTreeMap<String, String>),
    /// Every job created for this resource name.
    Resource(String),
}

/// A job as listed, with the labels flowcd put on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub template: Option<String>,
    pub resource: Option<String>,
    pub snapshot: ExecutionSnapshot,
}

/// Catalog template compared against the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateStatus {
    pub in_catalog: bool,
    pub installed: bool,
}

/// Bind `input` and render the manifest for `kind`, without touching the
/// cluster. Publishing writes exactly `text`.
pub fn render(catalog: &TemplateCatalog, kind: ManifestKind, input: &RawInput) -> Result<Rendered, FlowError> {
    let template_name = match kind {
        ManifestKind::Application => APPLICATION_TEMPLATE,
        ManifestKind::ApplicationSet => APPLICATIONSET_TEMPLATE,
    };
    let template = catalog
        .get(template_name)
        .ok_or_else(|| ValidationError::UnknownTemplate(template_name.to_string()))?;
    let params = bind(template, input)?;
    let manifest = match kind {
        ManifestKind::Application => Manifest::application(&params)?,
        ManifestKind::ApplicationSet => Manifest::application_set(&params)?,
    };
    let text = manifest.render().map_err(|e| FlowError::Render(e.to_string()))?;
    Ok(Rendered { params, manifest, text })
}

pub struct Orchestrator<E, H> {
    engine: E,
    catalog: TemplateCatalog,
    gateway: SubmissionGateway<E>,
    tracker: ExecutionTracker<E>,
    logs: LogAggregator<E>,
    publisher: GitOpsPublisher<H>,
    config: FlowConfig,
}

impl<E: WorkflowEngine, H: RepoHost> Orchestrator<E, H> {
    pub fn new(deps: FlowDeps<E, H>, config: FlowConfig) -> Self {
        Self {
            catalog: TemplateCatalog::builtin(),
            gateway: SubmissionGateway::new(deps.engine.clone()),
            tracker: ExecutionTracker::new(deps.engine.clone(), config.tracker),
            logs: LogAggregator::new(deps.engine.clone(), config.tracker),
            publisher: GitOpsPublisher::new(deps.repo),
            engine: deps.engine,
            config,
        }
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn tracker(&self) -> &ExecutionTracker<E> {
        &self.tracker
    }

    pub fn logs(&self) -> &LogAggregator<E> {
        &self.logs
    }

    pub fn handle(&self, name: &str) -> JobHandle {
        JobHandle::new(name, &self.config.namespace)
    }

    /// Create an application, follow it, and publish its manifest on success.
    pub async fn submit_application(
        &self,
        request: &FlowRequest,
        cancel: CancellationToken,
        on_update: impl FnMut(&ExecutionSnapshot) + Send,
    ) -> Result<FlowReport, FlowError> {
        let submitted = self.submit(ManifestKind::Application, request).await?;
        self.complete(submitted, &request.publish, cancel, on_update).await
    }

    /// Same flow for an application set.
    pub async fn submit_applicationset(
        &self,
        request: &FlowRequest,
        cancel: CancellationToken,
        on_update: impl FnMut(&ExecutionSnapshot) + Send,
    ) -> Result<FlowReport, FlowError> {
        let submitted = self.submit(ManifestKind::ApplicationSet, request).await?;
        self.complete(submitted, &request.publish, cancel, on_update).await
    }

    /// Provision prerequisites. There is no manifest, so nothing is published.
    pub async fn provision(
        &self,
        input: &RawInput,
        cancel: CancellationToken,
        on_update: impl FnMut(&ExecutionSnapshot) + Send,
    ) -> Result<FlowReport, FlowError> {
        let template = self
            .catalog
            .get(INFRASTRUCTURE_TEMPLATE)
            .ok_or_else(|| ValidationError::UnknownTemplate(INFRASTRUCTURE_TEMPLATE.to_string()))?;
        let params = bind(template, input)?;
        let handle = self
            .gateway
            .submit(INFRASTRUCTURE_TEMPLATE, &params, &self.config.namespace)
            .await?;
        let submitted = Submitted { handle, rendered: None };
        self.complete(submitted, &[], cancel, on_update).await
    }

    /// Validate, render and submit without waiting for the job.
    pub async fn submit(&self, kind: ManifestKind, request: &FlowRequest) -> Result<Submitted, FlowError> {
        let rendered = render(&self.catalog, kind, &request.input)?;
        let mut labels = BTreeMap::new();
        labels.insert(RESOURCE_LABEL.to_string(), rendered.manifest.name().to_string());
        let options = SubmitOptions { name: request.job_name.clone(), labels };
        let handle = self
            .gateway
            .submit_with(rendered.params.template(), &rendered.params, &self.config.namespace, &options)
            .await?;
        Ok(Submitted { handle, rendered: Some(rendered) })
    }

    /// Follow a submitted job to its end, then publish if it succeeded.
    pub async fn complete(
        &self,
        submitted: Submitted,
        targets: &[PublishTarget],
        cancel: CancellationToken,
        on_update: impl FnMut(&ExecutionSnapshot) + Send,
    ) -> Result<FlowReport, FlowError> {
        let handle = submitted.handle;
        let started = std::time::Instant::now();
        let snapshot = self
            .tracker
            .wait_terminal(&handle, cancel, on_update)
            .await
            .map_err(|source| FlowError::Track { handle: handle.clone(), source })?;
        let failure = ExecutionError::from_snapshot(&snapshot);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let publish = match (&failure, &submitted.rendered) {
            (None, Some(rendered)) => {
                tracing::info!(job = %handle, elapsed_ms, "job succeeded");
                let mut statuses = Vec::with_capacity(targets.len());
                for target in targets {
                    statuses.push(self.publish_to(target, rendered).await);
                }
                statuses
            }
            (None, None) => {
                tracing::info!(job = %handle, elapsed_ms, "job succeeded");
                Vec::new()
            }
            (Some(failure), _) => {
                tracing::warn!(job = %handle, elapsed_ms, error = %failure, "job did not succeed");
                targets.iter().map(|_| PublishStatus::Skipped).collect()
            }
        };
        Ok(FlowReport { handle, snapshot, failure, publish })
    }

    async fn publish_to(&self, target: &PublishTarget, rendered: &Rendered) -> PublishStatus {
        let manifest = &rendered.manifest;
        let result = match target {
            PublishTarget::Git(git) => {
                let mut request = GitPublishRequest::new(
                    git.repo_url.as_str(),
                    manifest.kind(),
                    manifest.name(),
                    rendered.text.as_bytes(),
                )
                .branch(git.branch.as_str())
                .path(git.path.as_str());
                request.author = git.author.clone();
                request.credentials = git.credentials.clone();
                self.publisher.publish(&request).await.map_err(|e| (e, request.file_path()))
            }
            PublishTarget::Local { dir, path } => LocalPublisher::new(dir)
                .publish(path, manifest.name(), rendered.text.as_bytes())
                .await
                .map_err(|e| (e, crate::publisher::manifest_path(path, manifest.name()))),
        };
        match result {
            Ok(result) => PublishStatus::Published(result),
            Err((error, path)) => {
                tracing::error!(resource = %manifest.name(), %path, %error, "manifest publish failed");
                PublishStatus::Failed { result: GitPublishResult::failed(path), error }
            }
        }
    }

    /// Delete jobs; returns what was removed.
    ///
    /// A single job that does not exist is an error. Label and resource
    /// teardowns remove whatever matches, possibly nothing.
    pub async fn teardown(&self, target: &TeardownTarget, retain_pods: bool) -> Result<Vec<JobHandle>, FlowError> {
        let labels = match target {
            TeardownTarget::Job(handle) => {
                return match self.engine.delete(handle, retain_pods).await {
                    Ok(()) => {
                        tracing::info!(job = %handle, retain_pods, "job deleted");
                        Ok(vec![handle.clone()])
                    }
                    Err(EngineError::NotFound(_)) => Err(FlowError::JobNotFound(handle.clone())),
                    Err(e) => Err(e.into()),
                };
            }
            TeardownTarget::Labels(labels) => labels.clone(),
            TeardownTarget::Resource(name) => BTreeMap::from([(RESOURCE_LABEL.to_string(), name.clone())]),
        };

        let mut deleted = Vec::new();
        for doc in self.engine.list(&self.config.namespace, &labels).await? {
            match self.engine.delete(&doc.handle, retain_pods).await {
                Ok(()) => {
                    tracing::info!(job = %doc.handle, retain_pods, "job deleted");
                    deleted.push(doc.handle);
                }
                // Gone between list and delete.
                Err(EngineError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(deleted)
    }

    /// Current snapshot of a job that must exist.
    pub async fn status(&self, handle: &JobHandle) -> Result<ExecutionSnapshot, FlowError> {
        match self.engine.get(handle).await? {
            Some(doc) => Ok(build_snapshot(handle, Some(doc), None)),
            None => Err(FlowError::JobNotFound(handle.clone())),
        }
    }

    /// Jobs in the configured namespace matching `labels`, newest first.
    pub async fn list_jobs(&self, labels: &BTreeMap<String, String>) -> Result<Vec<JobSummary>, FlowError> {
        let docs = self.engine.list(&self.config.namespace, labels).await?;
        let mut jobs: Vec<JobSummary> = docs
            .into_iter()
            .map(|doc| {
                let template = doc.template().map(String::from);
                let resource = doc.labels.get(RESOURCE_LABEL).cloned();
                let handle = doc.handle.clone();
                JobSummary { template, resource, snapshot: build_snapshot(&handle, Some(doc), None) }
            })
            .collect();
        jobs.sort_by(|a, b| {
            b.snapshot
                .started_at
                .cmp(&a.snapshot.started_at)
                .then_with(|| a.snapshot.handle.cmp(&b.snapshot.handle))
        });
        Ok(jobs)
    }

    /// Apply catalog templates to the cluster; `only` restricts to one.
    pub async fn install_templates(&self, only: Option<&str>) -> Result<Vec<String>, FlowError> {
        if let Some(name) = only {
            if self.catalog.get(name).is_none() {
                return Err(ValidationError::UnknownTemplate(name.to_string()).into());
            }
        }
        let mut installed = Vec::new();
        for template in self.catalog.iter().filter(|t| only.is_none_or(|name| t.name == name)) {
            let doc = template.to_workflow_template(&self.config.namespace);
            self.engine.apply_template(&doc).await?;
            tracing::info!(template = %template.name, namespace = %self.config.namespace, "template installed");
            installed.push(template.name.clone());
        }
        Ok(installed)
    }

    /// Catalog templates and cluster templates, side by side.
    pub async fn template_status(&self) -> Result<BTreeMap<String, TemplateStatus>, FlowError> {
        let cluster: BTreeSet<String> = self.engine.list_templates(&self.config.namespace).await?;
        let mut status: BTreeMap<String, TemplateStatus> = self
            .catalog
            .names()
            .map(|name| {
                let installed = cluster.contains(name);
                (name.to_string(), TemplateStatus { in_catalog: true, installed })
            })
            .collect();
        for name in cluster {
            status.entry(name).or_insert(TemplateStatus { in_catalog: false, installed: true });
        }
        Ok(status)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
