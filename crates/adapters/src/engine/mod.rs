// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow engine boundary
//!
//! The `WorkflowEngine` trait is everything the core needs from the cluster:
//! submitting jobs from installed templates, reading a job's node tree,
//! deleting jobs, and reading step output.
//!
//! # Module layout
//!
//! - [`argo`]: conversion between engine resources and domain types
//! - [`k8s`]: implementation against a Kubernetes API server

pub mod argo;
mod k8s;

pub use k8s::KubeEngine;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowcd_core::{JobHandle, NodeRecord, Phase, WorkflowTemplateDoc};
use futures_util::stream::BoxStream;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use thiserror::Error;

/// Label carrying the template a job was submitted from.
pub const TEMPLATE_LABEL: &str = "flowcd.io/template";
/// Label carrying the deployment resource a job creates.
pub const RESOURCE_LABEL: &str = "flowcd.io/resource";

/// Errors from engine operations, classified by the API response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Classify an HTTP status returned by the engine's API server.
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            404 => EngineError::NotFound(message),
            409 => EngineError::Conflict(message),
            401 | 403 => EngineError::Forbidden(message),
            400 | 422 => EngineError::Invalid(message),
            _ => EngineError::Unavailable(format!("{code}: {message}")),
        }
    }
}

/// Name requested for a new job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobName {
    /// Use this name as is; collisions surface as [`EngineError::Conflict`].
    Exact(String),
    /// Let the engine append a unique suffix to this prefix.
    Prefix(String),
}

impl std::fmt::Display for JobName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobName::Exact(name) => f.write_str(name),
            JobName::Prefix(prefix) => write!(f, "{prefix}*"),
        }
    }
}

/// A job to create from an installed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub template: String,
    pub name: JobName,
    pub namespace: String,
    /// Parameter values in schema order.
    pub parameters: Vec<(String, String)>,
    pub labels: BTreeMap<String, String>,
}

/// A job as reported by the engine on one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDocument {
    pub handle: JobHandle,
    pub phase: Phase,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Flat node list; parents are referenced by id.
    pub nodes: Vec<NodeRecord>,
    pub labels: BTreeMap<String, String>,
    /// Opaque version for change notification.
    pub resource_version: Option<String>,
}

impl WorkflowDocument {
    pub fn template(&self) -> Option<&str> {
        self.labels.get(TEMPLATE_LABEL).map(String::as_str)
    }
}

/// Raw log lines of one node, each prefixed with an RFC 3339 timestamp.
pub type LogLineStream = BoxStream<'static, Result<String, EngineError>>;

/// Adapter for the cluster-side workflow engine
#[async_trait]
pub trait WorkflowEngine: Clone + Send + Sync + 'static {
    /// Create a job; returns once the engine has accepted it.
    async fn submit(&self, request: &SubmitRequest) -> Result<JobHandle, EngineError>;

    /// Read a job. `None` when the job does not exist (yet).
    async fn get(&self, handle: &JobHandle) -> Result<Option<WorkflowDocument>, EngineError>;

    /// Delete a job. With `retain_pods`, its pods (and their logs) are left behind.
    async fn delete(&self, handle: &JobHandle, retain_pods: bool) -> Result<(), EngineError>;

    /// Names of the templates installed in `namespace`.
    async fn list_templates(&self, namespace: &str) -> Result<BTreeSet<String>, EngineError>;

    /// Jobs in `namespace` carrying every label in `labels`.
    async fn list(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<WorkflowDocument>, EngineError>;

    /// Create or replace a template.
    async fn apply_template(&self, template: &WorkflowTemplateDoc) -> Result<(), EngineError>;

    /// Block until the job changes after `since` or `timeout` elapses,
    /// whichever comes first. Engines without push notification just wait.
    async fn wait_for_change(
        &self,
        _handle: &JobHandle,
        _since: Option<&str>,
        timeout: Duration,
    ) -> Result<(), EngineError> {
        tokio::time::sleep(timeout).await;
        Ok(())
    }

    /// Output of a finished or running node, up to now.
    async fn node_logs(&self, handle: &JobHandle, node_id: &str) -> Result<Vec<String>, EngineError>;

    /// Output of a node, following until the node's container exits.
    async fn follow_node_logs(
        &self,
        handle: &JobHandle,
        node_id: &str,
    ) -> Result<LogLineStream, EngineError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{job_document, EngineCall, FakeWorkflowEngine};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
