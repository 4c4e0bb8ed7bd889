// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submission gateway
//!
//! Turns a bound [`ParameterSet`] into a job on the cluster. Success means
//! the engine accepted the job, nothing more; progress is observed through
//! the tracker.

use flowcd_adapters::{EngineError, JobName, SubmitRequest, WorkflowEngine, TEMPLATE_LABEL};
use flowcd_core::{JobHandle, ParameterSet};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Attempts made when the engine reports a name collision.
pub const SUBMIT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("template {template} is not installed in namespace {namespace}")]
    TemplateNotFound { template: String, namespace: String },
    #[error("job name {name} still taken after {attempts} attempt(s)")]
    ConflictExhausted { attempts: u32, name: String },
    #[error("parameters were bound for {bound}, not {template}")]
    TemplateMismatch { template: String, bound: String },
    #[error("submission rejected: {0}")]
    Rejected(EngineError),
}

impl SubmissionError {
    /// Whether submitting the same request again may succeed.
    ///
    /// Only name collisions are transient; rejections (RBAC, connectivity,
    /// invalid resources) need someone to act first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmissionError::ConflictExhausted { .. })
    }
}

/// Per-submission options.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Exact job name. When unset the engine generates one from the
    /// template name.
    pub name: Option<String>,
    /// Extra labels for the job.
    pub labels: BTreeMap<String, String>,
}

/// Submits jobs from installed templates.
#[derive(Clone)]
pub struct SubmissionGateway<E> {
    engine: E,
    /// (namespace, template) pairs seen installed. Advisory: a stale entry
    /// only skips the listing, and the submit itself still fails.
    installed: Arc<RwLock<HashSet<(String, String)>>>,
}

impl<E: WorkflowEngine> SubmissionGateway<E> {
    pub fn new(engine: E) -> Self {
        Self { engine, installed: Arc::new(RwLock::new(HashSet::new())) }
    }

    pub async fn submit(
        &self,
        template: &str,
        params: &ParameterSet,
        namespace: &str,
    ) -> Result<JobHandle, SubmissionError> {
        self.submit_with(template, params, namespace, &SubmitOptions::default()).await
    }

    pub async fn submit_with(
        &self,
        template: &str,
        params: &ParameterSet,
        namespace: &str,
        options: &SubmitOptions,
    ) -> Result<JobHandle, SubmissionError> {
        if params.template() != template {
            return Err(SubmissionError::TemplateMismatch {
                template: template.to_string(),
                bound: params.template().to_string(),
            });
        }
        self.ensure_installed(template, namespace).await?;

        let mut labels = options.labels.clone();
        labels.insert(TEMPLATE_LABEL.to_string(), template.to_string());
        let parameters: Vec<(String, String)> =
            params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();

        let (name, attempts) = match &options.name {
            Some(name) => (JobName::Exact(name.clone()), 1),
            None => (JobName::Prefix(format!("{template}-")), SUBMIT_ATTEMPTS),
        };
        let request = SubmitRequest {
            template: template.to_string(),
            name,
            namespace: namespace.to_string(),
            parameters,
            labels,
        };
        for attempt in 1..=attempts {
            match self.engine.submit(&request).await {
                Ok(handle) => {
                    tracing::info!(job = %handle, template, attempt, "job submitted");
                    return Ok(handle);
                }
                Err(EngineError::Conflict(message)) => {
                    tracing::warn!(name = %request.name, attempt, %message, "job name collision");
                }
                Err(EngineError::NotFound(message)) => {
                    tracing::warn!(template, namespace, %message, "template vanished before submit");
                    return Err(SubmissionError::TemplateNotFound {
                        template: template.to_string(),
                        namespace: namespace.to_string(),
                    });
                }
                Err(err) => {
                    tracing::error!(template, namespace, error = %err, "submission rejected");
                    return Err(SubmissionError::Rejected(err));
                }
            }
        }
        Err(SubmissionError::ConflictExhausted { attempts, name: request.name.to_string() })
    }

    /// Live check that `template` exists, skipped once it has been seen.
    async fn ensure_installed(&self, template: &str, namespace: &str) -> Result<(), SubmissionError> {
        let key = (namespace.to_string(), template.to_string());
        if self.installed.read().contains(&key) {
            return Ok(());
        }
        let installed =
            self.engine.list_templates(namespace).await.map_err(SubmissionError::Rejected)?;
        if !installed.contains(template) {
            return Err(SubmissionError::TemplateNotFound {
                template: template.to_string(),
                namespace: namespace.to_string(),
            });
        }
        self.installed.write().insert(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
