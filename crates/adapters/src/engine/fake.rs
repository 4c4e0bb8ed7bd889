// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory workflow engine for tests.

use super::{EngineError, JobName, LogLineStream, SubmitRequest, WorkflowDocument, WorkflowEngine};
use async_trait::async_trait;
use flowcd_core::{JobHandle, NodeRecord, Phase, WorkflowTemplateDoc};
use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

/// Recorded engine call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Submit(SubmitRequest),
    Get(JobHandle),
    Delete { handle: JobHandle, retain_pods: bool },
    ListTemplates(String),
    List { namespace: String, labels: BTreeMap<String, String> },
    ApplyTemplate(String),
    NodeLogs { handle: JobHandle, node_id: String },
    FollowNodeLogs { handle: JobHandle, node_id: String },
}

#[derive(Default)]
struct FakeEngineState {
    templates: HashMap<String, BTreeSet<String>>,
    jobs: BTreeMap<JobHandle, WorkflowDocument>,
    /// Reads served by `get` in order; the last one repeats.
    scripted: HashMap<JobHandle, VecDeque<Option<WorkflowDocument>>>,
    submit_errors: VecDeque<EngineError>,
    /// Suffixes handed out for prefix names, then a counter.
    suffixes: VecDeque<String>,
    generated: u32,
    get_errors: VecDeque<EngineError>,
    logs: HashMap<(JobHandle, String), Vec<String>>,
    /// Nodes whose follow stream stays open after the recorded lines.
    open_logs: BTreeSet<(JobHandle, String)>,
    applied: Vec<WorkflowTemplateDoc>,
    calls: Vec<EngineCall>,
}

/// Fake engine: holds templates and jobs in memory and replays scripted reads.
#[derive(Clone, Default)]
pub struct FakeWorkflowEngine {
    inner: Arc<Mutex<FakeEngineState>>,
}

impl FakeWorkflowEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with `templates` installed in `namespace`.
    pub fn with_templates(namespace: &str, templates: &[&str]) -> Self {
        let engine = Self::new();
        for name in templates {
            engine.install_template(namespace, name);
        }
        engine
    }

    pub fn install_template(&self, namespace: &str, name: &str) {
        self.inner
            .lock()
            .templates
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string());
    }

    pub fn remove_template(&self, namespace: &str, name: &str) {
        if let Some(set) = self.inner.lock().templates.get_mut(namespace) {
            set.remove(name);
        }
    }

    /// Fail the next submits with these errors, in order.
    pub fn fail_submits(&self, errors: impl IntoIterator<Item = EngineError>) {
        self.inner.lock().submit_errors.extend(errors);
    }

    /// Complete the next prefix names with these suffixes, in order.
    pub fn script_suffixes(&self, suffixes: impl IntoIterator<Item = impl Into<String>>) {
        self.inner.lock().suffixes.extend(suffixes.into_iter().map(Into::into));
    }

    /// Fail the next reads with these errors, in order.
    pub fn fail_gets(&self, errors: impl IntoIterator<Item = EngineError>) {
        self.inner.lock().get_errors.extend(errors);
    }

    /// Store or replace a job document.
    pub fn put_job(&self, doc: WorkflowDocument) {
        self.inner.lock().jobs.insert(doc.handle.clone(), doc);
    }

    /// Serve these reads for `handle` in order, repeating the last one.
    pub fn script(&self, handle: &JobHandle, reads: impl IntoIterator<Item = Option<WorkflowDocument>>) {
        self.inner.lock().scripted.entry(handle.clone()).or_default().extend(reads);
    }

    /// Record output for a node.
    pub fn set_logs(&self, handle: &JobHandle, node_id: &str, lines: &[&str]) {
        self.inner.lock().logs.insert(
            (handle.clone(), node_id.to_string()),
            lines.iter().map(|l| l.to_string()).collect(),
        );
    }

    /// Keep the node's follow stream open after its recorded lines.
    pub fn keep_logs_open(&self, handle: &JobHandle, node_id: &str) {
        self.inner.lock().open_logs.insert((handle.clone(), node_id.to_string()));
    }

    pub fn job(&self, handle: &JobHandle) -> Option<WorkflowDocument> {
        self.inner.lock().jobs.get(handle).cloned()
    }

    pub fn applied_templates(&self) -> Vec<WorkflowTemplateDoc> {
        self.inner.lock().applied.clone()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<EngineCall> {
        self.inner.lock().calls.clone()
    }

    pub fn submits(&self) -> Vec<SubmitRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Submit(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<(JobHandle, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Delete { handle, retain_pods } => Some((handle, retain_pods)),
                _ => None,
            })
            .collect()
    }
}

/// Job document with the given phase and nodes, for scripting reads.
pub fn job_document(handle: &JobHandle, phase: Phase, nodes: Vec<NodeRecord>) -> WorkflowDocument {
    WorkflowDocument {
        handle: handle.clone(),
        phase,
        message: String::new(),
        started_at: None,
        finished_at: None,
        nodes,
        labels: BTreeMap::new(),
        resource_version: None,
    }
}

#[async_trait]
impl WorkflowEngine for FakeWorkflowEngine {
    async fn submit(&self, request: &SubmitRequest) -> Result<JobHandle, EngineError> {
        let mut inner = self.inner.lock();
        inner.calls.push(EngineCall::Submit(request.clone()));
        if let Some(err) = inner.submit_errors.pop_front() {
            return Err(err);
        }
        let installed = inner
            .templates
            .get(&request.namespace)
            .is_some_and(|set| set.contains(&request.template));
        if !installed {
            return Err(EngineError::NotFound(format!(
                "workflowtemplates.argoproj.io \"{}\" not found",
                request.template
            )));
        }
        let name = match &request.name {
            JobName::Exact(name) => name.clone(),
            JobName::Prefix(prefix) => {
                let suffix = match inner.suffixes.pop_front() {
                    Some(suffix) => suffix,
                    None => {
                        inner.generated += 1;
                        format!("{:05}", inner.generated)
                    }
                };
                format!("{prefix}{suffix}")
            }
        };
        let handle = JobHandle::new(&name, &request.namespace);
        if inner.jobs.contains_key(&handle) {
            return Err(EngineError::Conflict(format!(
                "workflows.argoproj.io \"{name}\" already exists"
            )));
        }
        let mut doc = job_document(&handle, Phase::Pending, Vec::new());
        doc.labels = request.labels.clone();
        inner.jobs.insert(handle.clone(), doc);
        Ok(handle)
    }

    async fn get(&self, handle: &JobHandle) -> Result<Option<WorkflowDocument>, EngineError> {
        let mut inner = self.inner.lock();
        inner.calls.push(EngineCall::Get(handle.clone()));
        if let Some(err) = inner.get_errors.pop_front() {
            return Err(err);
        }
        if let Some(queue) = inner.scripted.get_mut(handle) {
            let read = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
            if let Some(read) = read {
                return Ok(read);
            }
        }
        Ok(inner.jobs.get(handle).cloned())
    }

    async fn delete(&self, handle: &JobHandle, retain_pods: bool) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        inner.calls.push(EngineCall::Delete { handle: handle.clone(), retain_pods });
        inner.scripted.remove(handle);
        match inner.jobs.remove(handle) {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound(format!(
                "workflows.argoproj.io \"{}\" not found",
                handle.name
            ))),
        }
    }

    async fn list_templates(&self, namespace: &str) -> Result<BTreeSet<String>, EngineError> {
        let mut inner = self.inner.lock();
        inner.calls.push(EngineCall::ListTemplates(namespace.to_string()));
        Ok(inner.templates.get(namespace).cloned().unwrap_or_default())
    }

    async fn list(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<WorkflowDocument>, EngineError> {
        let mut inner = self.inner.lock();
        inner.calls.push(EngineCall::List {
            namespace: namespace.to_string(),
            labels: labels.clone(),
        });
        Ok(inner
            .jobs
            .values()
            .filter(|doc| doc.handle.namespace == namespace)
            .filter(|doc| labels.iter().all(|(k, v)| doc.labels.get(k) == Some(v)))
            .cloned()
            .collect())
    }

    async fn apply_template(&self, template: &WorkflowTemplateDoc) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        inner.calls.push(EngineCall::ApplyTemplate(template.metadata.name.clone()));
        inner
            .templates
            .entry(template.metadata.namespace.clone())
            .or_default()
            .insert(template.metadata.name.clone());
        inner.applied.push(template.clone());
        Ok(())
    }

    async fn node_logs(&self, handle: &JobHandle, node_id: &str) -> Result<Vec<String>, EngineError> {
        let mut inner = self.inner.lock();
        inner.calls.push(EngineCall::NodeLogs { handle: handle.clone(), node_id: node_id.to_string() });
        inner
            .logs
            .get(&(handle.clone(), node_id.to_string()))
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("pods \"{node_id}\" not found")))
    }

    async fn follow_node_logs(
        &self,
        handle: &JobHandle,
        node_id: &str,
    ) -> Result<LogLineStream, EngineError> {
        let mut inner = self.inner.lock();
        inner
            .calls
            .push(EngineCall::FollowNodeLogs { handle: handle.clone(), node_id: node_id.to_string() });
        let key = (handle.clone(), node_id.to_string());
        let lines = inner
            .logs
            .get(&key)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("pods \"{node_id}\" not found")))?;
        let recorded = stream::iter(lines.into_iter().map(Ok));
        if inner.open_logs.contains(&key) {
            Ok(recorded.chain(stream::pending()).boxed())
        } else {
            Ok(recorded.boxed())
        }
    }
}
