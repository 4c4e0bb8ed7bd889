// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow engine backed by the Kubernetes API.
//!
//! Jobs and templates are Argo custom resources handled as
//! [`DynamicObject`]s; step output is read from the `main` container of the
//! pod that ran each node.

use super::argo::{self, MAIN_CONTAINER, POD_NODE_ANNOTATION, POD_WORKFLOW_LABEL};
use super::{EngineError, JobName, LogLineStream, SubmitRequest, WorkflowDocument, WorkflowEngine};
use async_trait::async_trait;
use flowcd_core::{JobHandle, WorkflowTemplateDoc};
use futures_util::stream::{self, StreamExt};
use futures_util::AsyncBufReadExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{
    Api, ApiResource, DeleteParams, DynamicObject, GroupVersionKind, ListParams, LogParams, Patch,
    PatchParams, PostParams, PropagationPolicy, WatchParams,
};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::sync::mpsc;

/// Field manager recorded on server-side applies.
const FIELD_MANAGER: &str = "flowcd";

/// Engine talking to an Argo Workflows controller through the API server.
#[derive(Clone)]
pub struct KubeEngine {
    client: Client,
}

impl KubeEngine {
    /// Connect using the ambient kubeconfig, optionally pinned to a context.
    pub async fn connect(context: Option<&str>) -> Result<Self, EngineError> {
        let client = match context {
            None => Client::try_default().await.map_err(classify)?,
            Some(context) => {
                let options =
                    KubeConfigOptions { context: Some(context.to_string()), ..Default::default() };
                let config = Config::from_kubeconfig(&options).await.map_err(|e| {
                    EngineError::Unavailable(format!("failed to load kube context {context}: {e}"))
                })?;
                Client::try_from(config).map_err(classify)?
            }
        };
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn workflows(&self, namespace: &str) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(argo::GROUP, argo::VERSION, argo::WORKFLOW_KIND);
        let resource = ApiResource::from_gvk_with_plural(&gvk, argo::WORKFLOW_PLURAL);
        Api::namespaced_with(self.client.clone(), namespace, &resource)
    }

    fn templates(&self, namespace: &str) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(argo::GROUP, argo::VERSION, argo::TEMPLATE_KIND);
        let resource = ApiResource::from_gvk_with_plural(&gvk, argo::TEMPLATE_PLURAL);
        Api::namespaced_with(self.client.clone(), namespace, &resource)
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Name of the pod that ran `node_id`.
    ///
    /// Pods are matched by the controller's node-id annotation; older
    /// controllers name the pod after the node, which is the fallback.
    async fn resolve_pod(&self, handle: &JobHandle, node_id: &str) -> Result<String, EngineError> {
        let params =
            ListParams::default().labels(&format!("{POD_WORKFLOW_LABEL}={}", handle.name));
        let pods = self.pods(&handle.namespace).list(&params).await.map_err(classify)?;
        let found = pods.items.into_iter().find_map(|pod| {
            let annotated = pod
                .metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get(POD_NODE_ANNOTATION))
                .is_some_and(|id| id == node_id);
            if annotated {
                pod.metadata.name
            } else {
                None
            }
        });
        Ok(found.unwrap_or_else(|| node_id.to_string()))
    }
}

fn log_params(follow: bool) -> LogParams {
    LogParams {
        container: Some(MAIN_CONTAINER.to_string()),
        timestamps: true,
        follow,
        ..Default::default()
    }
}

fn to_document(object: &DynamicObject) -> Result<WorkflowDocument, EngineError> {
    let value = serde_json::to_value(object)
        .map_err(|e| EngineError::Invalid(format!("unreadable workflow: {e}")))?;
    argo::parse_workflow(&value)
        .ok_or_else(|| EngineError::Invalid("workflow without a name".to_string()))
}

fn to_object(value: serde_json::Value) -> Result<DynamicObject, EngineError> {
    serde_json::from_value(value).map_err(|e| EngineError::Invalid(e.to_string()))
}

fn label_selector(labels: &BTreeMap<String, String>) -> String {
    labels.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(",")
}

/// Map a client error onto the engine taxonomy.
fn classify(err: kube::Error) -> EngineError {
    match err {
        kube::Error::Api(response) => EngineError::from_status(response.code, response.message),
        other => EngineError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl WorkflowEngine for KubeEngine {
    async fn submit(&self, request: &SubmitRequest) -> Result<JobHandle, EngineError> {
        let object = to_object(argo::workflow_body(request))?;
        tracing::info!(
            name = %request.name,
            namespace = %request.namespace,
            template = %request.template,
            "creating workflow"
        );
        let created = self
            .workflows(&request.namespace)
            .create(&PostParams::default(), &object)
            .await
            .map_err(classify)?;
        let name = match (created.metadata.name, &request.name) {
            (Some(name), _) => name,
            (None, JobName::Exact(name)) => name.clone(),
            (None, JobName::Prefix(prefix)) => {
                return Err(EngineError::Invalid(format!(
                    "engine created a workflow from prefix {prefix} without naming it"
                )));
            }
        };
        tracing::debug!(%name, "workflow created");
        Ok(JobHandle::new(name, &request.namespace))
    }

    async fn get(&self, handle: &JobHandle) -> Result<Option<WorkflowDocument>, EngineError> {
        let object =
            self.workflows(&handle.namespace).get_opt(&handle.name).await.map_err(classify)?;
        object.as_ref().map(to_document).transpose()
    }

    async fn delete(&self, handle: &JobHandle, retain_pods: bool) -> Result<(), EngineError> {
        let policy =
            if retain_pods { PropagationPolicy::Orphan } else { PropagationPolicy::Background };
        let params = DeleteParams { propagation_policy: Some(policy), ..Default::default() };
        tracing::info!(job = %handle, retain_pods, "deleting workflow");
        self.workflows(&handle.namespace).delete(&handle.name, &params).await.map_err(classify)?;
        Ok(())
    }

    async fn list_templates(&self, namespace: &str) -> Result<BTreeSet<String>, EngineError> {
        let list =
            self.templates(namespace).list(&ListParams::default()).await.map_err(classify)?;
        Ok(list.items.into_iter().filter_map(|t| t.metadata.name).collect())
    }

    async fn list(
        &self,
        namespace: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<WorkflowDocument>, EngineError> {
        let params = ListParams::default().labels(&label_selector(labels));
        let list = self.workflows(namespace).list(&params).await.map_err(classify)?;
        list.items.iter().map(to_document).collect()
    }

    async fn apply_template(&self, template: &WorkflowTemplateDoc) -> Result<(), EngineError> {
        let value = serde_json::to_value(template)
            .map_err(|e| EngineError::Invalid(format!("unserializable template: {e}")))?;
        let object = to_object(value)?;
        let name = &template.metadata.name;
        tracing::info!(%name, namespace = %template.metadata.namespace, "applying workflow template");
        self.templates(&template.metadata.namespace)
            .patch(name, &PatchParams::apply(FIELD_MANAGER).force(), &Patch::Apply(&object))
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn wait_for_change(
        &self,
        handle: &JobHandle,
        since: Option<&str>,
        timeout: Duration,
    ) -> Result<(), EngineError> {
        // Without a version to watch from, every object would replay as new.
        let Some(version) = since else {
            tokio::time::sleep(timeout).await;
            return Ok(());
        };
        let seconds = u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX).max(1);
        let params =
            WatchParams::default().fields(&format!("metadata.name={}", handle.name)).timeout(seconds);
        let api = self.workflows(&handle.namespace);
        let watched = tokio::time::timeout(timeout, async {
            let mut events = api.watch(&params, version).await.map_err(classify)?.boxed();
            // Any event, including a watch error, means "poll again".
            events.next().await;
            Ok::<(), EngineError>(())
        })
        .await;
        watched.unwrap_or(Ok(()))
    }

    async fn node_logs(&self, handle: &JobHandle, node_id: &str) -> Result<Vec<String>, EngineError> {
        let pod = self.resolve_pod(handle, node_id).await?;
        let text = self
            .pods(&handle.namespace)
            .logs(&pod, &log_params(false))
            .await
            .map_err(classify)?;
        Ok(text.lines().map(String::from).collect())
    }

    async fn follow_node_logs(
        &self,
        handle: &JobHandle,
        node_id: &str,
    ) -> Result<LogLineStream, EngineError> {
        let pod = self.resolve_pod(handle, node_id).await?;
        let pods = self.pods(&handle.namespace);
        let (tx, rx) = mpsc::channel::<Result<String, EngineError>>(64);

        tokio::spawn(async move {
            let reader = match pods.log_stream(&pod, &log_params(true)).await {
                Ok(reader) => reader,
                Err(e) => {
                    let _ = tx.send(Err(classify(e))).await;
                    return;
                }
            };
            let lines = reader.lines();
            futures_util::pin_mut!(lines);
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    line = lines.next() => {
                        let Some(line) = line else { break };
                        let line = line.map_err(|e| EngineError::Unavailable(e.to_string()));
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!(%pod, "log stream closed");
        });

        Ok(stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) })
            .boxed())
    }
}
