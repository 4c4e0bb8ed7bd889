// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argo Workflows resource shapes.
//!
//! Workflows are handled as untyped JSON: only the handful of status fields
//! the tracker needs are read, so new engine fields never break parsing.

use super::{JobName, SubmitRequest, WorkflowDocument};
use chrono::{DateTime, Utc};
use flowcd_core::{JobHandle, NodeKind, NodeRecord, Phase};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

pub const GROUP: &str = "argoproj.io";
pub const VERSION: &str = "v1alpha1";
pub const API_VERSION: &str = "argoproj.io/v1alpha1";
pub const WORKFLOW_KIND: &str = "Workflow";
pub const WORKFLOW_PLURAL: &str = "workflows";
pub const TEMPLATE_KIND: &str = "WorkflowTemplate";
pub const TEMPLATE_PLURAL: &str = "workflowtemplates";

/// Label the controller puts on every pod of a workflow.
pub const POD_WORKFLOW_LABEL: &str = "workflows.argoproj.io/workflow";
/// Annotation naming the node a pod runs.
pub const POD_NODE_ANNOTATION: &str = "workflows.argoproj.io/node-id";
/// Container holding a step's own output.
pub const MAIN_CONTAINER: &str = "main";

/// Workflow resource referencing an installed template.
pub fn workflow_body(request: &SubmitRequest) -> Value {
    let parameters: Vec<Value> = request
        .parameters
        .iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect();
    let mut metadata = json!({
        "namespace": request.namespace,
        "labels": request.labels,
    });
    match &request.name {
        JobName::Exact(name) => metadata["name"] = json!(name),
        JobName::Prefix(prefix) => metadata["generateName"] = json!(prefix),
    }
    json!({
        "apiVersion": API_VERSION,
        "kind": WORKFLOW_KIND,
        "metadata": metadata,
        "spec": {
            "workflowTemplateRef": { "name": request.template },
            "arguments": { "parameters": parameters },
        },
    })
}

/// Read a workflow resource into a [`WorkflowDocument`].
///
/// Returns `None` when the resource has no name.
pub fn parse_workflow(value: &Value) -> Option<WorkflowDocument> {
    let metadata = value.get("metadata")?;
    let name = metadata.get("name")?.as_str()?;
    let namespace = str_at(metadata, "namespace");
    let labels: BTreeMap<String, String> = metadata
        .get("labels")
        .and_then(Value::as_object)
        .map(|labels| {
            labels
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();
    let resource_version = metadata.get("resourceVersion").and_then(Value::as_str).map(String::from);

    let status = value.get("status").cloned().unwrap_or(Value::Null);
    Some(WorkflowDocument {
        handle: JobHandle::new(name, namespace),
        phase: Phase::from_engine(&str_at(&status, "phase")),
        message: str_at(&status, "message"),
        started_at: time_at(&status, "startedAt"),
        finished_at: time_at(&status, "finishedAt"),
        nodes: parse_nodes(status.get("nodes")),
        labels,
        resource_version,
    })
}

/// Flatten the status node map into records with parent ids.
///
/// The engine lists children on the parent; each child's parent is the node
/// that lists it, falling back to its boundary node when no node does.
pub fn parse_nodes(nodes: Option<&Value>) -> Vec<NodeRecord> {
    let Some(nodes) = nodes.and_then(Value::as_object) else {
        return Vec::new();
    };
    let mut parent_of: HashMap<&str, &str> = HashMap::new();
    for (id, node) in nodes {
        let children = node.get("children").and_then(Value::as_array);
        for child in children.into_iter().flatten().filter_map(Value::as_str) {
            parent_of.entry(child).or_insert(id.as_str());
        }
    }

    nodes
        .iter()
        .map(|(key, node)| {
            let id = node.get("id").and_then(Value::as_str).unwrap_or(key);
            let boundary = node.get("boundaryID").and_then(Value::as_str).filter(|b| *b != id);
            let parent = parent_of.get(id).copied().or(boundary).map(String::from);
            NodeRecord {
                id: id.to_string(),
                name: str_at(node, "name"),
                display_name: node
                    .get("displayName")
                    .and_then(Value::as_str)
                    .unwrap_or(id)
                    .to_string(),
                kind: NodeKind::from_engine(&str_at(node, "type")),
                phase: Phase::from_engine(&str_at(node, "phase")),
                message: str_at(node, "message"),
                started_at: time_at(node, "startedAt"),
                finished_at: time_at(node, "finishedAt"),
                parent,
            }
        })
        .collect()
}

fn str_at(value: &Value, key: &str) -> String {
    value.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn time_at(value: &Value, key: &str) -> Option<DateTime<Utc>> {
    let raw = value.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(raw).ok().map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "argo_tests.rs"]
mod tests;
