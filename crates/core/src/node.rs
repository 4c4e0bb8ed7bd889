// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Nodes of a job's execution graph.
//!
//! The engine reports nodes as flat [`NodeRecord`]s that point at their
//! parent by id. [`NodeState`] is the resolved view exposed in snapshots,
//! produced by [`crate::tree::NodeTree`].

use crate::phase::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeKind {
    /// Runs a container (a pod on the cluster). Only these produce logs.
    Container,
    /// Groups other nodes (steps, DAG, retry wrapper).
    #[default]
    Group,
    /// Guarded by a condition; may be skipped.
    Conditional,
}

impl NodeKind {
    /// Map the engine's node type string.
    pub fn from_engine(raw: &str) -> Self {
        match raw {
            "Pod" | "Container" | "HTTP" | "Plugin" => NodeKind::Container,
            "Skipped" | "Suspend" => NodeKind::Conditional,
            _ => NodeKind::Group,
        }
    }
}

crate::simple_display! {
    NodeKind {
        Container => "container",
        Group => "group",
        Conditional => "conditional",
    }
}

/// One node as reported by the engine in a single poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Engine-unique node id (also the pod name for container nodes).
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub kind: NodeKind,
    pub phase: Phase,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Id of the parent node, if any.
    pub parent: Option<String>,
}

crate::builder! {
    pub struct NodeRecordBuilder => NodeRecord {
        into {
            id: String = "node",
            name: String = "job.node",
            display_name: String = "node",
            message: String = "",
        }
        set {
            kind: NodeKind = NodeKind::Container,
            phase: Phase = Phase::Pending,
        }
        option {
            started_at: DateTime<Utc> = None,
            finished_at: DateTime<Utc> = None,
            parent: String = None,
        }
    }
}

/// Resolved state of one node inside an [`crate::ExecutionSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub kind: NodeKind,
    pub phase: Phase,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Parent id as reported; lookup only.
    pub parent: Option<String>,
    /// Child ids present in the same poll, in display order.
    pub children: Vec<String>,
    /// Distance from the node's root (0 for roots).
    pub depth: usize,
    /// The reported parent is not (yet) part of the response, so the node is
    /// rendered as a root until a later poll resolves it.
    pub detached: bool,
}

impl NodeState {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
