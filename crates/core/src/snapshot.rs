// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time view of a job.

use crate::handle::JobHandle;
use crate::node::NodeState;
use crate::phase::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completed vs known leaf nodes, rendered as `m/n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.done, self.total)
    }
}

/// Immutable snapshot of a job, replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSnapshot {
    pub handle: JobHandle,
    pub phase: Phase,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub progress: Progress,
    /// Job-level message from the engine (usually set on failure).
    pub message: String,
    pub nodes: Vec<NodeState>,
}

impl ExecutionSnapshot {
    /// Snapshot for a job the engine has accepted but not yet materialized.
    pub fn pending(handle: JobHandle) -> Self {
        Self {
            handle,
            phase: Phase::Pending,
            started_at: None,
            finished_at: None,
            progress: Progress::default(),
            message: String::new(),
            nodes: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Job-level message followed by every failed node's message.
    pub fn failure_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if !self.message.is_empty() {
            messages.push(self.message.clone());
        }
        messages.extend(
            self.nodes
                .iter()
                .filter(|n| n.phase.is_failure() && !n.message.is_empty())
                .map(|n| format!("{}: {}", n.display_name, n.message)),
        );
        messages
    }

    pub fn node(&self, id: &str) -> Option<&NodeState> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
