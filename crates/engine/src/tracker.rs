// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution tracker
//!
//! Reads a job from the engine and turns it into [`ExecutionSnapshot`]s.
//! One-shot reads and the long-lived watch share the same snapshot logic;
//! the watch only adds a cancellable wait between reads.

use flowcd_adapters::{EngineError, WorkflowDocument, WorkflowEngine};
use flowcd_core::{pin_terminal, ExecutionSnapshot, JobHandle, NodeTree, Phase};
use futures_util::stream::{self, BoxStream, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("job {0} no longer exists")]
    JobVanished(JobHandle),
    #[error("tracking cancelled")]
    Cancelled,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A job that ended without succeeding.
///
/// `Failed` is the job's own logic failing (a step exited non-zero);
/// `Error` is an engine-level fault and is not worth retrying as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("job {handle} failed: {}", messages.join("; "))]
    Failed { handle: JobHandle, messages: Vec<String> },
    #[error("job {handle} errored: {}", messages.join("; "))]
    Error { handle: JobHandle, messages: Vec<String> },
}

impl ExecutionError {
    /// The failure carried by a terminal snapshot, if any.
    pub fn from_snapshot(snapshot: &ExecutionSnapshot) -> Option<Self> {
        let handle = snapshot.handle.clone();
        let messages = snapshot.failure_messages();
        match snapshot.phase {
            Phase::Failed => Some(ExecutionError::Failed { handle, messages }),
            Phase::Error => Some(ExecutionError::Error { handle, messages }),
            _ => None,
        }
    }

    pub fn messages(&self) -> &[String] {
        match self {
            ExecutionError::Failed { messages, .. } | ExecutionError::Error { messages, .. } => messages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Upper bound on the wait between reads.
    pub poll_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { poll_interval: DEFAULT_POLL_INTERVAL }
    }
}

#[derive(Clone)]
pub struct ExecutionTracker<E> {
    engine: E,
    config: TrackerConfig,
}

/// Fold one engine read into the next snapshot.
///
/// Nodes and the job never leave a terminal phase already observed in
/// `previous`, whatever a stale read reports.
pub fn build_snapshot(
    handle: &JobHandle,
    doc: Option<WorkflowDocument>,
    previous: Option<&ExecutionSnapshot>,
) -> ExecutionSnapshot {
    let Some(mut doc) = doc else {
        return ExecutionSnapshot::pending(handle.clone());
    };
    if let Some(previous) = previous {
        pin_terminal(&mut doc.nodes, &previous.nodes);
    }
    let tree = NodeTree::assemble(doc.nodes);
    let phase = previous.map_or(doc.phase, |p| p.phase.advance(doc.phase));
    ExecutionSnapshot {
        handle: handle.clone(),
        phase,
        started_at: doc.started_at,
        finished_at: doc.finished_at,
        progress: tree.progress(),
        message: doc.message,
        nodes: tree.into_nodes(),
    }
}

struct WatchState<E> {
    engine: E,
    handle: JobHandle,
    interval: Duration,
    cancel: CancellationToken,
    previous: Option<ExecutionSnapshot>,
    resource_version: Option<String>,
    seen: bool,
    done: bool,
}

impl<E: WorkflowEngine> WatchState<E> {
    /// Read until something changed; `None` ends the stream.
    async fn next(&mut self) -> Option<Result<ExecutionSnapshot, TrackError>> {
        if self.done {
            return None;
        }
        loop {
            if self.previous.is_some() {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return None,
                    waited = self.engine.wait_for_change(
                        &self.handle,
                        self.resource_version.as_deref(),
                        self.interval,
                    ) => {
                        if let Err(e) = waited {
                            tracing::debug!(job = %self.handle, error = %e, "change wait failed, polling");
                        }
                    }
                }
            }

            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                read = self.engine.get(&self.handle) => read,
            };
            let doc = match read {
                Ok(doc) => doc,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            if doc.is_none() && self.seen {
                self.done = true;
                return Some(Err(TrackError::JobVanished(self.handle.clone())));
            }
            if let Some(doc) = &doc {
                self.seen = true;
                self.resource_version = doc.resource_version.clone();
            }

            let snapshot = build_snapshot(&self.handle, doc, self.previous.as_ref());
            if self.previous.as_ref() == Some(&snapshot) {
                continue;
            }
            if snapshot.is_terminal() {
                self.done = true;
                tracing::info!(job = %self.handle, phase = %snapshot.phase, "job finished");
            }
            self.previous = Some(snapshot.clone());
            return Some(Ok(snapshot));
        }
    }
}

impl<E: WorkflowEngine> ExecutionTracker<E> {
    pub fn new(engine: E, config: TrackerConfig) -> Self {
        Self { engine, config }
    }

    /// Single read. A job the engine has not materialized yet is Pending.
    pub async fn snapshot(&self, handle: &JobHandle) -> Result<ExecutionSnapshot, TrackError> {
        let doc = self.engine.get(handle).await?;
        Ok(build_snapshot(handle, doc, None))
    }

    /// Snapshots of `handle` as it changes.
    ///
    /// The first read is yielded immediately; after that a snapshot is
    /// yielded only when something changed. The stream ends after the first
    /// terminal snapshot, after an error, or when `cancel` fires, in which
    /// case any pending wait is dropped.
    pub fn watch(
        &self,
        handle: &JobHandle,
        cancel: CancellationToken,
    ) -> BoxStream<'static, Result<ExecutionSnapshot, TrackError>> {
        let state = WatchState {
            engine: self.engine.clone(),
            handle: handle.clone(),
            interval: self.config.poll_interval,
            cancel,
            previous: None,
            resource_version: None,
            seen: false,
            done: false,
        };
        stream::unfold(state, |mut state| async move {
            let item = state.next().await?;
            Some((item, state))
        })
        .boxed()
    }

    /// Follow `handle` to its terminal snapshot, handing every intermediate
    /// snapshot to `on_update`.
    pub async fn wait_terminal(
        &self,
        handle: &JobHandle,
        cancel: CancellationToken,
        mut on_update: impl FnMut(&ExecutionSnapshot) + Send,
    ) -> Result<ExecutionSnapshot, TrackError> {
        let mut updates = self.watch(handle, cancel);
        let mut last = None;
        while let Some(snapshot) = updates.next().await {
            let snapshot = snapshot?;
            on_update(&snapshot);
            last = Some(snapshot);
        }
        match last {
            Some(snapshot) if snapshot.is_terminal() => Ok(snapshot),
            _ => Err(TrackError::Cancelled),
        }
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
