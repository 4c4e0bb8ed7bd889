// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log aggregator
//!
//! Step output is read per container node and merged by timestamp. For a
//! finished job the sequence is finite. For a running job each container
//! node is followed as it appears, until the job ends and every stream
//! drains, or until cancelled.

use crate::tracker::{ExecutionTracker, TrackError, TrackerConfig};
use chrono::{DateTime, Utc};
use flowcd_adapters::{EngineError, WorkflowEngine};
use flowcd_core::{merge_by_time, JobHandle, LogEntry, NodeKind, NodeState, Phase};
use futures_util::stream::{self, BoxStream, StreamExt};
use std::collections::HashSet;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Entries buffered between node followers and the consumer.
const FOLLOW_BUFFER: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error("reading logs failed: {0}")]
    Engine(#[from] EngineError),
}

pub type LogStream = BoxStream<'static, Result<LogEntry, LogError>>;

#[derive(Clone)]
pub struct LogAggregator<E> {
    engine: E,
    tracker: ExecutionTracker<E>,
}

/// Whether `node` can produce entries matching `filter`.
fn selected(node: &NodeState, filter: Option<&str>) -> bool {
    node.kind == NodeKind::Container
        && filter.is_none_or(|f| node.display_name == f || node.id == f)
}

impl<E: WorkflowEngine> LogAggregator<E> {
    pub fn new(engine: E, config: TrackerConfig) -> Self {
        Self { tracker: ExecutionTracker::new(engine.clone(), config), engine }
    }

    /// Output produced so far, ordered by time.
    ///
    /// Nodes whose pod is already gone contribute nothing.
    pub async fn collect(&self, handle: &JobHandle, filter: Option<&str>) -> Result<Vec<LogEntry>, LogError> {
        let snapshot = self.tracker.snapshot(handle).await?;
        let mut per_node = Vec::new();
        for node in snapshot.nodes.iter().filter(|n| selected(n, filter)) {
            let lines = match self.engine.node_logs(handle, &node.id).await {
                Ok(lines) => lines,
                Err(EngineError::NotFound(message)) => {
                    tracing::warn!(job = %handle, node = %node.display_name, %message, "no logs for node");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let mut last = node.started_at.unwrap_or_else(Utc::now);
            let entries: Vec<LogEntry> = lines
                .iter()
                .map(|raw| {
                    let entry = LogEntry::parse(&node.display_name, &node.id, raw, last);
                    last = entry.timestamp;
                    entry
                })
                .filter(|entry| filter.is_none_or(|f| entry.matches(f)))
                .collect();
            per_node.push(entries);
        }
        Ok(merge_by_time(per_node))
    }

    /// Log entries of `handle`, optionally for one node.
    ///
    /// Finite when the job has already finished; otherwise follows the job
    /// until it finishes and its streams drain, or `cancel` fires.
    pub async fn logs(
        &self,
        handle: &JobHandle,
        filter: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<LogStream, LogError> {
        let snapshot = self.tracker.snapshot(handle).await?;
        if snapshot.is_terminal() {
            let entries = self.collect(handle, filter).await?;
            return Ok(stream::iter(entries.into_iter().map(Ok)).boxed());
        }

        let (tx, rx) = mpsc::channel(FOLLOW_BUFFER);
        let follower = JobFollower {
            engine: self.engine.clone(),
            tracker: self.tracker.clone(),
            handle: handle.clone(),
            filter: filter.map(String::from),
            cancel: cancel.child_token(),
            tx,
        };
        tokio::spawn(follower.run());
        Ok(stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|entry| (entry, rx)) }).boxed())
    }
}

/// Background task fanning node log streams into one channel.
struct JobFollower<E> {
    engine: E,
    tracker: ExecutionTracker<E>,
    handle: JobHandle,
    filter: Option<String>,
    /// Child of the caller's token; also cancelled when the consumer goes away.
    cancel: CancellationToken,
    tx: mpsc::Sender<Result<LogEntry, LogError>>,
}

impl<E: WorkflowEngine> JobFollower<E> {
    async fn run(self) {
        let mut updates = self.tracker.watch(&self.handle, self.cancel.clone());
        let mut followed: HashSet<String> = HashSet::new();
        let mut nodes: Vec<JoinHandle<()>> = Vec::new();

        loop {
            let update = tokio::select! {
                _ = self.tx.closed() => {
                    self.cancel.cancel();
                    break;
                }
                update = updates.next() => update,
            };
            let snapshot = match update {
                None => break,
                Some(Ok(snapshot)) => snapshot,
                Some(Err(e)) => {
                    let _ = self.tx.send(Err(e.into())).await;
                    break;
                }
            };
            // Pending nodes have no container to read yet.
            let ready = snapshot
                .nodes
                .iter()
                .filter(|n| n.phase != Phase::Pending && selected(n, self.filter.as_deref()));
            for node in ready {
                if followed.insert(node.id.clone()) {
                    tracing::debug!(job = %self.handle, node = %node.display_name, "following node logs");
                    nodes.push(tokio::spawn(follow_node(
                        self.engine.clone(),
                        self.handle.clone(),
                        node.clone(),
                        self.cancel.clone(),
                        self.tx.clone(),
                    )));
                }
            }
        }

        // The job is done (or we were cancelled); let open streams drain.
        for node in nodes {
            let _ = node.await;
        }
    }
}

async fn follow_node<E: WorkflowEngine>(
    engine: E,
    handle: JobHandle,
    node: NodeState,
    cancel: CancellationToken,
    tx: mpsc::Sender<Result<LogEntry, LogError>>,
) {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        opened = engine.follow_node_logs(&handle, &node.id) => opened,
    };
    let mut lines = match opened {
        Ok(lines) => lines,
        Err(EngineError::NotFound(message)) => {
            tracing::warn!(job = %handle, node = %node.display_name, %message, "no logs for node");
            return;
        }
        Err(e) => {
            let _ = tx.send(Err(e.into())).await;
            return;
        }
    };

    let mut last: DateTime<Utc> = node.started_at.unwrap_or_else(Utc::now);
    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tx.closed() => break,
            line = lines.next() => line,
        };
        let item = match line {
            None => break,
            Some(Ok(raw)) => {
                let entry = LogEntry::parse(&node.display_name, &node.id, &raw, last);
                last = entry.timestamp;
                Ok(entry)
            }
            Some(Err(e)) => Err(LogError::Engine(e)),
        };
        let failed = item.is_err();
        if tx.send(item).await.is_err() || failed {
            break;
        }
    }
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
