// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconstruction of the node tree from a flat engine response.
//!
//! Records are stored in an arena keyed by node id; parents are resolved by
//! lookup on every poll. A record whose parent is missing from the current
//! response is kept as a detached root instead of failing, since the engine
//! may report a child before its parent. Ordering depends only on the set of
//! records, never on arrival order.

use crate::node::{NodeRecord, NodeState};
use crate::phase::Phase;
use crate::snapshot::Progress;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Node tree assembled from one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeTree {
    nodes: Vec<NodeState>,
}

impl NodeTree {
    pub fn assemble(records: impl IntoIterator<Item = NodeRecord>) -> Self {
        let arena: BTreeMap<String, NodeRecord> =
            records.into_iter().map(|r| (r.id.clone(), r)).collect();

        let mut children: HashMap<&str, Vec<&NodeRecord>> = HashMap::new();
        let mut roots: Vec<&NodeRecord> = Vec::new();
        for record in arena.values() {
            match record.parent.as_deref() {
                Some(parent) if parent != record.id && arena.contains_key(parent) => {
                    children.entry(parent).or_default().push(record);
                }
                _ => roots.push(record),
            }
        }
        for list in children.values_mut() {
            list.sort_by(|a, b| display_order(a, b));
        }
        roots.sort_by(|a, b| display_order(a, b));

        let mut nodes = Vec::with_capacity(arena.len());
        let mut visited: HashSet<&str> = HashSet::new();
        for root in roots.iter().copied() {
            walk(root, 0, &children, &mut visited, &mut nodes);
        }

        // Records caught in a parent cycle are unreachable from any root;
        // surface them as detached roots rather than dropping them.
        for record in arena.values() {
            if !visited.contains(record.id.as_str()) {
                walk(record, 0, &children, &mut visited, &mut nodes);
            }
        }

        Self { nodes }
    }

    /// Nodes in depth-first display order.
    pub fn nodes(&self) -> &[NodeState] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<NodeState> {
        self.nodes
    }

    pub fn get(&self, id: &str) -> Option<&NodeState> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Completed leaves over known leaves.
    ///
    /// The denominator only counts leaves reported so far, so early in a run
    /// the ratio can look like it moves backwards (1/1 followed by 1/3) as
    /// the engine expands groups. That is expected, not a regression.
    pub fn progress(&self) -> Progress {
        let leaves = self.nodes.iter().filter(|n| n.is_leaf());
        let (done, total) = leaves.fold((0, 0), |(done, total), n| {
            (done + usize::from(n.phase.is_terminal()), total + 1)
        });
        Progress { done, total }
    }
}

/// Keep nodes that were terminal in the previous poll terminal.
///
/// Nodes never regress out of a terminal phase; a stale read that reports
/// an earlier phase is overridden by what was already observed.
pub fn pin_terminal(records: &mut [NodeRecord], previous: &[NodeState]) {
    let prior: HashMap<&str, Phase> = previous.iter().map(|n| (n.id.as_str(), n.phase)).collect();
    for record in records.iter_mut() {
        if let Some(phase) = prior.get(record.id.as_str()) {
            record.phase = phase.advance(record.phase);
        }
    }
}

fn display_order(a: &NodeRecord, b: &NodeRecord) -> std::cmp::Ordering {
    // Unstarted nodes sort after started ones.
    let key = |r: &NodeRecord| (r.started_at.is_none(), r.started_at);
    key(a).cmp(&key(b)).then_with(|| a.id.cmp(&b.id))
}

fn walk<'a>(
    record: &'a NodeRecord,
    depth: usize,
    children: &HashMap<&str, Vec<&'a NodeRecord>>,
    visited: &mut HashSet<&'a str>,
    out: &mut Vec<NodeState>,
) {
    if !visited.insert(record.id.as_str()) {
        return;
    }
    let kids = children.get(record.id.as_str()).map(Vec::as_slice).unwrap_or_default();
    let detached = depth == 0 && record.parent.as_deref().is_some_and(|p| p != record.id);
    out.push(NodeState {
        id: record.id.clone(),
        name: record.name.clone(),
        display_name: record.display_name.clone(),
        kind: record.kind,
        phase: record.phase,
        message: record.message.clone(),
        started_at: record.started_at,
        finished_at: record.finished_at,
        parent: record.parent.clone(),
        children: kids.iter().map(|k| k.id.clone()).collect(),
        depth,
        detached,
    });
    for kid in kids.iter().copied() {
        walk(kid, depth + 1, children, visited, out);
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
