// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step output attributed to job nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Advisory severity guessed from a line's leading token.
///
/// Only used for formatting; nothing branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogLevel {
    #[default]
    Info,
    Error,
    Warning,
}

impl LogLevel {
    /// Case-insensitive match on the first token, ignoring leading
    /// whitespace and brackets (`ERROR:`, `[warn]`, `Warning -`).
    pub fn classify(line: &str) -> Self {
        let token = line.trim_start().trim_start_matches(['[', '(']);
        let lower = token.get(..token.len().min(7)).unwrap_or(token).to_ascii_lowercase();
        if lower.starts_with("error") || lower.starts_with("fatal") {
            LogLevel::Error
        } else if lower.starts_with("warn") {
            LogLevel::Warning
        } else {
            LogLevel::Info
        }
    }
}

crate::simple_display! {
    LogLevel {
        Info => "info",
        Error => "error",
        Warning => "warning",
    }
}

/// One line emitted by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Display name of the emitting node.
    pub node: String,
    /// Engine node id (the pod name for container nodes).
    pub node_id: String,
    pub timestamp: DateTime<Utc>,
    pub line: String,
    pub level: LogLevel,
}

impl LogEntry {
    pub fn new(node: impl Into<String>, node_id: impl Into<String>, timestamp: DateTime<Utc>, line: impl Into<String>) -> Self {
        let line = line.into();
        Self { node: node.into(), node_id: node_id.into(), timestamp, level: LogLevel::classify(&line), line }
    }

    /// Parse a line prefixed with an RFC 3339 timestamp, as returned when
    /// container logs are requested with timestamps.
    ///
    /// Lines without a parseable prefix keep their full text and take
    /// `fallback` as timestamp.
    pub fn parse(node: &str, node_id: &str, raw: &str, fallback: DateTime<Utc>) -> Self {
        let raw = raw.trim_end_matches(['\r', '\n']);
        if let Some((stamp, rest)) = raw.split_once(' ') {
            if let Ok(ts) = DateTime::parse_from_rfc3339(stamp) {
                return Self::new(node, node_id, ts.with_timezone(&Utc), rest);
            }
        }
        Self::new(node, node_id, fallback, raw)
    }

    /// Whether this entry belongs to the node selected by `filter`, matched
    /// against display name or node id.
    pub fn matches(&self, filter: &str) -> bool {
        self.node == filter || self.node_id == filter
    }
}

/// Merge per-node sequences into one ordered by timestamp.
///
/// The sort is stable, so entries sharing a timestamp keep their per-node
/// order and nodes keep the order they were given in.
pub fn merge_by_time(per_node: impl IntoIterator<Item = Vec<LogEntry>>) -> Vec<LogEntry> {
    let mut merged: Vec<LogEntry> = per_node.into_iter().flatten().collect();
    merged.sort_by_key(|e| e.timestamp);
    merged
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
