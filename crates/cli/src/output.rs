// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use flowcd_core::{ExecutionSnapshot, LogEntry, Phase};
use flowcd_engine::{JobSummary, PublishStatus};
use serde::Serialize;
use std::fmt::Write as _;

use crate::color;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Compact duration: "45s", "3m12s", "2h05m", "3d4h".
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m{:02}s", secs / 60, secs % 60),
        3600..=86_399 => format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60),
        _ => format!("{}d{}h", secs / 86_400, (secs % 86_400) / 3600),
    }
}

/// Run time of a job: until it finished, or until `now` while running.
pub fn job_duration(snapshot: &ExecutionSnapshot, now: DateTime<Utc>) -> String {
    match snapshot.started_at {
        Some(started) => {
            let end = snapshot.finished_at.unwrap_or(now);
            format_duration((end - started).num_seconds())
        }
        None => "-".to_string(),
    }
}

fn glyph(phase: Phase) -> &'static str {
    match phase {
        Phase::Succeeded => "✔",
        Phase::Failed | Phase::Error => "✖",
        Phase::Running => "●",
        Phase::Pending => "○",
    }
}

/// Header line plus the node tree, one node per line.
pub fn format_snapshot(snapshot: &ExecutionSnapshot, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  {}  {}  {}",
        color::header(&snapshot.handle.to_string()),
        color::phase(snapshot.phase),
        snapshot.progress,
        color::context(&job_duration(snapshot, now)),
    );
    if !snapshot.message.is_empty() {
        let _ = writeln!(out, "  {}", color::context(&snapshot.message));
    }
    // The root node repeats the job line.
    for node in snapshot.nodes.iter().filter(|n| n.depth > 0) {
        let indent = "  ".repeat(node.depth);
        let _ = write!(out, "{indent}{} {}", glyph(node.phase), node.display_name);
        if node.phase.is_failure() && !node.message.is_empty() {
            let _ = write!(out, "  {}", color::muted(&node.message));
        }
        out.push('\n');
    }
    out
}

/// One log line, prefixed with its node when several nodes interleave.
pub fn format_log_entry(entry: &LogEntry, show_node: bool) -> String {
    let time = entry.timestamp.format("%H:%M:%S");
    let line = color::log_line(entry.level, &entry.line);
    if show_node {
        format!("{} {} {}", color::muted(&time.to_string()), color::context(&format!("[{}]", entry.node)), line)
    } else {
        format!("{} {}", color::muted(&time.to_string()), line)
    }
}

/// Aligned table of jobs.
pub fn format_job_table(jobs: &[JobSummary], now: DateTime<Utc>) -> String {
    let rows: Vec<[String; 6]> = jobs
        .iter()
        .map(|job| {
            let age = job
                .snapshot
                .started_at
                .map_or_else(|| "-".to_string(), |t| format_duration((now - t).num_seconds()));
            [
                job.snapshot.handle.name.clone(),
                job.resource.clone().unwrap_or_else(|| "-".to_string()),
                job.template.clone().unwrap_or_else(|| "-".to_string()),
                job.snapshot.phase.to_string(),
                job.snapshot.progress.to_string(),
                age,
            ]
        })
        .collect();
    let headers = ["NAME", "RESOURCE", "TEMPLATE", "PHASE", "PROGRESS", "AGE"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let line = |cells: &[String]| {
        let mut text = String::new();
        for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if i + 1 == cells.len() {
                text.push_str(cell);
            } else {
                let _ = write!(text, "{cell:<width$}  ");
            }
        }
        text
    };
    let header_cells = headers.map(String::from);
    let _ = writeln!(out, "{}", color::header(line(&header_cells).trim_end()));
    for row in &rows {
        let _ = writeln!(out, "{}", line(row).trim_end());
    }
    out
}

pub fn format_publish(status: &PublishStatus) -> String {
    match status {
        PublishStatus::Published(result) => match &result.sha {
            Some(sha) => format!("manifest {}: {} ({})", result.outcome, result.path, sha),
            None => format!("manifest {}: {}", result.outcome, result.path),
        },
        PublishStatus::Skipped => "manifest not published: job did not succeed".to_string(),
        PublishStatus::Failed { result, error } => {
            format!("manifest publish failed for {}: {error}", result.path)
        }
    }
}
