// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use flowcd_core::test_support::{application_records, ts};
use flowcd_core::{JobHandle, NodeTree, Progress};
use flowcd_engine::{GitPublishResult, PublishError, PublishOutcome};
use serial_test::serial;

fn plain() {
    std::env::set_var("NO_COLOR", "1");
    std::env::remove_var("COLOR");
}

fn snapshot(phase: Phase) -> ExecutionSnapshot {
    let mut records = application_records(phase);
    if phase == Phase::Failed {
        if let Some(apply) = records.iter_mut().find(|r| r.id == "wf-apply") {
            apply.phase = Phase::Failed;
            apply.message = "Error (exit code 1)".to_string();
        }
    }
    let tree = NodeTree::assemble(records);
    ExecutionSnapshot {
        handle: JobHandle::new("create-argocd-application-x7k2p", "argo"),
        phase,
        started_at: Some(ts(0)),
        finished_at: Some(ts(75)),
        progress: tree.progress(),
        message: String::new(),
        nodes: tree.into_nodes(),
    }
}

#[yare::parameterized(
    seconds = { 45, "45s" },
    minutes = { 192, "3m12s" },
    hours   = { 7500, "2h05m" },
    days    = { 273_600, "3d4h" },
    negative = { -5, "0s" },
)]
fn durations_are_compact(secs: i64, expected: &str) {
    assert_eq!(format_duration(secs), expected);
}

#[test]
fn running_job_duration_counts_to_now() {
    let mut running = snapshot(Phase::Running);
    running.finished_at = None;
    assert_eq!(job_duration(&running, ts(30)), "30s");
    assert_eq!(job_duration(&ExecutionSnapshot::pending(running.handle.clone()), ts(30)), "-");
}

#[test]
#[serial]
fn snapshot_lists_nodes_under_the_job_line() {
    plain();
    let text = format_snapshot(&snapshot(Phase::Succeeded), ts(100));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "argo/create-argocd-application-x7k2p  Succeeded  3/3  1m15s");
    assert!(lines.iter().any(|l| l.trim_start() == "✔ apply-application"));
    assert!(!lines.iter().skip(1).any(|l| l.contains("create-argocd-application-x7k2p")));
}

#[test]
#[serial]
fn failed_nodes_show_their_message() {
    plain();
    let text = format_snapshot(&snapshot(Phase::Failed), ts(100));
    assert!(text.contains("✖ apply-application  Error (exit code 1)"));
}

#[test]
#[serial]
fn log_entries_carry_node_when_interleaved() {
    plain();
    let entry = LogEntry::new("apply-application", "wf-apply", ts(3), "applying");
    assert_eq!(format_log_entry(&entry, true), "22:13:23 [apply-application] applying");
    assert_eq!(format_log_entry(&entry, false), "22:13:23 applying");
}

#[test]
#[serial]
fn job_table_is_aligned() {
    plain();
    let mut older = snapshot(Phase::Succeeded);
    older.handle = JobHandle::new("a", "argo");
    let jobs = vec![
        JobSummary {
            template: Some("create-argocd-application".to_string()),
            resource: Some("nginx-dev".to_string()),
            snapshot: snapshot(Phase::Succeeded),
        },
        JobSummary { template: None, resource: None, snapshot: ExecutionSnapshot::pending(older.handle) },
    ];
    let text = format_job_table(&jobs, ts(120));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("NAME"));
    let phase_col = lines[0].find("PHASE").unwrap();
    assert_eq!(&lines[1][phase_col..phase_col + 9], "Succeeded");
    assert_eq!(&lines[2][phase_col..phase_col + 7], "Pending");
    assert!(lines[1].ends_with("2m00s"));
    assert!(lines[2].ends_with('-'));
}

#[test]
fn publish_statuses_read_plainly() {
    let created = GitPublishResult {
        outcome: PublishOutcome::Created,
        sha: Some("abc123".to_string()),
        path: "applications/nginx-dev.yaml".to_string(),
    };
    assert_eq!(
        format_publish(&PublishStatus::Published(created)),
        "manifest created: applications/nginx-dev.yaml (abc123)"
    );
    let failed = PublishStatus::Failed {
        result: GitPublishResult::failed("applications/nginx-dev.yaml"),
        error: PublishError::AuthenticationRequired("acme/deployments".to_string()),
    };
    assert_eq!(
        format_publish(&failed),
        "manifest publish failed for applications/nginx-dev.yaml: repository acme/deployments requires credentials"
    );
    assert!(format_publish(&PublishStatus::Skipped).contains("did not succeed"));
}

#[test]
fn progress_renders_as_fraction() {
    assert_eq!(Progress { done: 2, total: 3 }.to_string(), "2/3");
}
