// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flowcd-engine: submission, tracking, logs and GitOps publishing

pub mod gateway;
pub mod logs;
pub mod orchestrator;
pub mod publisher;
pub mod tracker;

pub use gateway::{SubmissionError, SubmissionGateway, SubmitOptions, SUBMIT_ATTEMPTS};
pub use logs::{LogAggregator, LogError, LogStream};
pub use orchestrator::{
    render, FlowConfig, FlowDeps, FlowError, FlowReport, FlowRequest, GitTarget, JobSummary,
    Orchestrator, PublishStatus, PublishTarget, Rendered, Submitted, TeardownTarget,
    TemplateStatus, DEFAULT_NAMESPACE,
};
pub use publisher::{
    commit_message, manifest_path, GitOpsPublisher, GitPublishRequest, GitPublishResult,
    LocalPublisher, PublishError, PublishOutcome, DEFAULT_BRANCH, DEFAULT_PATH, PUBLISH_ATTEMPTS,
};
pub use tracker::{
    build_snapshot, ExecutionError, ExecutionTracker, TrackError, TrackerConfig,
    DEFAULT_POLL_INTERVAL,
};
