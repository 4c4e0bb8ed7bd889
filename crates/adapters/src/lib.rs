// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flowcd-adapters: boundaries to the workflow engine and repository host

pub mod engine;
pub mod repo;

pub use engine::{
    EngineError, JobName, KubeEngine, LogLineStream, SubmitRequest, WorkflowDocument, WorkflowEngine,
    RESOURCE_LABEL, TEMPLATE_LABEL,
};
pub use repo::{
    CommitAuthor, CommitInfo, Credentials, FileContent, GitHubHost, PutFile, RepoAccess,
    RepoError, RepoHost, RepoRef, DEFAULT_API_URL,
};

#[cfg(any(test, feature = "test-support"))]
pub use engine::{job_document, EngineCall, FakeWorkflowEngine};
#[cfg(any(test, feature = "test-support"))]
pub use repo::{FakeRepoHost, RepoCall};
