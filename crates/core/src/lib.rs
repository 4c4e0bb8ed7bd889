// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flowcd-core: domain model for the flowcd workflow and GitOps engine

pub mod macros;

pub mod binder;
pub mod handle;
pub mod log;
pub mod manifest;
pub mod node;
pub mod phase;
pub mod snapshot;
pub mod template;
pub mod tree;
pub mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use binder::{bind, ParameterSet, RawInput, ValidationError, REFERENCE_MARKER};
pub use handle::JobHandle;
pub use log::{merge_by_time, LogEntry, LogLevel};
pub use manifest::{Environment, Manifest, ManifestKind, SyncPolicy, SyncPreset};
#[cfg(any(test, feature = "test-support"))]
pub use node::NodeRecordBuilder;
pub use node::{NodeKind, NodeRecord, NodeState};
pub use phase::Phase;
pub use snapshot::{ExecutionSnapshot, Progress};
pub use template::{
    JobTemplate, ParamDefault, ParamKind, ParamSpec, TemplateCatalog, WorkflowTemplateDoc,
    APPLICATIONSET_TEMPLATE, APPLICATION_TEMPLATE, INFRASTRUCTURE_TEMPLATE,
};
pub use tree::{pin_terminal, NodeTree};
