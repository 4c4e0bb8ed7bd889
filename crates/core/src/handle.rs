// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job handle returned by submission.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one submitted job on the cluster.
///
/// The name is chosen at submission time and never reused while the job
/// exists; together with the namespace it keys every tracker, log and
/// teardown call.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    pub name: String,
    pub namespace: String,
}

impl JobHandle {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: namespace.into() }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
