// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures and proptest strategies shared by tests in other crates.

use crate::node::{NodeKind, NodeRecord};
use crate::phase::Phase;
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

/// Fixed timestamp `offset_secs` after a base instant.
pub fn ts(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).single().unwrap_or_default()
}

/// The node records of a finished application job:
///
/// ```text
/// wf (Steps)
/// ├── wf-g1 (StepGroup) ── wf-validate (Pod)
/// └── wf-g2 (StepGroup) ─┬ wf-apply (Pod)
///                        └ wf-verify (Pod)
/// ```
pub fn application_records(phase: Phase) -> Vec<NodeRecord> {
    let node = |id: &str, display: &str, kind: NodeKind, parent: Option<&str>, start: i64| {
        let mut builder = NodeRecord::builder()
            .id(id)
            .name(format!("wf.{display}"))
            .display_name(display)
            .kind(kind)
            .phase(phase)
            .started_at(ts(start));
        if let Some(parent) = parent {
            builder = builder.parent(parent);
        }
        builder.build()
    };
    vec![
        node("wf", "wf", NodeKind::Group, None, 0),
        node("wf-g1", "[0]", NodeKind::Group, Some("wf"), 1),
        node("wf-validate", "validate-inputs", NodeKind::Container, Some("wf-g1"), 2),
        node("wf-g2", "[1]", NodeKind::Group, Some("wf"), 10),
        node("wf-apply", "apply-application", NodeKind::Container, Some("wf-g2"), 11),
        node("wf-verify", "verify-creation", NodeKind::Container, Some("wf-g2"), 12),
    ]
}

/// Any ordering of [`application_records`].
pub fn arb_record_permutation() -> impl Strategy<Value = Vec<NodeRecord>> {
    Just(application_records(Phase::Succeeded)).prop_shuffle()
}
