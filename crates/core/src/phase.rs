// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution phase shared by jobs and their nodes.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a job or one of its nodes.
///
/// `Pending → Running → {Succeeded, Failed, Error}`. The last three are
/// terminal: once observed, no further transition is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Pending,
    Running,
    Succeeded,
    /// Job-logic failure: a step exited non-zero.
    Failed,
    /// Engine-level fault (pod eviction, controller error, ...).
    Error,
}

impl Phase {
    /// Map a phase string reported by the workflow engine.
    ///
    /// `Skipped` and `Omitted` nodes finished without doing work and count as
    /// succeeded. Anything unrecognised (including the empty string reported
    /// before the controller picks a job up) is treated as `Pending`.
    pub fn from_engine(raw: &str) -> Self {
        match raw {
            "Running" => Phase::Running,
            "Succeeded" | "Skipped" | "Omitted" => Phase::Succeeded,
            "Failed" => Phase::Failed,
            "Error" => Phase::Error,
            _ => Phase::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed | Phase::Error)
    }

    pub fn is_success(self) -> bool {
        self == Phase::Succeeded
    }

    /// Failed or Error.
    pub fn is_failure(self) -> bool {
        matches!(self, Phase::Failed | Phase::Error)
    }

    /// Apply an observed phase without ever leaving a terminal phase.
    pub fn advance(self, observed: Phase) -> Phase {
        if self.is_terminal() {
            self
        } else {
            observed
        }
    }
}

crate::simple_display! {
    Phase {
        Pending => "Pending",
        Running => "Running",
        Succeeded => "Succeeded",
        Failed => "Failed",
        Error => "Error",
    }
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
