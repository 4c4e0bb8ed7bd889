// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use flowcd_engine::{FlowError, TrackError};
use std::fmt;

pub mod codes {
    /// Input rejected before anything was submitted.
    pub const VALIDATION: i32 = 2;
    /// The engine refused the job.
    pub const SUBMISSION: i32 = 3;
    /// The job ended Failed or Error.
    pub const EXECUTION: i32 = 4;
    /// The job succeeded but its manifest was not published.
    pub const PUBLISH: i32 = 5;
    /// Interrupted by Ctrl-C.
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<FlowError> for ExitError {
    fn from(err: FlowError) -> Self {
        let code = match &err {
            FlowError::Validation(_) | FlowError::Render(_) => codes::VALIDATION,
            FlowError::Submission(_) => codes::SUBMISSION,
            FlowError::Track { source: TrackError::Cancelled, handle } => {
                return ExitError::new(
                    codes::CANCELLED,
                    format!("cancelled; job {handle} keeps running on the cluster"),
                );
            }
            FlowError::Track { .. } | FlowError::JobNotFound(_) | FlowError::Engine(_) => 1,
        };
        ExitError::new(code, err.to_string())
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
