// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use flowcd_core::{JobHandle, ValidationError};
use flowcd_engine::SubmissionError;

fn handle() -> JobHandle {
    JobHandle::new("create-argocd-application-x7k2p", "argo")
}

#[yare::parameterized(
    validation = { FlowError::Validation(ValidationError::MissingParameter("app_name".to_string())), codes::VALIDATION },
    submission = { FlowError::Submission(SubmissionError::TemplateNotFound { template: "t".to_string(), namespace: "argo".to_string() }), codes::SUBMISSION },
    cancelled  = { FlowError::Track { handle: handle(), source: TrackError::Cancelled }, codes::CANCELLED },
    vanished   = { FlowError::Track { handle: handle(), source: TrackError::JobVanished(handle()) }, 1 },
    not_found  = { FlowError::JobNotFound(handle()), 1 },
)]
fn flow_errors_map_to_exit_codes(err: FlowError, code: i32) {
    assert_eq!(ExitError::from(err).code, code);
}

#[test]
fn validation_message_names_the_field() {
    let err = ExitError::from(FlowError::Validation(ValidationError::MissingParameter("app_name".to_string())));
    assert_eq!(err.to_string(), "missing required parameter: app_name");
}

#[test]
fn cancellation_mentions_the_running_job() {
    let err = ExitError::from(FlowError::Track { handle: handle(), source: TrackError::Cancelled });
    assert!(err.message.contains("argo/create-argocd-application-x7k2p"));
}
