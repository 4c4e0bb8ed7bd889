// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::repo::CommitAuthor;

#[yare::parameterized(
    unauthorized  = { 401, false, "Unauthorized" },
    forbidden     = { 403, false, "Unauthorized" },
    missing       = { 404, false, "NotFound" },
    sha_mismatch  = { 409, true,  "Conflict" },
    bad_read      = { 422, false, "Invalid" },
    server        = { 502, false, "Unavailable" },
)]
fn status_classification(code: u16, write: bool, expected: &str) {
    let status = StatusCode::from_u16(code).unwrap();
    let err = classify(status, r#"{"message":"boom"}"#, write);
    let variant = match err {
        RepoError::NotFound(_) => "NotFound",
        RepoError::Conflict(_) => "Conflict",
        RepoError::Unauthorized(_) => "Unauthorized",
        RepoError::Invalid(_) => "Invalid",
        RepoError::Unavailable(_) => "Unavailable",
    };
    assert_eq!(variant, expected);
}

#[yare::parameterized(
    sha_missing   = { r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#, "Conflict" },
    sha_stale     = { r#"{"message":"applications/nginx-dev.yaml does not match 3d21ec53a331a6f037a91c368710b99387d012c1"}"#, "Conflict" },
    bad_path      = { r#"{"message":"path cannot start with a slash"}"#, "Invalid" },
    too_large     = { r#"{"message":"Invalid request.\n\nFor 'properties/content', data is too large."}"#, "Invalid" },
    malformed     = { r#"{"message":"Invalid request.\n\n\"content\" wasn't supplied."}"#, "Invalid" },
)]
fn unprocessable_write_is_a_conflict_only_for_the_sha(body: &str, expected: &str) {
    let err = classify(StatusCode::UNPROCESSABLE_ENTITY, body, true);
    let variant = match err {
        RepoError::Conflict(_) => "Conflict",
        RepoError::Invalid(_) => "Invalid",
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(variant, expected);
}

#[test]
fn error_message_prefers_api_message() {
    let err = classify(StatusCode::CONFLICT, r#"{"message":"is at abc but expected def"}"#, true);
    assert_eq!(err, RepoError::Conflict("409 Conflict: is at abc but expected def".to_string()));
}

#[test]
fn error_message_truncates_long_bodies() {
    let body = "x".repeat(1000);
    let RepoError::Unavailable(message) = classify(StatusCode::BAD_GATEWAY, &body, false) else {
        panic!("expected Unavailable");
    };
    assert!(message.len() < 300);
}

#[test]
fn decodes_wrapped_base64() {
    let encoded = "YXBpVmVyc2lvbjog\nYXJnb3Byb2ouaW8v\ndjFhbHBoYTEK\n";
    assert_eq!(decode_content(encoded).unwrap(), b"apiVersion: argoproj.io/v1alpha1\n");
}

#[test]
fn undecodable_content_is_invalid() {
    assert!(matches!(decode_content("!!!"), Err(RepoError::Invalid(_))));
}

#[test]
fn create_body_has_no_sha() {
    let put = PutFile {
        branch: "main".to_string(),
        path: "applications/nginx-dev.yaml".to_string(),
        content: b"kind: Application\n".to_vec(),
        message: "Create Application nginx-dev".to_string(),
        author: None,
        expected_revision: None,
    };
    let body = put_body(&put);
    assert_eq!(body["branch"], "main");
    assert_eq!(body["content"], STANDARD.encode(b"kind: Application\n"));
    assert!(body.get("sha").is_none());
    assert!(body.get("committer").is_none());
}

#[test]
fn update_body_is_conditional_and_attributed() {
    let put = PutFile {
        branch: "gitops".to_string(),
        path: "applications/nginx-dev.yaml".to_string(),
        content: b"kind: Application\n".to_vec(),
        message: "Update Application nginx-dev".to_string(),
        author: Some(CommitAuthor { name: "Deploy Bot".to_string(), email: "bot@example.com".to_string() }),
        expected_revision: Some("3d21ec53".to_string()),
    };
    let body = put_body(&put);
    assert_eq!(body["sha"], "3d21ec53");
    assert_eq!(body["committer"]["email"], "bot@example.com");
    assert_eq!(body["author"]["name"], "Deploy Bot");
}
