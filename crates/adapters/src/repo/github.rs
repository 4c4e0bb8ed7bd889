// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub-style REST contents API.

use super::{CommitInfo, FileContent, PutFile, RepoAccess, RepoError, RepoHost, RepoRef};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body carried into an error message.
const MAX_ERROR_BODY: usize = 200;

/// Repository host speaking the GitHub v3 REST API.
#[derive(Clone)]
pub struct GitHubHost {
    client: Client,
    api_url: String,
}

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Deserialize)]
struct RefInfo {
    object: RefObject,
}

#[derive(Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Deserialize)]
struct ContentInfo {
    content: Option<String>,
    sha: String,
}

#[derive(Deserialize)]
struct PutResponse {
    content: BlobInfo,
    commit: BlobInfo,
}

#[derive(Deserialize)]
struct BlobInfo {
    sha: String,
}

impl GitHubHost {
    pub fn new(api_url: impl Into<String>) -> Result<Self, RepoError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("flowcd/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepoError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, api_url: api_url.into().trim_end_matches('/').to_string() })
    }

    fn request(&self, method: Method, access: &RepoAccess, route: &str) -> RequestBuilder {
        let url = format!("{}/repos/{}{}", self.api_url, access.repo, route);
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        match &access.credentials {
            None => builder,
            Some(creds) => match &creds.username {
                Some(user) => builder.basic_auth(user, Some(creds.token.expose_secret())),
                None => builder.bearer_auth(creds.token.expose_secret()),
            },
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, RepoError> {
        builder.send().await.map_err(|e| RepoError::Unavailable(e.without_url().to_string()))
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, RepoError> {
    response.json().await.map_err(|e| RepoError::Invalid(format!("unexpected response: {e}")))
}

async fn error_from(response: Response, write: bool) -> RepoError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    classify(status, &body, write)
}

/// Map a failed response onto the error taxonomy.
///
/// A 422 on a write is a conflict only when the host complains about the
/// `sha` precondition; other 422s (bad path, oversized file) are invalid.
pub(crate) fn classify(status: StatusCode, body: &str, write: bool) -> RepoError {
    let message = error_message(status, body);
    match status.as_u16() {
        401 | 403 => RepoError::Unauthorized(message),
        404 => RepoError::NotFound(message),
        409 => RepoError::Conflict(message),
        422 if write && is_stale_sha(body) => RepoError::Conflict(message),
        400 | 422 => RepoError::Invalid(message),
        _ => RepoError::Unavailable(message),
    }
}

/// `"sha" wasn't supplied` or `<path> does not match <sha>` from the contents API.
fn is_stale_sha(body: &str) -> bool {
    let detail = api_detail(body).to_ascii_lowercase();
    detail.contains("\"sha\" wasn't supplied") || detail.contains("does not match")
}

fn api_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

fn error_message(status: StatusCode, body: &str) -> String {
    let detail: String = api_detail(body).chars().take(MAX_ERROR_BODY).collect();
    if detail.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {detail}")
    }
}

/// Decode the API's base64 payload, which is wrapped at 60 columns.
pub(crate) fn decode_content(encoded: &str) -> Result<Vec<u8>, RepoError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| RepoError::Invalid(format!("undecodable file content: {e}")))
}

pub(crate) fn put_body(put: &PutFile) -> Value {
    let mut body = json!({
        "message": put.message,
        "content": STANDARD.encode(&put.content),
        "branch": put.branch,
    });
    if let Some(sha) = &put.expected_revision {
        body["sha"] = json!(sha);
    }
    if let Some(author) = &put.author {
        let identity = json!({ "name": author.name, "email": author.email });
        body["committer"] = identity.clone();
        body["author"] = identity;
    }
    body
}

#[async_trait]
impl RepoHost for GitHubHost {
    fn requires_auth(&self, _repo: &RepoRef) -> bool {
        true
    }

    async fn authenticate(&self, access: &RepoAccess) -> Result<(), RepoError> {
        let response = self.send(self.request(Method::GET, access, "")).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from(response, false).await)
        }
    }

    async fn default_branch(&self, access: &RepoAccess) -> Result<String, RepoError> {
        let response = self.send(self.request(Method::GET, access, "")).await?;
        if !response.status().is_success() {
            return Err(error_from(response, false).await);
        }
        Ok(read_json::<RepoInfo>(response).await?.default_branch)
    }

    async fn get_branch(&self, access: &RepoAccess, branch: &str) -> Result<Option<String>, RepoError> {
        let route = format!("/git/ref/heads/{branch}");
        let response = self.send(self.request(Method::GET, access, &route)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(read_json::<RefInfo>(response).await?.object.sha)),
            _ => Err(error_from(response, false).await),
        }
    }

    async fn create_branch(&self, access: &RepoAccess, branch: &str, from_sha: &str) -> Result<(), RepoError> {
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": from_sha });
        let response = self.send(self.request(Method::POST, access, "/git/refs").json(&body)).await?;
        if response.status().is_success() {
            tracing::info!(repo = %access.repo, %branch, "created branch");
            return Ok(());
        }
        match error_from(response, false).await {
            RepoError::Invalid(message) if message.contains("already exists") => Ok(()),
            err => Err(err),
        }
    }

    async fn get_file(
        &self,
        access: &RepoAccess,
        branch: &str,
        path: &str,
    ) -> Result<Option<FileContent>, RepoError> {
        let route = format!("/contents/{path}");
        let request = self.request(Method::GET, access, &route).query(&[("ref", branch)]);
        let response = self.send(request).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let info = read_json::<ContentInfo>(response).await?;
                let content = decode_content(info.content.as_deref().unwrap_or_default())?;
                Ok(Some(FileContent { content, revision: info.sha }))
            }
            _ => Err(error_from(response, false).await),
        }
    }

    async fn put_file(&self, access: &RepoAccess, put: &PutFile) -> Result<CommitInfo, RepoError> {
        let route = format!("/contents/{}", put.path);
        let request = self.request(Method::PUT, access, &route).json(&put_body(put));
        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(error_from(response, true).await);
        }
        let written = read_json::<PutResponse>(response).await?;
        Ok(CommitInfo { sha: written.commit.sha, revision: written.content.sha })
    }
}

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;
