// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository host boundary
//!
//! Publishing reads and writes single files through a hosting provider's
//! contents API; nothing here touches a local clone.

mod github;

pub use github::{GitHubHost, DEFAULT_API_URL};

use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;
use thiserror::Error;

/// Errors from repository host operations.
///
/// Messages never carry credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),
    /// The expected revision no longer matches the host's.
    #[error("write conflict: {0}")]
    Conflict(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("invalid repository: {0}")]
    Invalid(String),
    #[error("repository host unreachable: {0}")]
    Unavailable(String),
}

/// `owner/name` of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse an https, ssh-style (`git@host:owner/name`) or `ssh://` URL.
    pub fn parse(url: &str) -> Result<Self, RepoError> {
        let url = url.trim();
        let path = if let Some(rest) = url.strip_prefix("git@") {
            rest.split_once(':').map(|(_, path)| path)
        } else {
            url.split_once("://")
                .and_then(|(_, rest)| rest.split_once('/'))
                .map(|(_, path)| path)
        };
        let path = path
            .map(|p| p.trim_end_matches('/'))
            .map(|p| p.strip_suffix(".git").unwrap_or(p))
            .unwrap_or_default();
        match path.split('/').collect::<Vec<_>>().as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => {
                Ok(Self { owner: owner.to_string(), name: name.to_string() })
            }
            _ => Err(RepoError::Invalid(format!("cannot find owner/name in {url}"))),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Credentials for the hosting provider.
#[derive(Clone)]
pub struct Credentials {
    /// Basic-auth user; a bare token is sent as a bearer token.
    pub username: Option<String>,
    pub token: SecretString,
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Self { username: None, token: SecretString::from(token.into()) }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"[redacted]")
            .finish()
    }
}

/// A repository together with the credentials to reach it.
#[derive(Debug, Clone)]
pub struct RepoAccess {
    pub repo: RepoRef,
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

/// A file's bytes at a revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub content: Vec<u8>,
    /// Opaque revision marker for conditional writes.
    pub revision: String,
}

/// A single-file commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFile {
    pub branch: String,
    pub path: String,
    pub content: Vec<u8>,
    pub message: String,
    pub author: Option<CommitAuthor>,
    /// Revision the write is conditional on; `None` creates a new file.
    pub expected_revision: Option<String>,
}

/// Commit produced by a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    /// New revision of the written file.
    pub revision: String,
}

/// Adapter for a repository hosting provider
#[async_trait]
pub trait RepoHost: Clone + Send + Sync + 'static {
    /// Whether writes to `repo` need credentials at all.
    fn requires_auth(&self, repo: &RepoRef) -> bool;

    /// Check that the credentials can reach the repository.
    async fn authenticate(&self, access: &RepoAccess) -> Result<(), RepoError>;

    async fn default_branch(&self, access: &RepoAccess) -> Result<String, RepoError>;

    /// Tip commit of `branch`, or `None` when the branch does not exist.
    async fn get_branch(&self, access: &RepoAccess, branch: &str) -> Result<Option<String>, RepoError>;

    /// Create `branch` at `from_sha`. An already existing branch is not an error.
    async fn create_branch(&self, access: &RepoAccess, branch: &str, from_sha: &str) -> Result<(), RepoError>;

    /// File at `path` on `branch`, or `None` when absent.
    async fn get_file(
        &self,
        access: &RepoAccess,
        branch: &str,
        path: &str,
    ) -> Result<Option<FileContent>, RepoError>;

    /// Create or conditionally update one file.
    async fn put_file(&self, access: &RepoAccess, put: &PutFile) -> Result<CommitInfo, RepoError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRepoHost, RepoCall};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
