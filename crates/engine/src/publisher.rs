// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitOps publisher
//!
//! Idempotent create-or-update of one manifest file. Remote writes are
//! conditional on the revision read just before, so a concurrent change is
//! never overwritten blindly; the host's conditional write is the only
//! lock. Nothing outside the target path is touched.

use flowcd_adapters::{
    CommitAuthor, Credentials, PutFile, RepoAccess, RepoError, RepoHost, RepoRef,
};
use flowcd_core::{Manifest, ManifestKind};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_PATH: &str = "argocd-manifests";

/// Resolve-and-write rounds before giving up on a contended file.
pub const PUBLISH_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("repository {0} requires credentials")]
    AuthenticationRequired(String),
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("{path} changed concurrently on every attempt ({attempts})")]
    Conflict { path: String, attempts: u32 },
    #[error("repository host unreachable: {0}")]
    Unreachable(String),
    #[error(transparent)]
    Repo(RepoError),
    #[error("cannot write {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
    #[error("cannot render manifest: {0}")]
    Render(String),
}

impl From<RepoError> for PublishError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Unauthorized(message) => PublishError::AuthenticationFailed(message),
            RepoError::Unavailable(message) => PublishError::Unreachable(message),
            other => PublishError::Repo(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Created,
    Updated,
    Unchanged,
    Failed,
}

flowcd_core::simple_display! {
    PublishOutcome {
        Created => "created",
        Updated => "updated",
        Unchanged => "unchanged",
        Failed => "failed",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitPublishResult {
    pub outcome: PublishOutcome,
    /// Commit made by this publish; `None` when nothing was written.
    pub sha: Option<String>,
    /// Path of the manifest inside the repository or directory.
    pub path: String,
}

impl GitPublishResult {
    pub fn failed(path: impl Into<String>) -> Self {
        Self { outcome: PublishOutcome::Failed, sha: None, path: path.into() }
    }
}

/// A manifest to publish into a repository.
#[derive(Debug, Clone)]
pub struct GitPublishRequest {
    pub repo_url: String,
    pub branch: String,
    /// Directory inside the repository.
    pub path: String,
    pub resource_name: String,
    pub kind: ManifestKind,
    /// Rendered manifest, compared byte for byte.
    pub manifest: Vec<u8>,
    pub author: Option<CommitAuthor>,
    pub credentials: Option<Credentials>,
}

impl GitPublishRequest {
    /// Request with the default branch and path.
    pub fn new(
        repo_url: impl Into<String>,
        kind: ManifestKind,
        resource_name: impl Into<String>,
        manifest: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            branch: DEFAULT_BRANCH.to_string(),
            path: DEFAULT_PATH.to_string(),
            resource_name: resource_name.into(),
            kind,
            manifest: manifest.into(),
            author: None,
            credentials: None,
        }
    }

    /// Request for `manifest`, rendered.
    pub fn for_manifest(repo_url: impl Into<String>, manifest: &Manifest) -> Result<Self, PublishError> {
        let rendered = manifest.render().map_err(|e| PublishError::Render(e.to_string()))?;
        Ok(Self::new(repo_url, manifest.kind(), manifest.name(), rendered))
    }

    flowcd_core::setters! {
        into {
            branch: String,
            path: String,
        }
        option {
            author: CommitAuthor,
            credentials: Credentials,
        }
    }

    pub fn file_path(&self) -> String {
        manifest_path(&self.path, &self.resource_name)
    }
}

/// `<prefix>/<name>.yaml`, without a leading or doubled slash.
pub fn manifest_path(prefix: &str, resource_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{resource_name}.yaml")
    } else {
        format!("{prefix}/{resource_name}.yaml")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Create,
    Update,
}

/// Commit message built only from fixed words, the kind and the name.
pub fn commit_message(create: bool, kind: ManifestKind, resource_name: &str) -> String {
    let verb = if create { Verb::Create } else { Verb::Update };
    format!("{verb:?} {kind} {resource_name}")
}

/// Publishes manifests through a repository host's contents API.
#[derive(Clone)]
pub struct GitOpsPublisher<H> {
    host: H,
}

impl<H: RepoHost> GitOpsPublisher<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub async fn publish(&self, request: &GitPublishRequest) -> Result<GitPublishResult, PublishError> {
        let repo = RepoRef::parse(&request.repo_url)?;
        if request.credentials.is_none() && self.host.requires_auth(&repo) {
            return Err(PublishError::AuthenticationRequired(repo.to_string()));
        }
        let access = RepoAccess { repo, credentials: request.credentials.clone() };
        self.host.authenticate(&access).await?;
        self.ensure_branch(&access, &request.branch).await?;

        let path = request.file_path();
        for attempt in 1..=PUBLISH_ATTEMPTS {
            let existing = self.host.get_file(&access, &request.branch, &path).await?;
            let expected_revision = match existing {
                Some(file) if file.content == request.manifest => {
                    tracing::info!(repo = %access.repo, %path, "manifest unchanged");
                    return Ok(GitPublishResult { outcome: PublishOutcome::Unchanged, sha: None, path });
                }
                Some(file) => Some(file.revision),
                None => None,
            };
            let create = expected_revision.is_none();
            let put = PutFile {
                branch: request.branch.clone(),
                path: path.clone(),
                content: request.manifest.clone(),
                message: commit_message(create, request.kind, &request.resource_name),
                author: request.author.clone(),
                expected_revision,
            };
            match self.host.put_file(&access, &put).await {
                Ok(commit) => {
                    let outcome = if create { PublishOutcome::Created } else { PublishOutcome::Updated };
                    tracing::info!(repo = %access.repo, %path, %outcome, sha = %commit.sha, "manifest published");
                    return Ok(GitPublishResult { outcome, sha: Some(commit.sha), path });
                }
                Err(RepoError::Conflict(message)) => {
                    tracing::warn!(repo = %access.repo, %path, attempt, %message, "concurrent write, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(PublishError::Conflict { path, attempts: PUBLISH_ATTEMPTS })
    }

    /// Create `branch` from the default branch tip when it does not exist.
    async fn ensure_branch(&self, access: &RepoAccess, branch: &str) -> Result<(), PublishError> {
        if self.host.get_branch(access, branch).await?.is_some() {
            return Ok(());
        }
        let default = self.host.default_branch(access).await?;
        let tip = self
            .host
            .get_branch(access, &default)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("default branch {default} has no commits")))?;
        tracing::info!(repo = %access.repo, %branch, from = %default, "creating branch");
        self.host.create_branch(access, branch, &tip).await?;
        Ok(())
    }
}

/// Publishes manifests into a local directory with the same contract.
#[derive(Debug, Clone)]
pub struct LocalPublisher {
    root: PathBuf,
}

impl LocalPublisher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn publish(
        &self,
        prefix: &str,
        resource_name: &str,
        manifest: &[u8],
    ) -> Result<GitPublishResult, PublishError> {
        let relative = manifest_path(prefix, resource_name);
        let target = self.root.join(&relative);
        let io_err = |e: std::io::Error| PublishError::Io { path: target.clone(), message: e.to_string() };

        let existing = match tokio::fs::read(&target).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(io_err(e)),
        };
        let outcome = match existing {
            Some(bytes) if bytes == manifest => PublishOutcome::Unchanged,
            Some(_) => PublishOutcome::Updated,
            None => PublishOutcome::Created,
        };
        if outcome != PublishOutcome::Unchanged {
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
            tokio::fs::write(&target, manifest).await.map_err(io_err)?;
        }
        tracing::info!(path = %target.display(), %outcome, "manifest saved");
        Ok(GitPublishResult { outcome, sha: None, path: relative })
    }
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
