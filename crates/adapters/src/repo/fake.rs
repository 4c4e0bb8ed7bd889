// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory repository host for tests.

use super::{CommitInfo, FileContent, PutFile, RepoAccess, RepoError, RepoHost, RepoRef};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// Recorded repository call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCall {
    Authenticate,
    DefaultBranch,
    GetBranch(String),
    CreateBranch { branch: String, from: String },
    GetFile { branch: String, path: String },
    PutFile(PutFile),
}

struct FakeRepoState {
    default_branch: String,
    /// Branch name to tip commit.
    branches: BTreeMap<String, String>,
    /// (branch, path) to (content, revision).
    files: BTreeMap<(String, String), (Vec<u8>, String)>,
    commits: Vec<PutFile>,
    requires_auth: bool,
    /// Token the host accepts; any token when unset.
    accepted_token: Option<String>,
    /// Writes applied by "someone else" just before our next puts.
    interference: VecDeque<(String, String, Vec<u8>)>,
    put_errors: VecDeque<RepoError>,
    next_id: u64,
    calls: Vec<RepoCall>,
}

/// Fake repository host with revision-checked writes.
#[derive(Clone)]
pub struct FakeRepoHost {
    inner: Arc<Mutex<FakeRepoState>>,
}

impl Default for FakeRepoHost {
    fn default() -> Self {
        let state = FakeRepoState {
            default_branch: "main".to_string(),
            branches: BTreeMap::from([("main".to_string(), "commit-0".to_string())]),
            files: BTreeMap::new(),
            commits: Vec::new(),
            requires_auth: false,
            accepted_token: None,
            interference: VecDeque::new(),
            put_errors: VecDeque::new(),
            next_id: 0,
            calls: Vec::new(),
        };
        Self { inner: Arc::new(Mutex::new(state)) }
    }
}

impl FakeRepoHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require credentials; only `token` is accepted.
    pub fn requiring_token(self, token: &str) -> Self {
        {
            let mut inner = self.inner.lock();
            inner.requires_auth = true;
            inner.accepted_token = Some(token.to_string());
        }
        self
    }

    /// Seed a file as if committed earlier.
    pub fn seed_file(&self, branch: &str, path: &str, content: &[u8]) {
        let mut inner = self.inner.lock();
        let revision = inner.next_revision();
        inner.branches.entry(branch.to_string()).or_insert_with(|| "commit-0".to_string());
        inner.files.insert((branch.to_string(), path.to_string()), (content.to_vec(), revision));
    }

    /// Before each of the next puts, apply one of these writes as a
    /// concurrent writer would, invalidating any revision read earlier.
    pub fn interfere(&self, writes: impl IntoIterator<Item = (String, String, Vec<u8>)>) {
        self.inner.lock().interference.extend(writes);
    }

    /// Fail the next puts with these errors, in order.
    pub fn fail_puts(&self, errors: impl IntoIterator<Item = RepoError>) {
        self.inner.lock().put_errors.extend(errors);
    }

    pub fn file(&self, branch: &str, path: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .files
            .get(&(branch.to_string(), path.to_string()))
            .map(|(content, _)| content.clone())
    }

    pub fn paths(&self) -> Vec<(String, String)> {
        self.inner.lock().files.keys().cloned().collect()
    }

    pub fn has_branch(&self, branch: &str) -> bool {
        self.inner.lock().branches.contains_key(branch)
    }

    /// Commits made through `put_file`.
    pub fn commits(&self) -> Vec<PutFile> {
        self.inner.lock().commits.clone()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RepoCall> {
        self.inner.lock().calls.clone()
    }
}

impl FakeRepoState {
    fn next_revision(&mut self) -> String {
        self.next_id += 1;
        format!("rev-{}", self.next_id)
    }

    fn check_auth(&self, access: &RepoAccess) -> Result<(), RepoError> {
        use secrecy::ExposeSecret;
        let Some(expected) = &self.accepted_token else {
            return Ok(());
        };
        match &access.credentials {
            Some(creds) if creds.token.expose_secret() == expected.as_str() => Ok(()),
            Some(_) => Err(RepoError::Unauthorized("Bad credentials".to_string())),
            None => Err(RepoError::Unauthorized("Requires authentication".to_string())),
        }
    }
}

#[async_trait]
impl RepoHost for FakeRepoHost {
    fn requires_auth(&self, _repo: &RepoRef) -> bool {
        self.inner.lock().requires_auth
    }

    async fn authenticate(&self, access: &RepoAccess) -> Result<(), RepoError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RepoCall::Authenticate);
        inner.check_auth(access)
    }

    async fn default_branch(&self, _access: &RepoAccess) -> Result<String, RepoError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RepoCall::DefaultBranch);
        Ok(inner.default_branch.clone())
    }

    async fn get_branch(&self, _access: &RepoAccess, branch: &str) -> Result<Option<String>, RepoError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RepoCall::GetBranch(branch.to_string()));
        Ok(inner.branches.get(branch).cloned())
    }

    async fn create_branch(&self, access: &RepoAccess, branch: &str, from_sha: &str) -> Result<(), RepoError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RepoCall::CreateBranch { branch: branch.to_string(), from: from_sha.to_string() });
        inner.check_auth(access)?;
        inner.branches.entry(branch.to_string()).or_insert_with(|| from_sha.to_string());
        Ok(())
    }

    async fn get_file(
        &self,
        _access: &RepoAccess,
        branch: &str,
        path: &str,
    ) -> Result<Option<FileContent>, RepoError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RepoCall::GetFile { branch: branch.to_string(), path: path.to_string() });
        Ok(inner
            .files
            .get(&(branch.to_string(), path.to_string()))
            .map(|(content, revision)| FileContent { content: content.clone(), revision: revision.clone() }))
    }

    async fn put_file(&self, access: &RepoAccess, put: &PutFile) -> Result<CommitInfo, RepoError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RepoCall::PutFile(put.clone()));
        inner.check_auth(access)?;
        if !inner.branches.contains_key(&put.branch) {
            return Err(RepoError::NotFound(format!("Branch {} not found", put.branch)));
        }
        if let Some(err) = inner.put_errors.pop_front() {
            return Err(err);
        }

        if let Some((branch, path, content)) = inner.interference.pop_front() {
            let revision = inner.next_revision();
            inner.files.insert((branch, path), (content, revision));
        }

        let key = (put.branch.clone(), put.path.clone());
        let current = inner.files.get(&key).map(|(_, revision)| revision.clone());
        match (&current, &put.expected_revision) {
            (None, None) => {}
            (Some(current), Some(expected)) if current == expected => {}
            (Some(current), None) => {
                return Err(RepoError::Conflict(format!("{} already exists at {current}", put.path)));
            }
            (current, Some(expected)) => {
                return Err(RepoError::Conflict(format!(
                    "{} is at {} but expected {expected}",
                    put.path,
                    current.as_deref().unwrap_or("nothing")
                )));
            }
        }

        let revision = inner.next_revision();
        let sha = format!("commit-{}", inner.commits.len() + 1);
        inner.files.insert(key, (put.content.clone(), revision.clone()));
        inner.branches.insert(put.branch.clone(), sha.clone());
        inner.commits.push(put.clone());
        Ok(CommitInfo { sha, revision })
    }
}
