// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration file and effective settings.
//!
//! Precedence, highest first: command-line flag, environment, config file,
//! built-in default.

use flowcd_adapters::{CommitAuthor, Credentials, DEFAULT_API_URL};
use flowcd_engine::{FlowConfig, TrackerConfig, DEFAULT_BRANCH, DEFAULT_NAMESPACE, DEFAULT_PATH, DEFAULT_POLL_INTERVAL};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid config {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("poll_interval_ms must be greater than zero")]
    ZeroPollInterval,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub namespace: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub gitops: GitopsFile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitopsFile {
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub path: Option<String>,
    pub api_url: Option<String>,
    pub author: Option<AuthorFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorFile {
    pub name: String,
    pub email: String,
}

impl FileConfig {
    /// Load `path`. A missing file is an empty config unless `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

/// Values from flags and the environment that override the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub namespace_flag: Option<String>,
    pub namespace_env: Option<String>,
    pub git_username: Option<String>,
    pub git_token: Option<SecretString>,
}

#[derive(Debug, Clone)]
pub struct GitopsSettings {
    /// Repository manifests are published to; publishing is off when unset.
    pub repo: Option<String>,
    pub branch: String,
    pub path: String,
    pub api_url: String,
    pub author: Option<CommitAuthor>,
    pub credentials: Option<Credentials>,
}

/// Effective configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// File the settings were read from, if it existed.
    pub source: Option<PathBuf>,
    pub namespace: String,
    pub poll_interval: Duration,
    pub gitops: GitopsSettings,
}

impl Settings {
    pub fn resolve(file: FileConfig, source: Option<PathBuf>, overrides: Overrides) -> Result<Self, ConfigError> {
        let namespace = overrides
            .namespace_flag
            .or(overrides.namespace_env)
            .or(file.namespace)
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let poll_interval = match file.poll_interval_ms {
            Some(0) => return Err(ConfigError::ZeroPollInterval),
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_POLL_INTERVAL,
        };
        let credentials = overrides.git_token.map(|token| Credentials {
            username: overrides.git_username.clone(),
            token,
        });
        if credentials.is_none() && overrides.git_username.is_some() {
            tracing::warn!("GIT_USERNAME is set without GIT_TOKEN; publishing without credentials");
        }
        let gitops = GitopsSettings {
            repo: file.gitops.repo,
            branch: file.gitops.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            path: file.gitops.path.unwrap_or_else(|| DEFAULT_PATH.to_string()),
            api_url: file.gitops.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            author: file.gitops.author.map(|a| CommitAuthor { name: a.name, email: a.email }),
            credentials,
        };
        Ok(Self { source, namespace, poll_interval, gitops })
    }

    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig {
            namespace: self.namespace.clone(),
            tracker: TrackerConfig { poll_interval: self.poll_interval },
        }
    }

    /// Printable view; the token itself never appears.
    pub fn shown(&self) -> ShownSettings {
        let credentials = self.gitops.credentials.as_ref();
        ShownSettings {
            config_file: self.source.as_ref().map(|p| p.display().to_string()),
            namespace: self.namespace.clone(),
            poll_interval_ms: self.poll_interval.as_millis() as u64,
            gitops: ShownGitops {
                repo: self.gitops.repo.clone(),
                branch: self.gitops.branch.clone(),
                path: self.gitops.path.clone(),
                api_url: self.gitops.api_url.clone(),
                username: credentials.and_then(|c| c.username.clone()),
                token: if credentials.is_some() { "[redacted]" } else { "(unset)" }.to_string(),
                author: self.gitops.author.as_ref().map(|a| ShownAuthor {
                    name: a.name.clone(),
                    email: a.email.clone(),
                }),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShownSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
    pub namespace: String,
    pub poll_interval_ms: u64,
    pub gitops: ShownGitops,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShownGitops {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    pub branch: String,
    pub path: String,
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<ShownAuthor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShownAuthor {
    pub name: String,
    pub email: String,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
