// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod config;
pub mod delete;
pub mod list;
pub mod logs;
pub mod render;
pub mod status;
pub mod submit;
pub mod templates;

use std::path::PathBuf;

use anyhow::Result;
use flowcd_adapters::{GitHubHost, KubeEngine};
use flowcd_engine::{FlowDeps, Orchestrator};
use tokio_util::sync::CancellationToken;

use crate::config::{FileConfig, Overrides, Settings};
use crate::env;
use crate::output::OutputFormat;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    pub namespace: Option<String>,
    pub context: Option<String>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

pub type Flow = Orchestrator<KubeEngine, GitHubHost>;

/// Effective settings: `--config` and FLOWCD_CONFIG must exist, the
/// default location may not.
pub fn load_settings(globals: &Globals) -> Result<Settings> {
    let (path, required) = match &globals.config {
        Some(path) => (Some(path.clone()), true),
        None => (env::config_path(), env::config_path_is_explicit()),
    };
    let file = match &path {
        Some(path) => FileConfig::load(path, required)?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        namespace_flag: globals.namespace.clone(),
        namespace_env: env::namespace(),
        git_username: env::git_username(),
        git_token: env::git_token(),
    };
    let source = path.filter(|p| p.exists());
    Ok(Settings::resolve(file, source, overrides)?)
}

/// Connect to the cluster and the repository host.
pub async fn connect(globals: &Globals, settings: &Settings) -> Result<Flow> {
    let engine = KubeEngine::connect(globals.context.as_deref()).await?;
    let repo = GitHubHost::new(settings.gitops.api_url.as_str())?;
    tracing::debug!(namespace = %settings.namespace, "connected");
    Ok(Orchestrator::new(FlowDeps::new(engine, repo), settings.flow_config()))
}

/// Token cancelled on the first Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted");
            cancel.cancel();
        }
    });
    token
}

/// Parse a `key=value` pair.
pub(crate) fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid input format '{s}': must be key=value"))?;
    if key.is_empty() {
        return Err(format!("invalid input format '{s}': empty key"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
