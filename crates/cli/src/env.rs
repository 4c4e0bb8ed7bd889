// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.
//!
//! Nothing below the CLI reads the process environment; every value
//! found here is passed down explicitly.

use secrecy::SecretString;
use std::path::PathBuf;

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Config file: FLOWCD_CONFIG > <config_dir>/flowcd/config.toml
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = non_empty("FLOWCD_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("flowcd").join("config.toml"))
}

/// Whether the config path was chosen explicitly, in which case it must exist.
pub fn config_path_is_explicit() -> bool {
    non_empty("FLOWCD_CONFIG").is_some()
}

/// Workflow namespace override
pub fn namespace() -> Option<String> {
    non_empty("FLOWCD_NAMESPACE")
}

/// Log filter directives (`EnvFilter` syntax)
pub fn log_filter() -> Option<String> {
    non_empty("FLOWCD_LOG")
}

pub fn git_username() -> Option<String> {
    non_empty("GIT_USERNAME")
}

/// Token for the GitOps repository host. Held as a secret from here on.
pub fn git_token() -> Option<SecretString> {
    non_empty("GIT_TOKEN").map(SecretString::from)
}

/// `NO_COLOR=1` disables color.
pub fn no_color() -> bool {
    std::env::var("NO_COLOR").is_ok_and(|v| v == "1")
}

/// `COLOR=1` forces color even without a terminal.
pub fn force_color() -> bool {
    std::env::var("COLOR").is_ok_and(|v| v == "1")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
