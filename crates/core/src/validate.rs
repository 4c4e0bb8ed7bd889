// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value checks applied by the binder.
//!
//! Each check returns a human-readable reason on failure; the binder attaches
//! the parameter name.

use crate::manifest::Environment;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

/// RFC 1123 label: lowercase alphanumerics and `-`, alphanumeric at both ends.
#[allow(clippy::expect_used)]
static DNS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("constant regex pattern is valid")
});

/// Repository URLs accepted by the deployment controller.
#[allow(clippy::expect_used)]
static REPO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://[^\s/]+(/\S*)?|git@[^\s:]+:\S+|(git|ssh)://[^\s/]+(/\S*)?)$")
        .expect("constant regex pattern is valid")
});

const MAX_LABEL_LEN: usize = 63;

/// Named check attached to a template parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    DnsLabel,
    RepoUrl,
    ChartPath,
    Bool,
    OneOf(&'static [&'static str]),
    HelmParameters,
    Environments,
}

impl Check {
    /// Run the check against a bound (stringified) value. Empty optional
    /// values are not checked.
    pub fn run(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Ok(());
        }
        match self {
            Check::DnsLabel => dns_label(value),
            Check::RepoUrl => repo_url(value),
            Check::ChartPath => chart_path(value),
            Check::Bool => match value {
                "true" | "false" => Ok(()),
                _ => Err(format!("expected true or false, got {value:?}")),
            },
            Check::OneOf(allowed) => {
                if allowed.contains(&value) {
                    Ok(())
                } else {
                    Err(format!("must be one of {}, got {value:?}", allowed.join(", ")))
                }
            }
            Check::HelmParameters => parse_helm_parameters(value).map(|_| ()),
            Check::Environments => parse_environments(value).map(|_| ()),
        }
    }
}

pub fn dns_label(value: &str) -> Result<(), String> {
    if value.len() > MAX_LABEL_LEN {
        return Err(format!("must be at most {MAX_LABEL_LEN} characters"));
    }
    if !DNS_LABEL.is_match(value) {
        return Err(format!(
            "{value:?} must consist of lowercase alphanumerics or '-', \
             starting and ending with an alphanumeric"
        ));
    }
    Ok(())
}

pub fn repo_url(value: &str) -> Result<(), String> {
    if REPO_URL.is_match(value) {
        Ok(())
    } else {
        Err(format!("{value:?} is not an http(s), git@, git:// or ssh:// repository URL"))
    }
}

pub fn chart_path(value: &str) -> Result<(), String> {
    if value.starts_with('/') {
        return Err("must be relative to the repository root".to_string());
    }
    if value.split('/').any(|part| part == "..") {
        return Err("must not contain '..'".to_string());
    }
    Ok(())
}

/// Parse `key=value,key=value` into an ordered map.
///
/// Whitespace around keys and values is trimmed; the value may itself
/// contain `=`. Later duplicates overwrite earlier ones in place.
pub fn parse_helm_parameters(value: &str) -> Result<IndexMap<String, String>, String> {
    let mut params = IndexMap::new();
    if value.trim().is_empty() {
        return Ok(params);
    }
    for entry in value.split(',') {
        let (key, val) = entry
            .split_once('=')
            .ok_or_else(|| format!("entry {:?} is not key=value", entry.trim()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("entry {:?} has an empty key", entry.trim()));
        }
        params.insert(key.to_string(), val.trim().to_string());
    }
    Ok(params)
}

/// Parse and check a canonical environments document.
pub fn parse_environments(value: &str) -> Result<Vec<Environment>, String> {
    let raw: serde_json::Value =
        serde_json::from_str(value).map_err(|e| format!("not valid JSON: {e}"))?;
    let items = raw.as_array().ok_or("must be a JSON array of environments")?;
    if items.is_empty() {
        return Err("at least one environment is required".to_string());
    }
    let mut envs = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| format!("environment {idx} must be an object"))?;
        let label = obj.get("name").and_then(|v| v.as_str()).map_or(idx.to_string(), String::from);
        let mut missing: Vec<&str> = Vec::new();
        for field in ["name", "namespace"] {
            if !has_text(obj.get(field)) {
                missing.push(field);
            }
        }
        if !has_text(obj.get("cluster")) && !has_text(obj.get("cluster_url")) {
            missing.push("cluster");
        }
        if !missing.is_empty() {
            return Err(format!("environment {label:?} missing: {}", missing.join(", ")));
        }
        let env: Environment = serde_json::from_value(item.clone())
            .map_err(|e| format!("environment {label:?}: {e}"))?;
        dns_label(&env.name).map_err(|e| format!("environment name {e}"))?;
        dns_label(&env.namespace).map_err(|e| format!("environment {label:?} namespace {e}"))?;
        envs.push(env);
    }
    Ok(envs)
}

fn has_text(value: Option<&serde_json::Value>) -> bool {
    value.and_then(|v| v.as_str()).is_some_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
