// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binding raw user input to a template's parameter schema.
//!
//! [`bind`] is a pure function of its inputs plus the file reads needed to
//! resolve `@path` references and values files. Nothing is sent anywhere.

use crate::template::{JobTemplate, ParamDefault, ParamKind, ParamSpec};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix marking a structured value as a reference to a JSON file.
pub const REFERENCE_MARKER: char = '@';

/// Rejected input, always naming the offending field or file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("cannot resolve {}: {cause}", path.display())]
    UnresolvableReference { path: PathBuf, cause: String },

    #[error("invalid values file {}: {cause}", path.display())]
    InvalidValuesFile { path: PathBuf, cause: String },

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl ValidationError {
    /// Name of the offending parameter, when the error concerns one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingParameter(name)
            | ValidationError::UnknownParameter(name)
            | ValidationError::InvalidValue { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Unchecked input as collected from the caller.
///
/// Values are JSON so that numbers, booleans and structured documents keep
/// their type until binding canonicalizes them. `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInput {
    values: IndexMap<String, Value>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut input = RawInput::new();
        for (k, v) in iter {
            input.insert(k, v);
        }
        input
    }
}

/// Bound parameters for one template, in schema order.
///
/// Only [`bind`] constructs these, so every required parameter is present
/// and no unknown parameter can appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSet {
    template: String,
    values: IndexMap<String, String>,
}

impl ParameterSet {
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of a schema parameter, empty when unset.
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// Boolean flag as canonicalized by the binder.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name) == Some("true")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Validate and normalize `raw` against `template`'s schema.
pub fn bind(template: &JobTemplate, raw: &RawInput) -> Result<ParameterSet, ValidationError> {
    if let Some(unknown) = raw.names().find(|name| template.param(name).is_none()) {
        return Err(ValidationError::UnknownParameter(unknown.to_string()));
    }

    let mut values: IndexMap<String, String> = IndexMap::with_capacity(template.params.len());
    for spec in &template.params {
        let value = match raw.get(&spec.name) {
            Some(value) => normalize(spec, value)?,
            None => String::new(),
        };
        let value = if value.is_empty() { default_for(spec, &values) } else { value };
        if spec.required && value.is_empty() {
            return Err(ValidationError::MissingParameter(spec.name.clone()));
        }
        if let Some(check) = &spec.check {
            check.run(&value).map_err(|reason| ValidationError::InvalidValue {
                name: spec.name.clone(),
                reason,
            })?;
        }
        values.insert(spec.name.clone(), value);
    }

    Ok(ParameterSet { template: template.name.clone(), values })
}

fn default_for(spec: &ParamSpec, bound: &IndexMap<String, String>) -> String {
    match &spec.default {
        Some(ParamDefault::Literal(value)) => value.clone(),
        Some(ParamDefault::FromParam(other)) => bound.get(other).cloned().unwrap_or_default(),
        None => String::new(),
    }
}

fn normalize(spec: &ParamSpec, value: &Value) -> Result<String, ValidationError> {
    match spec.kind {
        ParamKind::Scalar => scalar(spec, value),
        ParamKind::Structured => structured(spec, value),
        ParamKind::ValuesFile => {
            let path = scalar(spec, value)?;
            if !path.is_empty() {
                check_values_file(Path::new(&path))?;
            }
            Ok(path)
        }
    }
}

fn scalar(spec: &ParamSpec, value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        // Substitution only takes strings, so documents become canonical JSON.
        Value::Array(_) | Value::Object(_) => canonical_json(spec, value),
    }
}

fn structured(spec: &ParamSpec, value: &Value) -> Result<String, ValidationError> {
    let Value::String(text) = value else {
        return canonical_json(spec, value);
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(String::new());
    }
    let parsed: Value = if let Some(path) = text.strip_prefix(REFERENCE_MARKER) {
        resolve_reference(Path::new(path))?
    } else {
        serde_json::from_str(text).map_err(|e| ValidationError::InvalidValue {
            name: spec.name.clone(),
            reason: format!("not valid JSON: {e}"),
        })?
    };
    canonical_json(spec, &parsed)
}

fn resolve_reference(path: &Path) -> Result<Value, ValidationError> {
    let unresolvable =
        |cause: String| ValidationError::UnresolvableReference { path: path.to_path_buf(), cause };
    let content = std::fs::read_to_string(path).map_err(|e| unresolvable(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| unresolvable(format!("not valid JSON: {e}")))
}

fn check_values_file(path: &Path) -> Result<(), ValidationError> {
    let invalid =
        |cause: String| ValidationError::InvalidValuesFile { path: path.to_path_buf(), cause };
    let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let doc: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| invalid(format!("not valid YAML: {e}")))?;
    match doc {
        serde_yaml::Value::Mapping(_) | serde_yaml::Value::Null => Ok(()),
        _ => Err(invalid("top level must be a mapping".to_string())),
    }
}

/// Keys sorted, no insignificant whitespace.
fn canonical_json(spec: &ParamSpec, value: &Value) -> Result<String, ValidationError> {
    serde_json::to_string(&sorted(value)).map_err(|e| ValidationError::InvalidValue {
        name: spec.name.clone(),
        reason: e.to_string(),
    })
}

// Rebuild objects in key order; `Map` keeps insertion order when another
// crate in the graph turns on `preserve_order`.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k.clone(), sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
#[path = "binder_tests.rs"]
mod tests;
