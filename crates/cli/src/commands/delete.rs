// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd delete` - remove one job, or every job matching labels

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use flowcd_engine::TeardownTarget;

use super::{connect, load_settings, parse_key_value, Globals};
use crate::exit_error::{codes, ExitError};
use crate::output::{print_json, OutputFormat};

#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Job name
    #[arg(conflicts_with_all = ["labels", "resource", "all"])]
    pub name: Option<String>,
    /// Delete every job created for this application or application set
    #[arg(long, conflicts_with_all = ["labels", "all"])]
    pub resource: Option<String>,
    /// Delete jobs matching this label (repeatable: -l key=value)
    #[arg(short = 'l', long = "label", value_parser = parse_key_value, conflicts_with = "all")]
    pub labels: Vec<(String, String)>,
    /// Delete every job in the namespace
    #[arg(long)]
    pub all: bool,
    /// Keep the job's pods (and their logs) after deleting it
    #[arg(long, alias = "retain-logs")]
    pub retain_pods: bool,
    /// Skip the confirmation required for bulk deletes
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl DeleteArgs {
    /// What to delete, or why the arguments are not enough.
    pub fn target(&self, namespace: &str) -> Result<TeardownTarget, ExitError> {
        if let Some(name) = &self.name {
            return Ok(TeardownTarget::Job(flowcd_core::JobHandle::new(name, namespace)));
        }
        if self.resource.is_none() && self.labels.is_empty() && !self.all {
            return Err(ExitError::new(codes::VALIDATION, "give a job name, --resource, --label or --all"));
        }
        if !self.yes {
            return Err(ExitError::new(codes::VALIDATION, "bulk delete needs --yes to confirm"));
        }
        if let Some(resource) = &self.resource {
            return Ok(TeardownTarget::Resource(resource.clone()));
        }
        let labels: BTreeMap<String, String> = self.labels.iter().cloned().collect();
        Ok(TeardownTarget::Labels(labels))
    }
}

pub async fn handle(args: DeleteArgs, globals: &Globals) -> Result<()> {
    let settings = load_settings(globals)?;
    let target = args.target(&settings.namespace)?;
    let flow = connect(globals, &settings).await?;
    let deleted = flow.teardown(&target, args.retain_pods).await.map_err(ExitError::from)?;

    match globals.format {
        OutputFormat::Json => print_json(&deleted)?,
        OutputFormat::Text if deleted.is_empty() => println!("No jobs matched"),
        OutputFormat::Text => {
            for handle in &deleted {
                println!("deleted {handle}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "delete_tests.rs"]
mod tests;
