// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd templates` - workflow templates on the cluster

use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::Result;
use clap::{Args, Subcommand};
use flowcd_core::{TemplateCatalog, ValidationError};
use flowcd_engine::{FlowError, TemplateStatus};

use super::{connect, load_settings, Globals};
use crate::color;
use crate::exit_error::ExitError;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    pub command: TemplatesCommand,
}

#[derive(Subcommand)]
pub enum TemplatesCommand {
    /// Install the built-in templates into the namespace
    Install {
        /// Install only this template
        #[arg(long)]
        only: Option<String>,
    },
    /// Compare built-in templates with those on the cluster
    List,
    /// Print a built-in template as the document that would be installed
    Show {
        /// Template name
        name: String,
    },
}

pub async fn handle(command: TemplatesCommand, globals: &Globals) -> Result<()> {
    let settings = load_settings(globals)?;
    match command {
        TemplatesCommand::Install { only } => {
            let flow = connect(globals, &settings).await?;
            let installed = flow.install_templates(only.as_deref()).await.map_err(ExitError::from)?;
            match globals.format {
                OutputFormat::Json => print_json(&installed)?,
                OutputFormat::Text => {
                    for name in &installed {
                        println!("installed {name} in {}", settings.namespace);
                    }
                }
            }
        }
        TemplatesCommand::List => {
            let flow = connect(globals, &settings).await?;
            let status = flow.template_status().await.map_err(ExitError::from)?;
            match globals.format {
                OutputFormat::Json => print_json(&status)?,
                OutputFormat::Text => print!("{}", format_template_status(&status)),
            }
        }
        TemplatesCommand::Show { name } => {
            let catalog = TemplateCatalog::builtin();
            let template = catalog
                .get(&name)
                .ok_or_else(|| ExitError::from(FlowError::from(ValidationError::UnknownTemplate(name.clone()))))?;
            let doc = template.to_workflow_template(&settings.namespace);
            match globals.format {
                OutputFormat::Json => print_json(&doc)?,
                OutputFormat::Text => print!("{}", serde_yaml::to_string(&doc)?),
            }
        }
    }
    Ok(())
}

pub(crate) fn format_template_status(status: &BTreeMap<String, TemplateStatus>) -> String {
    let width = status.keys().map(String::len).max().unwrap_or(0).max("NAME".len());
    let mut out = String::new();
    let _ = writeln!(out, "{}", color::header(&format!("{:<width$}  CATALOG  INSTALLED", "NAME")));
    for (name, entry) in status {
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        let _ = writeln!(out, "{name:<width$}  {:<7}  {}", yes_no(entry.in_catalog), yes_no(entry.installed));
    }
    out
}

#[cfg(test)]
#[path = "templates_tests.rs"]
mod tests;
