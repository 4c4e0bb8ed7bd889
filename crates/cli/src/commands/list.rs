// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd list` - jobs in the namespace

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::Utc;

use super::{connect, load_settings, Globals};
use crate::exit_error::ExitError;
use crate::output::{format_job_table, print_json, OutputFormat};

pub async fn handle(labels: Vec<(String, String)>, globals: &Globals) -> Result<()> {
    let settings = load_settings(globals)?;
    let flow = connect(globals, &settings).await?;
    let labels: BTreeMap<String, String> = labels.into_iter().collect();
    let jobs = flow.list_jobs(&labels).await.map_err(ExitError::from)?;

    match globals.format {
        OutputFormat::Json => print_json(&jobs)?,
        OutputFormat::Text if jobs.is_empty() => println!("No jobs in {}", settings.namespace),
        OutputFormat::Text => print!("{}", format_job_table(&jobs, Utc::now())),
    }
    Ok(())
}
