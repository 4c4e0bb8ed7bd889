// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd logs` - step logs of a job

use anyhow::Result;
use flowcd_core::LogEntry;
use futures_util::StreamExt;

use super::{cancel_on_ctrl_c, connect, load_settings, Globals};
use crate::exit_error::ExitError;
use crate::output::{format_log_entry, OutputFormat};

pub async fn handle(name: &str, step: Option<&str>, follow: bool, globals: &Globals) -> Result<()> {
    let settings = load_settings(globals)?;
    let flow = connect(globals, &settings).await?;
    let handle = flow.handle(name);
    flow.status(&handle).await.map_err(ExitError::from)?;

    // A single step needs no node prefix.
    let show_node = step.is_none();
    if !follow {
        let entries = flow.logs().collect(&handle, step).await?;
        if entries.is_empty() && globals.format == OutputFormat::Text {
            eprintln!("no logs for {handle}");
        }
        for entry in &entries {
            print_entry(entry, globals.format, show_node)?;
        }
        return Ok(());
    }

    let mut entries = flow.logs().logs(&handle, step, cancel_on_ctrl_c()).await?;
    while let Some(entry) = entries.next().await {
        print_entry(&entry?, globals.format, show_node)?;
    }
    Ok(())
}

fn print_entry(entry: &LogEntry, format: OutputFormat, show_node: bool) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(entry)?),
        OutputFormat::Text => println!("{}", format_log_entry(entry, show_node)),
    }
    Ok(())
}
