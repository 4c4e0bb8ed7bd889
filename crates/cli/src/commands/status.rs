// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd status` - show or watch one job

use anyhow::Result;
use chrono::Utc;
use flowcd_core::ExecutionSnapshot;
use flowcd_engine::FlowError;
use futures_util::StreamExt;

use super::{cancel_on_ctrl_c, connect, load_settings, Globals};
use crate::exit_error::ExitError;
use crate::output::{format_snapshot, print_json, OutputFormat};

pub async fn handle(name: &str, watch: bool, globals: &Globals) -> Result<()> {
    let settings = load_settings(globals)?;
    let flow = connect(globals, &settings).await?;
    let handle = flow.handle(name);

    // Fails with JobNotFound before any watching starts.
    let snapshot = flow.status(&handle).await.map_err(ExitError::from)?;
    if !watch || snapshot.is_terminal() {
        return print_snapshot(&snapshot, globals.format, false);
    }

    // Ctrl-C ends the stream, which just stops the display.
    let mut updates = flow.tracker().watch(&handle, cancel_on_ctrl_c());
    while let Some(update) = updates.next().await {
        match update {
            Ok(snapshot) => print_snapshot(&snapshot, globals.format, true)?,
            Err(source) => {
                return Err(ExitError::from(FlowError::Track { handle: handle.clone(), source }).into());
            }
        }
    }
    Ok(())
}

fn print_snapshot(snapshot: &ExecutionSnapshot, format: OutputFormat, streaming: bool) -> Result<()> {
    match format {
        OutputFormat::Json if streaming => {
            println!("{}", serde_json::to_string(snapshot)?);
            Ok(())
        }
        OutputFormat::Json => print_json(snapshot),
        OutputFormat::Text => {
            if streaming {
                println!();
            }
            print!("{}", format_snapshot(snapshot, Utc::now()));
            Ok(())
        }
    }
}
