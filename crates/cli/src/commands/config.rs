// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd config` - effective configuration

use anyhow::Result;
use clap::{Args, Subcommand};

use super::{load_settings, Globals};
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration; the Git token is redacted
    Show,
}

pub fn handle(command: ConfigCommand, globals: &Globals) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let shown = load_settings(globals)?.shown();
            match globals.format {
                OutputFormat::Json => print_json(&shown)?,
                OutputFormat::Text => print!("{}", toml::to_string(&shown)?),
            }
        }
    }
    Ok(())
}
