// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flowcd render` - print a manifest offline

use anyhow::Result;
use clap::{Args, Subcommand};
use flowcd_core::{ManifestKind, RawInput, TemplateCatalog};
use flowcd_engine::Rendered;

use super::submit::{AppInput, AppSetInput};
use super::Globals;
use crate::exit_error::ExitError;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct RenderArgs {
    #[command(subcommand)]
    pub command: RenderCommand,
}

#[derive(Subcommand)]
pub enum RenderCommand {
    /// Render an Application manifest
    App(AppInput),
    /// Render an ApplicationSet manifest
    Appset(AppSetInput),
}

impl RenderCommand {
    fn input(&self) -> (ManifestKind, RawInput) {
        match self {
            RenderCommand::App(input) => (ManifestKind::Application, input.to_input()),
            RenderCommand::Appset(input) => (ManifestKind::ApplicationSet, input.to_input()),
        }
    }
}

/// Bind and render without touching the cluster or any repository.
pub fn rendered(command: &RenderCommand) -> Result<Rendered, ExitError> {
    let (kind, input) = command.input();
    flowcd_engine::render(&TemplateCatalog::builtin(), kind, &input).map_err(ExitError::from)
}

pub fn handle(command: RenderCommand, globals: &Globals) -> Result<()> {
    let rendered = rendered(&command)?;
    match globals.format {
        OutputFormat::Json => print_json(&rendered.manifest)?,
        // Exactly the bytes a publish would write.
        OutputFormat::Text => print!("{}", rendered.text),
    }
    Ok(())
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
