// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flowcd - submit Argo workflows and publish Argo CD manifests

mod color;
mod commands;
mod config;
mod env;
mod exit_error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{config as config_cmd, delete, list, logs, render, status, submit, templates, Globals};
use exit_error::ExitError;
use output::OutputFormat;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")");

#[derive(Parser)]
#[command(
    name = "flowcd",
    version = VERSION,
    about = "Submit workflow jobs, follow them, and publish their manifests to Git",
    styles = color::styles(),
)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Namespace jobs run in [env: FLOWCD_NAMESPACE]
    #[arg(short = 'n', long, global = true)]
    namespace: Option<String>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    context: Option<String>,

    /// Config file [env: FLOWCD_CONFIG]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a job and follow it to completion
    Submit(submit::SubmitArgs),
    /// Show the state of a job
    Status {
        /// Job name
        name: String,
        /// Keep printing until the job finishes
        #[arg(long, short)]
        watch: bool,
    },
    /// Show step logs of a job
    Logs {
        /// Job name
        name: String,
        /// Only this step (display name or node id)
        #[arg(long)]
        step: Option<String>,
        /// Stream new lines until the job finishes
        #[arg(long, short)]
        follow: bool,
    },
    /// List jobs
    List {
        /// Label selector (repeatable: -l key=value)
        #[arg(short = 'l', long = "label", value_parser = commands::parse_key_value)]
        labels: Vec<(String, String)>,
    },
    /// Delete jobs
    Delete(delete::DeleteArgs),
    /// Manage workflow templates on the cluster
    Templates(templates::TemplatesArgs),
    /// Print a manifest without submitting anything
    Render(render::RenderArgs),
    /// Inspect configuration
    Config(config_cmd::ConfigArgs),
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => env::log_filter()
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let globals = Globals {
        namespace: cli.namespace,
        context: cli.context,
        config: cli.config,
        format: cli.output,
    };
    match cli.command {
        Commands::Submit(args) => submit::handle(args.command, &globals).await,
        Commands::Status { name, watch } => status::handle(&name, watch, &globals).await,
        Commands::Logs { name, step, follow } => logs::handle(&name, step.as_deref(), follow, &globals).await,
        Commands::List { labels } => list::handle(labels, &globals).await,
        Commands::Delete(args) => delete::handle(args, &globals).await,
        Commands::Templates(args) => templates::handle(args.command, &globals).await,
        Commands::Render(args) => render::handle(args.command, &globals),
        Commands::Config(args) => config_cmd::handle(args.command, &globals),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ExitError>() {
            Some(exit) => {
                if !exit.message.is_empty() {
                    eprintln!("error: {}", exit.message);
                }
                ExitCode::from(u8::try_from(exit.code).unwrap_or(1))
            }
            None => {
                eprintln!("error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}
