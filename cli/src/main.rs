// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Recall Server CLI
//!
//! The `recall` binary serves the memory tools over MCP behind the
//! bearer-token / role-policy security pipeline.
//!
//! ## Commands
//!
//! - `recall [serve]` - Run the server (HTTP or stdio transport)
//! - `recall policy validate [FILE]` - Check a policy document against the exposed tools
//! - `recall config show` - Print the effective security configuration, credentials redacted
//!
//! Logs go to stderr; stdout belongs to the stdio transport.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use recall_server::commands::{self, ConfigCommand, PolicyCommand, ServeArgs};
use recall_server::env_file;

/// Recall - MCP memory server with role-based tool access
#[derive(Parser)]
#[command(name = "recall")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "RECALL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server (default when no command is given)
    #[command(name = "serve")]
    Serve(ServeArgs),

    /// Policy document tools
    #[command(name = "policy")]
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_file::load_dotenv()?;

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::run(args).await,
        Some(Commands::Policy { command }) => commands::policy::handle_command(command).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command).await,
        None => commands::serve::run(cli.serve).await,
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
