// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `recall serve`: compose the security pipeline and run a transport.
//!
//! Startup order: configuration, metrics exporter, pipeline (credential table,
//! policy document), then the listener. Any configuration error exits before
//! a socket is bound.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use recall_core::domain::security_config::{parse_flag, SecurityConfig, ENV_AUTH_ENABLED};
use recall_core::infrastructure::audit::AuditLogger;
use recall_core::infrastructure::episode_store::InMemoryEpisodeStore;
use recall_core::presentation::mcp::McpService;
use recall_core::presentation::stdio::serve_stdio;

use crate::server;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    Http,
    Stdio,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Transport to serve MCP over
    #[arg(long, env = "RECALL_TRANSPORT", value_enum, default_value = "http")]
    pub transport: TransportKind,

    /// HTTP bind host
    #[arg(long, env = "RECALL_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// HTTP bind port
    #[arg(long, env = "RECALL_PORT", default_value = "8000")]
    pub port: u16,

    /// Policy document (JSON, or YAML for .yaml/.yml)
    #[arg(long, env = "RECALL_POLICY_FILE", value_name = "FILE")]
    pub policy_file: Option<PathBuf>,

    /// Enable bearer-token authentication (true/false)
    #[arg(long, env = "RECALL_AUTH_ENABLED", value_name = "BOOL")]
    pub auth_enabled: Option<String>,

    /// Serve Prometheus metrics on this port
    #[arg(long, env = "RECALL_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

impl ServeArgs {
    /// Layer command-line overrides on top of the environment configuration.
    pub fn apply_overrides(&self, mut config: SecurityConfig) -> Result<SecurityConfig> {
        if let Some(path) = &self.policy_file {
            config.policy_path = path.clone();
        }
        if let Some(flag) = &self.auth_enabled {
            config.auth_enabled = parse_flag(ENV_AUTH_ENABLED, flag)?;
        }
        Ok(config)
    }
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = SecurityConfig::from_env().context("Invalid security configuration")?;
    let config = args.apply_overrides(config)?;

    if let Some(port) = args.metrics_port {
        server::install_metrics_exporter(port)?;
    }

    let store = Arc::new(InMemoryEpisodeStore::new());
    let audit = Arc::new(AuditLogger::new());
    let mcp = McpService::bootstrap(&config, store, audit)
        .context("Refusing to start with an invalid security configuration")?;
    info!(
        "Security pipeline ready: stages={:?}, tools={}",
        mcp.pipeline().stage_names(),
        mcp.registry().len()
    );
    let mcp = Arc::new(mcp);

    match args.transport {
        TransportKind::Http => server::serve_http(mcp, &args.host, args.port).await,
        TransportKind::Stdio => serve_stdio(mcp).await,
    }
}
