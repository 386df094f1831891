// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use recall_core::domain::audit::redact_token;
use recall_core::domain::security_config::{SecurityConfig, ENV_API_KEY_PREFIX};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective security configuration (credentials redacted)
    Show,
}

pub async fn handle_command(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => show().await,
    }
}

/// Lines printed by `config show`. Credentials pass through the audit
/// redaction rule and never appear in full.
pub fn render(config: &SecurityConfig) -> Vec<String> {
    let mut lines = Vec::new();

    let auth = if config.auth_enabled {
        "enabled".green().to_string()
    } else {
        "DISABLED (development mode)".red().bold().to_string()
    };
    lines.push(format!("  Authentication: {}", auth));
    if !config.auth_enabled {
        lines.push(format!("  Development role: {}", config.dev_role));
    }
    lines.push(format!("  Policy file: {}", config.policy_path.display()));
    lines.push(format!(
        "  Exempt paths: {}",
        config.exempt_paths.iter().cloned().collect::<Vec<_>>().join(", ")
    ));

    lines.push(String::new());
    lines.push(format!("{}", "Credentials:".bold()));
    if config.credentials.is_empty() {
        lines.push(format!(
            "  {}",
            format!("(none configured; set {}<ROLE>)", ENV_API_KEY_PREFIX).dimmed()
        ));
    }
    for (role, token) in &config.credentials {
        lines.push(format!("  {}: {}", role, redact_token(token)));
    }

    lines
}

async fn show() -> Result<()> {
    let config = SecurityConfig::from_env().context("Failed to load configuration")?;

    println!("{}", "Security configuration:".bold());
    println!();
    for line in render(&config) {
        println!("{}", line);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_redacts_credentials() {
        let config = SecurityConfig::from_vars([
            ("RECALL_API_KEY_ADMIN", "sk_admin_ZZZZ9999"),
            ("RECALL_API_KEY_READONLY", "short"),
        ])
        .unwrap();

        let output = render(&config).join("\n");

        assert!(output.contains("admin: sk_admin..."));
        assert!(output.contains("readonly: invalid"));
        assert!(!output.contains("sk_admin_ZZZZ9999"));
        assert!(!output.contains("short"));
    }

    #[test]
    fn test_render_flags_disabled_auth() {
        let config = SecurityConfig::from_vars([("RECALL_AUTH_ENABLED", "false")]).unwrap();

        let output = render(&config).join("\n");

        assert!(output.contains("DISABLED"));
        assert!(output.contains("Development role: admin"));
    }
}
