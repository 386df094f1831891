// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Policy document commands
//!
//! Commands: validate

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use recall_core::application::memory_tools::register_memory_tools;
use recall_core::application::tool_registry::ToolRegistry;
use recall_core::domain::policy::ResourceSet;
use recall_core::domain::security_config::SecurityConfig;
use recall_core::infrastructure::episode_store::InMemoryEpisodeStore;
use recall_core::infrastructure::policy_engine::PolicyEngine;

#[derive(Subcommand)]
pub enum PolicyCommand {
    /// Validate a policy document against the exposed tools
    Validate {
        /// Path to policy file (default: RECALL_POLICY_FILE or config/policies.json)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub async fn handle_command(command: PolicyCommand) -> Result<()> {
    match command {
        PolicyCommand::Validate { file } => validate(file).await,
    }
}

/// Load `path` with the same checks the server applies at startup.
pub fn load_policy(path: &Path) -> Result<PolicyEngine> {
    let mut registry = ToolRegistry::new();
    register_memory_tools(&mut registry, Arc::new(InMemoryEpisodeStore::new()));
    PolicyEngine::from_file(path, &registry)
        .with_context(|| format!("Policy document {} is invalid", path.display()))
}

async fn validate(file: Option<PathBuf>) -> Result<()> {
    let path = match file {
        Some(path) => path,
        None => {
            SecurityConfig::from_env()
                .context("Failed to load configuration")?
                .policy_path
        }
    };

    println!("Validating policy document {}...", path.display());
    let engine = load_policy(&path)?;

    println!("{}", "✓ Policy document is valid".green());
    println!();
    println!("{}", "Roles:".bold());
    for role in engine.roles() {
        match engine.resources_for(role) {
            ResourceSet::All => println!("  {} → {}", role.to_string().bold(), "* (every tool)".yellow()),
            ResourceSet::Only(_) => {
                let allowed: Vec<String> = engine.visible_operations(role).into_iter().collect();
                println!("  {} → {}", role.to_string().bold(), allowed.join(", "));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::domain::principal::Role;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_policy_document_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/policies.json");
        let engine = load_policy(&path).unwrap();

        assert_eq!(engine.len(), 3);
        assert_eq!(engine.visible_operations(&Role::Admin).len(), 9);
        assert!(engine.visible_operations(&Role::Analyst).contains("add_memory"));
        assert!(!engine.visible_operations(&Role::Readonly).contains("add_memory"));
    }

    #[test]
    fn test_yaml_document_with_unknown_tool_is_rejected() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(
            file,
            "version: \"1.0\"\npolicies:\n  - role: readonly\n    resources: [get_status, drop_tables]"
        )
        .unwrap();

        let err = load_policy(file.path()).unwrap_err();

        assert!(format!("{err:#}").contains("drop_tables"));
    }
}
