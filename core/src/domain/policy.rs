// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Role Policy Document
//!
//! Declarative mapping of roles to the operations they may invoke:
//!
//! ```json
//! { "version": "1.0",
//!   "policies": [ { "role": "readonly", "resources": ["search_nodes", "get_status"] } ] }
//! ```
//!
//! `resources: ["*"]` grants every exposed operation. A role with no entry is
//! granted nothing. Validation against the exposed operation set happens in
//! [`crate::infrastructure::policy_engine::PolicyEngine::from_document`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::errors::ConfigurationError;

pub const SUPPORTED_POLICY_VERSION: &str = "1.0";
pub const WILDCARD_RESOURCE: &str = "*";

/// Wire form of the policy file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    pub version: String,
    pub policies: Vec<PolicyEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyEntry {
    pub role: String,
    pub resources: Vec<String>,
}

/// Document encoding, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
    Json,
    Yaml,
}

impl PolicyFormat {
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

impl PolicyDocument {
    pub fn parse(content: &str, format: PolicyFormat) -> Result<Self, ConfigurationError> {
        match format {
            PolicyFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigurationError::MalformedPolicy(e.to_string())),
            PolicyFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ConfigurationError::MalformedPolicy(e.to_string())),
        }
    }
}

/// Operations granted to one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSet {
    /// Every exposed operation.
    All,
    /// Exactly these operation names.
    Only(BTreeSet<String>),
}

impl ResourceSet {
    pub fn empty() -> Self {
        Self::Only(BTreeSet::new())
    }

    pub fn permits(&self, operation: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(operation),
        }
    }
}

/// Outcome of a policy query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny,
}

impl PolicyDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}
