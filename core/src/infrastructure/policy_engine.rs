// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Role Policy Engine
//!
//! Immutable role → [`ResourceSet`] table answering "may this role invoke this
//! operation?". Built once at startup from a [`PolicyDocument`]; loading is
//! all-or-nothing, so a server never runs with a partially applied policy.
//!
//! ## Load-time checks (first failure aborts)
//!
//! 1. document parses and `version == "1.0"`
//! 2. every role name is non-empty and appears once
//! 3. `"*"` is the only resource when present
//! 4. every named operation is exposed by the server
//!
//! ## Query
//!
//! Unknown roles fall through to the empty set and are denied everything.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::domain::errors::ConfigurationError;
use crate::domain::operation::OperationCatalog;
use crate::domain::policy::{
    PolicyDecision, PolicyDocument, PolicyFormat, ResourceSet, SUPPORTED_POLICY_VERSION,
    WILDCARD_RESOURCE,
};
use crate::domain::principal::Role;

#[derive(Debug, Clone)]
pub struct PolicyEngine {
    policies: BTreeMap<Role, ResourceSet>,
    exposed: BTreeSet<String>,
}

impl PolicyEngine {
    /// Validate a parsed document against the server's exposed operations.
    pub fn from_document(
        document: PolicyDocument,
        catalog: &dyn OperationCatalog,
    ) -> Result<Self, ConfigurationError> {
        if document.version != SUPPORTED_POLICY_VERSION {
            return Err(ConfigurationError::UnsupportedVersion(document.version));
        }

        let exposed = catalog.operation_names();
        let mut policies = BTreeMap::new();

        for entry in document.policies {
            if entry.role.trim().is_empty() {
                return Err(ConfigurationError::EmptyRole);
            }
            let role = Role::from(entry.role.as_str());
            if policies.contains_key(&role) {
                return Err(ConfigurationError::DuplicateRole(role));
            }

            let has_wildcard = entry.resources.iter().any(|r| r == WILDCARD_RESOURCE);
            let resources = if has_wildcard {
                if entry.resources.len() != 1 {
                    return Err(ConfigurationError::WildcardMixed(role));
                }
                ResourceSet::All
            } else {
                for operation in &entry.resources {
                    if !exposed.contains(operation) {
                        return Err(ConfigurationError::UnknownOperation {
                            role,
                            operation: operation.clone(),
                        });
                    }
                }
                ResourceSet::Only(entry.resources.into_iter().collect())
            };

            tracing::debug!("Policy loaded for role \"{}\": {:?}", role, resources);
            policies.insert(role, resources);
        }

        Ok(Self { policies, exposed })
    }

    pub fn parse(
        content: &str,
        format: PolicyFormat,
        catalog: &dyn OperationCatalog,
    ) -> Result<Self, ConfigurationError> {
        Self::from_document(PolicyDocument::parse(content, format)?, catalog)
    }

    /// Read, parse and validate a policy file. A missing file is fatal.
    pub fn from_file(
        path: impl AsRef<Path>,
        catalog: &dyn OperationCatalog,
    ) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            ConfigurationError::PolicyFileUnreadable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::parse(&content, PolicyFormat::from_path(path), catalog)
    }

    pub fn query(&self, role: &Role, operation: &str) -> PolicyDecision {
        let permitted = self
            .policies
            .get(role)
            .is_some_and(|resources| resources.permits(operation));
        if permitted {
            PolicyDecision::Allow
        } else {
            PolicyDecision::Deny
        }
    }

    /// Exposed operations the role could invoke successfully.
    pub fn visible_operations(&self, role: &Role) -> BTreeSet<String> {
        self.exposed
            .iter()
            .filter(|operation| self.query(role, operation).is_allowed())
            .cloned()
            .collect()
    }

    pub fn resources_for(&self, role: &Role) -> ResourceSet {
        self.policies.get(role).cloned().unwrap_or_else(ResourceSet::empty)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.policies.keys()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
