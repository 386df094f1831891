// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Credential Store
//!
//! Immutable exact-match table from bearer token to [`Principal`]. Built once
//! from [`SecurityConfig::credentials`] and shared read-only across requests.
//!
//! Lookup is byte-for-byte string equality: no trimming, case folding or
//! prefix parsing. The `<namespace>_<role>_<random>` shape of generated keys
//! is an operator convention only.

use std::collections::{BTreeMap, HashMap};

use crate::domain::audit::token_fingerprint;
use crate::domain::errors::ConfigurationError;
use crate::domain::principal::{Principal, Role};

#[derive(Debug, Clone)]
struct StoredIdentity {
    role: Role,
    fingerprint: String,
}

pub struct CredentialStore {
    entries: HashMap<String, StoredIdentity>,
}

impl CredentialStore {
    /// Build the table from a role → token map. Two roles sharing a token is a
    /// configuration error.
    pub fn load(credentials: &BTreeMap<Role, String>) -> Result<Self, ConfigurationError> {
        let mut entries: HashMap<String, StoredIdentity> = HashMap::new();

        for (role, token) in credentials {
            if token.is_empty() {
                continue;
            }
            if let Some(existing) = entries.get(token) {
                return Err(ConfigurationError::CredentialCollision {
                    first: existing.role.clone(),
                    second: role.clone(),
                });
            }
            entries.insert(
                token.clone(),
                StoredIdentity {
                    role: role.clone(),
                    fingerprint: token_fingerprint(token),
                },
            );
        }

        Ok(Self { entries })
    }

    /// Resolve a raw token. The principal's user id is the role name.
    pub fn lookup(&self, token: &str) -> Option<Principal> {
        self.entries.get(token).map(|identity| {
            Principal::new(identity.role.as_str(), identity.role.clone())
                .with_fingerprint(identity.fingerprint.clone())
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.entries.values().map(|i| i.role.clone()).collect();
        roles.sort();
        roles
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("roles", &self.roles())
            .finish()
    }
}
