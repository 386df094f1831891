// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Principal and Role Value Objects
//!
//! A [`Principal`] is the identity resolved from a bearer credential for the
//! duration of exactly one request. It is created by the authentication stage,
//! read by the authorization stage and by tool handlers, and dropped with the
//! request. Nothing in the process caches or shares it across requests.
//!
//! [`Role`] is the security classification a policy entry is keyed on. The
//! three well-known roles have dedicated variants; any other role name coming
//! from configuration is carried verbatim in [`Role::Custom`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Security classification attached to a credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Role {
    /// Unrestricted access.
    Admin,
    /// Read-only tools.
    Readonly,
    /// Read-only tools plus a limited set of writes.
    Analyst,
    /// Any other configured role name (lowercase).
    Custom(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Readonly => "readonly",
            Self::Analyst => "analyst",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "admin" => Self::Admin,
            "readonly" => Self::Readonly,
            "analyst" => Self::Analyst,
            _ => Self::Custom(normalized),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated identity attached to a single request.
///
/// Fields are private so a principal cannot be altered after the
/// authentication stage builds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: String,
    role: Role,
    fingerprint: Option<String>,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            fingerprint: None,
        }
    }

    /// Attach the correlation fingerprint of the credential that produced this principal.
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Stable, non-reversible identifier for correlating requests from this principal.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user_id={}, role={}", self.user_id, self.role)
    }
}
