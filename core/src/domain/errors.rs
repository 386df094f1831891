// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Security Error Taxonomy
//!
//! | Error | When | Lifetime |
//! |-------|------|----------|
//! | [`SecurityError::Unauthenticated`] | missing/malformed header, unknown token | one request |
//! | [`SecurityError::Forbidden`] | known principal, operation not granted | one request |
//! | [`ConfigurationError`] | bad policy document or credential table | aborts startup |
//!
//! Unauthenticated and Forbidden are routine outcomes and stay separate all
//! the way to the client. Every [`AuthFailure`] cause collapses into the same
//! client-visible message but keeps its own variant for the audit log.

use std::path::PathBuf;
use thiserror::Error;

use super::principal::Role;

/// Internal reason an authentication attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("malformed Authorization header")]
    MalformedHeader,

    #[error("invalid token")]
    InvalidToken,

    #[error("no credentials available over this transport")]
    NoTransportCredentials,
}

/// Per-request rejection produced by the security pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(AuthFailure),

    #[error("Access denied: tool \"{operation}\" not allowed for role \"{role}\"")]
    Forbidden { role: Role, operation: String },
}

impl SecurityError {
    /// Message safe to return to the caller. Authentication causes are not distinguished.
    pub fn client_message(&self) -> String {
        match self {
            Self::Unauthenticated(_) => "Invalid or missing API key".to_string(),
            Self::Forbidden { .. } => self.to_string(),
        }
    }
}

/// Fatal startup error. The server must not accept traffic after one of these.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to read policy file {path:?}: {source}")]
    PolicyFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed policy document: {0}")]
    MalformedPolicy(String),

    #[error("Unsupported policy document version '{0}' (expected '1.0')")]
    UnsupportedVersion(String),

    #[error("Policy entry has an empty role name")]
    EmptyRole,

    #[error("Role '{0}' appears more than once in the policy document")]
    DuplicateRole(Role),

    #[error("Role '{0}' mixes the '*' wildcard with explicit operation names")]
    WildcardMixed(Role),

    #[error("Policy for role '{role}' references unknown operation '{operation}'")]
    UnknownOperation { role: Role, operation: String },

    #[error("Roles '{first}' and '{second}' are configured with the same credential")]
    CredentialCollision { first: Role, second: Role },

    #[error("Role '{role}' is configured by both {first} and {second} with different credentials")]
    DuplicateCredentialRole { role: Role, first: String, second: String },

    #[error("Invalid value for {variable}: '{value}'. Expected true/false")]
    InvalidFlag { variable: String, value: String },
}
