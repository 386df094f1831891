// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Audit Events and Records
//!
//! Pipeline stages describe what happened as an [`AuditEvent`], which may still
//! carry the raw token the caller presented. The audit logger turns each event
//! into an [`AuditLogEntry`] through [`AuditLogEntry::from_event`], the only
//! place a raw token is read; after that point only the redacted prefix and
//! the SHA-256 fingerprint exist.
//!
//! ## Redaction Rule
//!
//! - tokens longer than [`REDACTED_PREFIX_LEN`] chars: first 8 chars + `"..."`
//! - anything shorter or equal: the literal `"invalid"`

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

use super::errors::AuthFailure;
use super::principal::Principal;

pub const REDACTED_PREFIX_LEN: usize = 8;
pub const REDACTION_MARKER: &str = "...";
pub const REDACTION_PLACEHOLDER: &str = "invalid";
const FINGERPRINT_HEX_LEN: usize = 12;

/// Reduce a raw credential to a loggable form.
pub fn redact_token(token: &str) -> String {
    if token.chars().count() > REDACTED_PREFIX_LEN {
        let prefix: String = token.chars().take(REDACTED_PREFIX_LEN).collect();
        format!("{prefix}{REDACTION_MARKER}")
    } else {
        REDACTION_PLACEHOLDER.to_string()
    }
}

/// Stable correlation id for a credential: truncated hex SHA-256.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(FINGERPRINT_HEX_LEN);
    encoded
}

/// Security-relevant occurrence reported by a pipeline stage.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    AuthSuccess {
        principal: Principal,
    },
    AuthFailure {
        cause: AuthFailure,
        /// Raw token as presented; redacted by the logger.
        presented_token: Option<String>,
    },
    AuthzDenied {
        principal: Principal,
        operation: String,
    },
    /// Emitted once at startup when authentication is switched off.
    AuthDisabled {
        dev_principal: Principal,
    },
    PolicyLoaded {
        roles: usize,
        source: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    AuthSuccess,
    AuthFailure,
    AuthzDenied,
    AuthDisabled,
    PolicyLoaded,
}

impl AuditEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthSuccess => "auth_success",
            Self::AuthFailure => "auth_failure",
            Self::AuthzDenied => "authz_denied",
            Self::AuthDisabled => "auth_disabled",
            Self::PolicyLoaded => "policy_loaded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Info,
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Allowed,
    Rejected,
    Notice,
}

impl AuditOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Rejected => "rejected",
            Self::Notice => "notice",
        }
    }
}

/// Who an entry is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditSubject {
    Principal { user_id: String, role: String },
    Failure { reason: String },
    System,
}

/// Append-only audit record. Contains no credential material.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: AuditEventKind,
    pub level: AuditLevel,
    pub subject: AuditSubject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    pub outcome: AuditOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub message: String,
}

fn principal_subject(principal: &Principal) -> AuditSubject {
    AuditSubject::Principal {
        user_id: principal.user_id().to_string(),
        role: principal.role().to_string(),
    }
}

impl AuditLogEntry {
    /// Build the redacted record for an event.
    pub fn from_event(event: AuditEvent) -> Self {
        let timestamp = Utc::now();
        match event {
            AuditEvent::AuthSuccess { principal } => Self {
                timestamp,
                kind: AuditEventKind::AuthSuccess,
                level: AuditLevel::Info,
                message: format!(
                    "Authentication successful: user_id={}, role={}",
                    principal.user_id(),
                    principal.role()
                ),
                subject: principal_subject(&principal),
                operation: None,
                outcome: AuditOutcome::Allowed,
                correlation_id: principal.fingerprint().map(str::to_string),
            },
            AuditEvent::AuthFailure {
                cause,
                presented_token,
            } => {
                let message = match (&cause, presented_token.as_deref()) {
                    (AuthFailure::MissingHeader, _) => {
                        "Authentication failed: Missing Authorization header".to_string()
                    }
                    (AuthFailure::MalformedHeader, _) => {
                        "Authentication failed: Invalid header format".to_string()
                    }
                    (AuthFailure::InvalidToken, token) => format!(
                        "Authentication failed: Invalid token={}",
                        redact_token(token.unwrap_or_default())
                    ),
                    (AuthFailure::NoTransportCredentials, _) => {
                        "Authentication failed: No HTTP context available (stdio transport)"
                            .to_string()
                    }
                };
                Self {
                    timestamp,
                    kind: AuditEventKind::AuthFailure,
                    level: AuditLevel::Warn,
                    subject: AuditSubject::Failure {
                        reason: cause.to_string(),
                    },
                    operation: None,
                    outcome: AuditOutcome::Rejected,
                    correlation_id: presented_token
                        .as_deref()
                        .filter(|token| !token.is_empty())
                        .map(token_fingerprint),
                    message,
                }
            }
            AuditEvent::AuthzDenied {
                principal,
                operation,
            } => Self {
                timestamp,
                kind: AuditEventKind::AuthzDenied,
                level: AuditLevel::Warn,
                message: format!(
                    "Access denied: role={}, tool={}, user={}",
                    principal.role(),
                    operation,
                    principal.user_id()
                ),
                subject: principal_subject(&principal),
                operation: Some(operation),
                outcome: AuditOutcome::Rejected,
                correlation_id: principal.fingerprint().map(str::to_string),
            },
            AuditEvent::AuthDisabled { dev_principal } => Self {
                timestamp,
                kind: AuditEventKind::AuthDisabled,
                level: AuditLevel::Warn,
                message: format!(
                    "Authentication is DISABLED: every request runs as user_id={}, role={} \
                     (authorization still enforced). Do not use this outside local development",
                    dev_principal.user_id(),
                    dev_principal.role()
                ),
                subject: principal_subject(&dev_principal),
                operation: None,
                outcome: AuditOutcome::Notice,
                correlation_id: None,
            },
            AuditEvent::PolicyLoaded { roles, source } => Self {
                timestamp,
                kind: AuditEventKind::PolicyLoaded,
                level: AuditLevel::Info,
                message: format!("Loaded {roles} authorization policies from {source}"),
                subject: AuditSubject::System,
                operation: None,
                outcome: AuditOutcome::Notice,
                correlation_id: None,
            },
        }
    }
}

impl fmt::Display for AuditLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.to_rfc3339(),
            self.kind.as_str(),
            self.message
        )?;
        if let Some(id) = &self.correlation_id {
            write!(f, " correlation_id={id}")?;
        }
        Ok(())
    }
}
