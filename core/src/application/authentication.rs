// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Authentication Stage
//!
//! Credential stage of every non-exempt call. Works from the headers alone,
//! so a caller is rejected before its body is read. Extracts the bearer token from the
//! `Authorization` header, resolves it through the [`CredentialStore`] and
//! attaches the resulting [`Principal`] to the [`RequestState`].
//!
//! ## Header contract
//!
//! Exactly `Bearer <token>`: case-sensitive scheme, one space, non-empty token.
//! Absent header, other schemes and empty tokens all surface to the client as
//! the same Unauthenticated error; the audit log keeps them apart.
//!
//! ## Disabled mode
//!
//! With `RECALL_AUTH_ENABLED=false` the stage attaches a fixed development
//! principal instead of reading headers. Authorization still runs against it.

use std::sync::Arc;

use crate::application::pipeline::{InboundCall, PipelineStage, RequestState, Transport};
use crate::domain::audit::AuditEvent;
use crate::domain::errors::{AuthFailure, SecurityError};
use crate::domain::principal::Principal;
use crate::infrastructure::audit::AuditLogger;
use crate::infrastructure::credential_store::CredentialStore;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of an `Authorization` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthFailure> {
    match header {
        None | Some("") => Err(AuthFailure::MissingHeader),
        Some(value) => match value.strip_prefix(BEARER_PREFIX) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AuthFailure::MalformedHeader),
        },
    }
}

enum Mode {
    Enforced {
        credentials: Arc<CredentialStore>,
        audit: Arc<AuditLogger>,
    },
    Disabled {
        dev_principal: Principal,
    },
}

pub struct AuthenticationStage {
    mode: Mode,
}

impl AuthenticationStage {
    pub fn enforced(credentials: Arc<CredentialStore>, audit: Arc<AuditLogger>) -> Self {
        Self {
            mode: Mode::Enforced { credentials, audit },
        }
    }

    /// Stage that skips credential checks. The caller is responsible for the
    /// one-time startup warning.
    pub fn disabled(dev_principal: Principal) -> Self {
        Self {
            mode: Mode::Disabled { dev_principal },
        }
    }

    pub fn is_enforced(&self) -> bool {
        matches!(self.mode, Mode::Enforced { .. })
    }

    fn authenticate(
        credentials: &CredentialStore,
        audit: &AuditLogger,
        call: &InboundCall,
    ) -> Result<Principal, SecurityError> {
        let reject = |cause: AuthFailure, presented_token: Option<&str>| {
            audit.record(AuditEvent::AuthFailure {
                cause: cause.clone(),
                presented_token: presented_token.map(str::to_string),
            });
            SecurityError::Unauthenticated(cause)
        };

        if call.transport == Transport::Stdio && call.authorization.is_none() {
            return Err(reject(AuthFailure::NoTransportCredentials, None));
        }

        let token = extract_bearer(call.authorization.as_deref()).map_err(|cause| reject(cause, None))?;

        let principal = credentials
            .lookup(token)
            .ok_or_else(|| reject(AuthFailure::InvalidToken, Some(token)))?;

        audit.record(AuditEvent::AuthSuccess {
            principal: principal.clone(),
        });
        Ok(principal)
    }
}

impl PipelineStage for AuthenticationStage {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn process(&self, call: &InboundCall, state: &mut RequestState) -> Result<(), SecurityError> {
        let principal = match &self.mode {
            Mode::Enforced { credentials, audit } => Self::authenticate(credentials, audit, call)?,
            Mode::Disabled { dev_principal } => dev_principal.clone(),
        };
        state.attach_principal(principal);
        Ok(())
    }
}
