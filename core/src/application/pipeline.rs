// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Security Pipeline
//!
//! Statically ordered chain of stages every inbound call passes through before
//! an operation handler runs:
//!
//! ```text
//! InboundCall (transport, path, Authorization header)
//!   └─ exempt path?  ── yes ─▶ Admission::Exempt (no principal, no audit)
//!   └─ credential stages     ── reject ─▶ SecurityError::Unauthenticated
//!        (AuthenticationStage; nothing of the body has been read yet)
//!   └─ Authenticated ─▶ caller reads and classifies the body
//!   └─ request stages        ── reject ─▶ SecurityError::Forbidden
//!        (AuthorizationStage; sees the classified RequestedAction)
//!   └─ Admission::Admitted(RequestState)  ─▶ dispatch
//! ```
//!
//! The split lets a transport reject an anonymous caller from the headers
//! alone. Request stages can only be reached through an [`Authenticated`]
//! value, which only [`SecurityPipeline::authenticate`] produces.
//!
//! The pipeline is built once by [`SecurityPipeline::bootstrap`] from the
//! startup configuration. Its tables are immutable afterwards and shared
//! without locks; every call gets a fresh [`RequestState`].

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use crate::application::authentication::AuthenticationStage;
use crate::application::authorization::AuthorizationStage;
use crate::domain::audit::AuditEvent;
use crate::domain::errors::{ConfigurationError, SecurityError};
use crate::domain::operation::{OperationCatalog, RequestedAction};
use crate::domain::principal::Principal;
use crate::domain::security_config::{SecurityConfig, DEV_USER_ID};
use crate::infrastructure::audit::AuditLogger;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::policy_engine::PolicyEngine;

/// How the call reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Stdio,
}

/// Transport-neutral view of what is known about a call before its body is read.
#[derive(Debug, Clone)]
pub struct InboundCall {
    pub transport: Transport,
    pub path: String,
    /// Raw value of the `Authorization` header, if present.
    pub authorization: Option<String>,
}

impl InboundCall {
    pub fn http(path: impl Into<String>, authorization: Option<String>) -> Self {
        Self {
            transport: Transport::Http,
            path: path.into(),
            authorization,
        }
    }

    pub fn stdio() -> Self {
        Self {
            transport: Transport::Stdio,
            path: String::new(),
            authorization: None,
        }
    }
}

/// Request-scoped state written by stages and read by later stages and handlers.
#[derive(Debug, Default)]
pub struct RequestState {
    principal: Option<Principal>,
    action: Option<RequestedAction>,
}

impl RequestState {
    /// Attach the request's principal. The first attachment wins; a request
    /// never carries more than one principal.
    pub fn attach_principal(&mut self, principal: Principal) {
        if self.principal.is_none() {
            self.principal = Some(principal);
        } else {
            tracing::error!("Refusing to replace the principal already attached to this request");
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn into_principal(self) -> Option<Principal> {
        self.principal
    }

    /// Record what the body asks for. Set by the pipeline between the
    /// credential and request stages.
    pub fn record_action(&mut self, action: RequestedAction) {
        self.action = Some(action);
    }

    pub fn action(&self) -> Option<&RequestedAction> {
        self.action.as_ref()
    }
}

/// One step of the security pipeline.
pub trait PipelineStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn process(&self, call: &InboundCall, state: &mut RequestState) -> Result<(), SecurityError>;
}

#[derive(Debug)]
pub enum Admission<T = RequestState> {
    /// Path bypasses the pipeline entirely.
    Exempt,
    /// Every stage of the phase passed.
    Admitted(T),
}

/// Outcome of the credential stages. Required to run the request stages.
#[derive(Debug)]
pub struct Authenticated {
    state: RequestState,
}

impl Authenticated {
    pub fn principal(&self) -> Option<&Principal> {
        self.state.principal()
    }
}

pub struct SecurityPipeline {
    exempt_paths: BTreeSet<String>,
    credential_stages: Vec<Box<dyn PipelineStage>>,
    request_stages: Vec<Box<dyn PipelineStage>>,
    policy: Arc<PolicyEngine>,
}

impl SecurityPipeline {
    pub fn new(
        exempt_paths: BTreeSet<String>,
        credential_stages: Vec<Box<dyn PipelineStage>>,
        request_stages: Vec<Box<dyn PipelineStage>>,
        policy: Arc<PolicyEngine>,
    ) -> Self {
        Self {
            exempt_paths,
            credential_stages,
            request_stages,
            policy,
        }
    }

    /// Build the credential and policy tables and compose the stages.
    ///
    /// Any [`ConfigurationError`] must abort startup. When authentication is
    /// disabled the one-time warning is written here, before the caller can
    /// start serving.
    pub fn bootstrap(
        config: &SecurityConfig,
        catalog: &dyn OperationCatalog,
        audit: Arc<AuditLogger>,
    ) -> Result<Self, ConfigurationError> {
        let credentials = CredentialStore::load(&config.credentials)?;
        let policy = Arc::new(PolicyEngine::from_file(&config.policy_path, catalog)?);
        audit.record(AuditEvent::PolicyLoaded {
            roles: policy.len(),
            source: config.policy_path.display().to_string(),
        });

        let authentication = if config.auth_enabled {
            info!(
                "Bearer authentication enabled for {} configured role(s)",
                credentials.len()
            );
            AuthenticationStage::enforced(Arc::new(credentials), audit.clone())
        } else {
            let dev_principal = Principal::new(DEV_USER_ID, config.dev_role.clone());
            audit.record(AuditEvent::AuthDisabled {
                dev_principal: dev_principal.clone(),
            });
            AuthenticationStage::disabled(dev_principal)
        };
        let authorization = AuthorizationStage::new(policy.clone(), audit);

        Ok(Self::new(
            config.exempt_paths.clone(),
            vec![Box::new(authentication)],
            vec![Box::new(authorization)],
            policy,
        ))
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.contains(path)
    }

    /// Run the credential stages. Needs nothing but what arrived ahead of the body.
    pub fn authenticate(&self, call: &InboundCall) -> Result<Admission<Authenticated>, SecurityError> {
        if call.transport == Transport::Http && self.is_exempt(&call.path) {
            return Ok(Admission::Exempt);
        }

        let mut state = RequestState::default();
        for stage in &self.credential_stages {
            stage.process(call, &mut state)?;
        }
        Ok(Admission::Admitted(Authenticated { state }))
    }

    /// Run the request stages against the classified action.
    pub fn authorize(
        &self,
        call: &InboundCall,
        authenticated: Authenticated,
        action: RequestedAction,
    ) -> Result<RequestState, SecurityError> {
        let mut state = authenticated.state;
        state.record_action(action);
        for stage in &self.request_stages {
            stage.process(call, &mut state)?;
        }
        Ok(state)
    }

    /// Both phases back to back, stopping at the first rejection.
    pub fn admit(&self, call: &InboundCall, action: RequestedAction) -> Result<Admission, SecurityError> {
        match self.authenticate(call)? {
            Admission::Exempt => Ok(Admission::Exempt),
            Admission::Admitted(authenticated) => self
                .authorize(call, authenticated, action)
                .map(Admission::Admitted),
        }
    }

    /// Operations the principal may see in a listing; identical to what it may invoke.
    pub fn visible_operations(&self, principal: &Principal) -> BTreeSet<String> {
        self.policy.visible_operations(principal.role())
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.credential_stages
            .iter()
            .chain(&self.request_stages)
            .map(|s| s.name())
            .collect()
    }
}
