// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Authorization Stage
//!
//! Request stage: runs after authentication, once the body has been
//! classified into a [`RequestedAction`](crate::domain::operation::RequestedAction).
//! For tool invocations it asks the
//! [`PolicyEngine`] whether the attached principal's role may invoke the
//! operation; a denial is audited at `WARN` and stops the call before any
//! handler runs. Session messages and listings carry no operation and pass
//! through (listings are filtered later through the same engine).

use std::sync::Arc;

use tracing::{debug, error};

use crate::application::pipeline::{InboundCall, PipelineStage, RequestState};
use crate::domain::audit::AuditEvent;
use crate::domain::errors::{AuthFailure, SecurityError};
use crate::infrastructure::audit::AuditLogger;
use crate::infrastructure::policy_engine::PolicyEngine;

const UNCLASSIFIED: &str = "<unclassified>";

pub struct AuthorizationStage {
    policy: Arc<PolicyEngine>,
    audit: Arc<AuditLogger>,
}

impl AuthorizationStage {
    pub fn new(policy: Arc<PolicyEngine>, audit: Arc<AuditLogger>) -> Self {
        Self { policy, audit }
    }
}

impl PipelineStage for AuthorizationStage {
    fn name(&self) -> &'static str {
        "authorization"
    }

    fn process(&self, _call: &InboundCall, state: &mut RequestState) -> Result<(), SecurityError> {
        // Only reachable through an authenticated request state; anything else
        // means the stages were composed wrongly. Fail closed.
        let Some(principal) = state.principal() else {
            error!("Authorization reached without a principal");
            return Err(SecurityError::Unauthenticated(AuthFailure::MissingHeader));
        };
        let Some(action) = state.action() else {
            error!("Authorization reached before the request was classified");
            return Err(SecurityError::Forbidden {
                role: principal.role().clone(),
                operation: UNCLASSIFIED.to_string(),
            });
        };
        let Some(operation) = action.operation() else {
            return Ok(());
        };

        if self.policy.query(principal.role(), operation).is_allowed() {
            debug!("Access granted: role={}, tool={}", principal.role(), operation);
            return Ok(());
        }

        self.audit.record(AuditEvent::AuthzDenied {
            principal: principal.clone(),
            operation: operation.to_string(),
        });
        Err(SecurityError::Forbidden {
            role: principal.role().clone(),
            operation: operation.to_string(),
        })
    }
}
