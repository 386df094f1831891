// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! MCP Service
//!
//! Transport-neutral MCP request handling. The HTTP middleware and the stdio
//! loop both authenticate calls through the [`SecurityPipeline`] held here,
//! classify the body, authorize it and then hand admitted requests to
//! [`McpService::dispatch`].
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** Method routing for `initialize`, `tools/list` and `tools/call`

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::application::memory_tools::register_memory_tools;
use crate::application::pipeline::{Admission, Authenticated, InboundCall, SecurityPipeline};
use crate::application::tool_registry::{CallContext, ToolRegistry};
use crate::domain::errors::{AuthFailure, ConfigurationError, SecurityError};
use crate::domain::operation::RequestedAction;
use crate::domain::principal::Principal;
use crate::domain::security_config::SecurityConfig;
use crate::infrastructure::audit::AuditLogger;
use crate::infrastructure::episode_store::InMemoryEpisodeStore;
use crate::presentation::jsonrpc::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolFailure, METHOD_INITIALIZE, METHOD_PING,
    METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, NOTIFICATION_PREFIX,
};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "recall";

pub struct McpService {
    pipeline: Arc<SecurityPipeline>,
    registry: Arc<ToolRegistry>,
}

impl McpService {
    pub fn new(pipeline: Arc<SecurityPipeline>, registry: Arc<ToolRegistry>) -> Self {
        Self { pipeline, registry }
    }

    /// Register the memory tools over `store` and build the security pipeline
    /// against them. Fails before anything is served if the configuration or
    /// policy document is invalid.
    pub fn bootstrap(
        config: &SecurityConfig,
        store: Arc<InMemoryEpisodeStore>,
        audit: Arc<AuditLogger>,
    ) -> Result<Self, ConfigurationError> {
        let mut registry = ToolRegistry::new();
        register_memory_tools(&mut registry, store);
        let pipeline = SecurityPipeline::bootstrap(config, &registry, audit)?;
        Ok(Self::new(Arc::new(pipeline), Arc::new(registry)))
    }

    pub fn pipeline(&self) -> &SecurityPipeline {
        &self.pipeline
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Credential phase. Runs before the transport reads the request body.
    ///
    /// An exempt admission carries no principal; on the MCP endpoint that is
    /// a composition error, so it is rejected rather than dispatched.
    pub fn authenticate(&self, call: &InboundCall) -> Result<Authenticated, SecurityError> {
        match self.pipeline.authenticate(call)? {
            Admission::Admitted(authenticated) => Ok(authenticated),
            Admission::Exempt => {
                warn!("MCP request arrived on exempt path {}; refusing to dispatch", call.path);
                Err(SecurityError::Unauthenticated(AuthFailure::MissingHeader))
            }
        }
    }

    /// Request phase over the classified action; returns the admitted principal.
    pub fn authorize(
        &self,
        call: &InboundCall,
        authenticated: Authenticated,
        action: RequestedAction,
    ) -> Result<Principal, SecurityError> {
        self.pipeline
            .authorize(call, authenticated, action)?
            .into_principal()
            .ok_or(SecurityError::Unauthenticated(AuthFailure::MissingHeader))
    }

    /// Route an admitted request. Returns `None` for notifications.
    pub async fn dispatch(&self, principal: &Principal, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.response_id();
        let outcome = match request.method.as_str() {
            METHOD_INITIALIZE => Ok(self.initialize()),
            METHOD_PING => Ok(json!({})),
            METHOD_TOOLS_LIST => Ok(self.list_tools(principal)),
            METHOD_TOOLS_CALL => self.call_tool(principal, request).await,
            method if method.starts_with(NOTIFICATION_PREFIX) => {
                debug!("Notification {} acknowledged", method);
                return None;
            }
            method => Err(JsonRpcError::method_not_found(method)),
        };

        if request.is_notification() {
            return None;
        }
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    /// Full path for transports without their own security layer:
    /// authenticate, classify, authorize, dispatch.
    pub async fn handle(&self, call: InboundCall, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let reject = |error: JsonRpcError| Some(JsonRpcResponse::failure(request.response_id(), error));

        let authenticated = match self.authenticate(&call) {
            Ok(authenticated) => authenticated,
            Err(err) => return reject(JsonRpcError::from(&err)),
        };
        let action = match request.action() {
            Ok(action) => action,
            Err(error) => return reject(error),
        };
        match self.authorize(&call, authenticated, action) {
            Ok(principal) => self.dispatch(&principal, request).await,
            Err(err) => reject(JsonRpcError::from(&err)),
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
        })
    }

    /// Listing symmetry: a principal sees exactly the tools it may invoke.
    fn list_tools(&self, principal: &Principal) -> Value {
        let visible = self.pipeline.visible_operations(principal);
        json!({ "tools": self.registry.descriptors(&visible) })
    }

    async fn call_tool(&self, principal: &Principal, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        let action = request.action()?;
        let Some(name) = action.operation() else {
            return Err(JsonRpcError::method_not_found(&request.method));
        };
        let context = CallContext {
            principal: principal.clone(),
        };

        match self.registry.invoke(name, &context, request.tool_arguments()).await {
            Ok(value) => Ok(json!({
                "content": [{"type": "text", "text": value.to_string()}],
                "structuredContent": value,
                "isError": false,
            })),
            Err(err) => match ToolFailure::from(err) {
                ToolFailure::Protocol(error) => Err(error),
                ToolFailure::Result(message) => Ok(json!({
                    "content": [{"type": "text", "text": message}],
                    "isError": true,
                })),
            },
        }
    }
}
