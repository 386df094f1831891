// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP surface: `/health`, `/status` and `POST /mcp` behind the security layer.
//!
//! The security layer authenticates from the `Authorization` header, then
//! buffers the body so the JSON-RPC envelope can be classified and authorized
//! before any handler runs. On admission it stores the [`Principal`] and the
//! parsed request in the request extensions.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::application::pipeline::InboundCall;
use crate::domain::errors::SecurityError;
use crate::domain::principal::Principal;
use crate::presentation::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::presentation::mcp::{McpService, SERVER_NAME};

pub const MCP_PATH: &str = "/mcp";
pub const MAX_BODY_BYTES: usize = 1024 * 1024;
pub const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"recall\"";

#[derive(Clone)]
pub struct AppState {
    pub mcp: Arc<McpService>,
}

pub fn app(mcp: Arc<McpService>) -> Router {
    let state = AppState { mcp };

    let protected = Router::new()
        .route(MCP_PATH, post(handle_mcp))
        .route_layer(middleware::from_fn_with_state(state.clone(), security_layer));

    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": SERVER_NAME}))
}

async fn status() -> Json<Value> {
    Json(json!({"status": "ok", "service": SERVER_NAME}))
}

fn rpc_error(status: StatusCode, id: Value, error: JsonRpcError) -> Response {
    (status, Json(JsonRpcResponse::failure(id, error))).into_response()
}

fn security_rejection(id: Value, err: &SecurityError) -> Response {
    let status = match err {
        SecurityError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        SecurityError::Forbidden { .. } => StatusCode::FORBIDDEN,
    };
    let mut response = rpc_error(status, id, JsonRpcError::from(err));
    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
        );
    }
    response
}

/// Run the security pipeline ahead of the MCP handler.
///
/// Credentials are checked from the header before any of the body is read,
/// so an anonymous caller gets 401 whatever it sent. Only an authenticated
/// request is buffered, classified and authorized.
pub async fn security_layer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if state.mcp.pipeline().is_exempt(&path) {
        return next.run(request).await;
    }

    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
    let call = InboundCall::http(path, authorization);

    let authenticated = match state.mcp.authenticate(&call) {
        Ok(authenticated) => authenticated,
        Err(err) => return security_rejection(Value::Null, &err),
    };

    let (mut parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return rpc_error(
                StatusCode::PAYLOAD_TOO_LARGE,
                Value::Null,
                JsonRpcError::invalid_request(e),
            )
        }
    };

    let rpc = match JsonRpcRequest::parse(&bytes) {
        Ok(rpc) => rpc,
        Err(error) => return rpc_error(StatusCode::BAD_REQUEST, Value::Null, error),
    };
    let action = match rpc.action() {
        Ok(action) => action,
        Err(error) => return rpc_error(StatusCode::BAD_REQUEST, rpc.response_id(), error),
    };
    debug!("Classified {} on {}", action, call.path);

    let principal = match state.mcp.authorize(&call, authenticated, action) {
        Ok(principal) => principal,
        Err(err) => return security_rejection(rpc.response_id(), &err),
    };
    debug!("Admitted {} for {}", rpc.method, principal);

    parts.extensions.insert(principal);
    parts.extensions.insert(rpc);
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

async fn handle_mcp(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(request): Extension<JsonRpcRequest>,
) -> Response {
    match state.mcp.dispatch(&principal, &request).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
