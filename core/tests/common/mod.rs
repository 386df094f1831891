// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures for the integration tests: a server composed exactly as
//! `recall serve` composes it, with an in-memory audit sink attached.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use recall_core::domain::errors::ConfigurationError;
use recall_core::domain::security_config::SecurityConfig;
use recall_core::infrastructure::audit::{AuditLogger, MemoryAuditSink};
use recall_core::infrastructure::episode_store::InMemoryEpisodeStore;
use recall_core::presentation::api;
use recall_core::presentation::mcp::McpService;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "sk_admin_ZZZZ9999";
pub const READONLY_TOKEN: &str = "sk_readonly_AAAA1111";
pub const ANALYST_TOKEN: &str = "sk_analyst_BBBB2222";

pub const DEFAULT_POLICY: &str = include_str!("../../../config/policies.json");

pub struct Harness {
    pub mcp: Arc<McpService>,
    pub store: Arc<InMemoryEpisodeStore>,
    pub audit: Arc<MemoryAuditSink>,
    _policy_dir: TempDir,
}

pub fn write_policy(dir: &TempDir, file_name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(file_name);
    std::fs::write(&path, content).expect("write policy file");
    path
}

/// Compose a server from env-style variables and a policy document.
pub fn try_harness(vars: &[(&str, &str)], policy: &str) -> Result<Harness, ConfigurationError> {
    let dir = TempDir::new().expect("tempdir");
    let policy_path = write_policy(&dir, "policies.json", policy);

    let mut all_vars: Vec<(String, String)> = vec![(
        "RECALL_POLICY_FILE".to_string(),
        policy_path.display().to_string(),
    )];
    all_vars.extend(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    let config = SecurityConfig::from_vars(all_vars)?;

    let sink = Arc::new(MemoryAuditSink::new());
    let audit = Arc::new(AuditLogger::new().with_sink(sink.clone()));
    let store = Arc::new(InMemoryEpisodeStore::new());
    let mcp = McpService::bootstrap(&config, store.clone(), audit)?;

    Ok(Harness {
        mcp: Arc::new(mcp),
        store,
        audit: sink,
        _policy_dir: dir,
    })
}

/// Authentication on, one credential per conventional role, default policy.
pub fn secured() -> Harness {
    try_harness(
        &[
            ("RECALL_API_KEY_ADMIN", ADMIN_TOKEN),
            ("RECALL_API_KEY_READONLY", READONLY_TOKEN),
            ("RECALL_API_KEY_ANALYST", ANALYST_TOKEN),
        ],
        DEFAULT_POLICY,
    )
    .expect("secured harness")
}

impl Harness {
    pub fn router(&self) -> Router {
        api::app(self.mcp.clone())
    }
}

pub fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
}

pub fn tools_list(id: i64) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": "tools/list"})
}

pub struct HttpReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(router: Router, request: Request<Body>) -> HttpReply {
    let response = router.oneshot(request).await.expect("router response");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    HttpReply { status, headers, body }
}

pub async fn post_mcp(router: Router, authorization: Option<&str>, body: &Value) -> HttpReply {
    post_raw(router, authorization, body.to_string()).await
}

pub async fn post_raw(router: Router, authorization: Option<&str>, body: String) -> HttpReply {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    send(router, builder.body(Body::from(body)).expect("request")).await
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn tool_names(list_body: &Value) -> Vec<String> {
    list_body["result"]["tools"]
        .as_array()
        .expect("tools array")
        .iter()
        .map(|t| t["name"].as_str().expect("tool name").to_string())
        .collect()
}
