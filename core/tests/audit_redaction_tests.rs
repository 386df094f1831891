// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Captures everything written through `tracing` while the pipeline, and the
//! full HTTP router around it, handle accepted, unauthenticated and forbidden
//! calls, and checks that no configured credential ever reaches the log output.

mod common;

use std::io::Write;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use common::*;
use parking_lot::Mutex;
use recall_core::application::memory_tools::register_memory_tools;
use recall_core::application::pipeline::{InboundCall, SecurityPipeline};
use recall_core::application::tool_registry::ToolRegistry;
use recall_core::domain::operation::RequestedAction;
use recall_core::domain::security_config::SecurityConfig;
use recall_core::infrastructure::audit::AuditLogger;
use recall_core::infrastructure::episode_store::InMemoryEpisodeStore;
use serde_json::json;
use tempfile::TempDir;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let writer = self.clone();
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish()
    }
}

fn assert_no_credential(output: &str, credentials: &[&str]) {
    for credential in credentials {
        assert!(
            !output.contains(credential),
            "credential {credential} leaked into logs:\n{output}"
        );
    }
}

fn secured_pipeline(dir: &TempDir) -> SecurityPipeline {
    let policy_path = write_policy(dir, "policies.json", DEFAULT_POLICY);
    let config = SecurityConfig::from_vars([
        ("RECALL_POLICY_FILE", policy_path.display().to_string()),
        ("RECALL_API_KEY_ADMIN", ADMIN_TOKEN.to_string()),
        ("RECALL_API_KEY_READONLY", READONLY_TOKEN.to_string()),
        ("RECALL_API_KEY_ANALYST", ANALYST_TOKEN.to_string()),
    ])
    .unwrap();
    let mut registry = ToolRegistry::new();
    register_memory_tools(&mut registry, Arc::new(InMemoryEpisodeStore::new()));
    SecurityPipeline::bootstrap(&config, &registry, Arc::new(AuditLogger::new())).unwrap()
}

#[test]
fn test_no_log_line_contains_a_full_credential() {
    let capture = Capture::default();
    let dir = TempDir::new().unwrap();
    let near_miss = format!("{READONLY_TOKEN}X");

    tracing::subscriber::with_default(capture.subscriber(), || {
        let pipeline = secured_pipeline(&dir);
        let calls = [
            (Some(bearer(ADMIN_TOKEN)), RequestedAction::CallTool("clear_graph".into())),
            (Some(bearer(READONLY_TOKEN)), RequestedAction::CallTool("get_status".into())),
            (Some(bearer(READONLY_TOKEN)), RequestedAction::CallTool("add_memory".into())),
            (Some(bearer(ANALYST_TOKEN)), RequestedAction::CallTool("clear_graph".into())),
            (Some(bearer(&near_miss)), RequestedAction::ListTools),
            (Some(format!("Token {ADMIN_TOKEN}")), RequestedAction::ListTools),
            (None, RequestedAction::ListTools),
        ];
        for (authorization, action) in calls {
            let _ = pipeline.admit(&InboundCall::http("/mcp", authorization), action);
        }
    });

    let output = capture.text();
    assert!(output.contains("recall::audit"));
    assert!(output.contains("Access denied: role=readonly, tool=add_memory"));
    assert!(output.contains("Invalid token=sk_reado..."));
    assert_no_credential(&output, &[ADMIN_TOKEN, READONLY_TOKEN, ANALYST_TOKEN, near_miss.as_str()]);
}

#[tokio::test]
async fn test_served_http_path_never_logs_a_full_credential() {
    let capture = Capture::default();
    let near_miss = format!("{ANALYST_TOKEN}X");
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    let harness = secured();
    let add = tool_call(1, "add_memory", json!({"name": "n", "episode_body": "b"}));
    let requests = [
        (Some(bearer(ANALYST_TOKEN)), add.to_string()),
        (Some(bearer(ADMIN_TOKEN)), tool_call(2, "search_nodes", json!({"query": "n"})).to_string()),
        (Some(bearer(ADMIN_TOKEN)), tools_list(3).to_string()),
        (Some(bearer(READONLY_TOKEN)), add.to_string()),
        (Some(bearer(READONLY_TOKEN)), tool_call(4, "get_status", json!({})).to_string()),
        (Some(bearer(&near_miss)), tools_list(5).to_string()),
        (Some(format!("Basic {ADMIN_TOKEN}")), tools_list(6).to_string()),
        (Some(bearer(ADMIN_TOKEN)), "{oops".to_string()),
        (None, add.to_string()),
    ];
    for (authorization, body) in requests {
        post_raw(harness.router(), authorization.as_deref(), body).await;
    }
    for path in ["/health", "/status"] {
        let request = Request::builder()
            .uri(path)
            .header(header::AUTHORIZATION, bearer(ADMIN_TOKEN))
            .body(Body::empty())
            .unwrap();
        send(harness.router(), request).await;
    }

    let output = capture.text();
    assert!(output.contains("recall::audit"));
    assert!(output.contains("Admitted tools/call for"));
    assert!(output.contains("Access denied: role=readonly, tool=add_memory"));
    assert!(output.contains("Invalid token=sk_analy..."));
    assert_eq!(harness.store.len().await, 1);
    assert_no_credential(&output, &[ADMIN_TOKEN, READONLY_TOKEN, ANALYST_TOKEN, near_miss.as_str()]);
}

#[test]
fn test_short_unknown_token_is_replaced_entirely() {
    let capture = Capture::default();
    let dir = TempDir::new().unwrap();

    tracing::subscriber::with_default(capture.subscriber(), || {
        let pipeline = secured_pipeline(&dir);
        let _ = pipeline.admit(
            &InboundCall::http("/mcp", Some("Bearer abc123".to_string())),
            RequestedAction::ListTools,
        );
    });

    let output = capture.text();
    assert!(output.contains("Invalid token=invalid"));
    assert!(!output.contains("abc123"));
}
