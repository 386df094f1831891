// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Newline-delimited JSON-RPC over any async reader/writer pair.
//!
//! There are no headers on this transport. With authentication enforced,
//! every call is rejected as unauthenticated. A line is parsed only far
//! enough to echo its id before the credential phase runs.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::application::pipeline::InboundCall;
use crate::presentation::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::presentation::mcp::McpService;

pub async fn serve_lines<R, W>(mcp: Arc<McpService>, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match JsonRpcRequest::parse(line.as_bytes()) {
            Err(error) => Some(JsonRpcResponse::failure(Value::Null, error)),
            Ok(request) => mcp.handle(InboundCall::stdio(), &request).await,
        };

        if let Some(response) = response {
            let mut encoded = serde_json::to_vec(&response).context("Failed to encode response")?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await.context("Failed to write to stdout")?;
            writer.flush().await.context("Failed to flush stdout")?;
        }
    }
    debug!("stdin closed");
    Ok(())
}

/// Serve the process's own stdin/stdout until stdin closes.
pub async fn serve_stdio(mcp: Arc<McpService>) -> Result<()> {
    info!("Serving MCP over stdio");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    serve_lines(mcp, stdin, tokio::io::stdout()).await
}
