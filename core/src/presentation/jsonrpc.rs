// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! JSON-RPC 2.0 envelope used by both transports, and its mapping onto the
//! pipeline's [`RequestedAction`] and error types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::tool_registry::ToolError;
use crate::domain::errors::SecurityError;
use crate::domain::operation::RequestedAction;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
/// Server-defined: no valid credential was presented.
pub const UNAUTHENTICATED: i64 = -32001;
/// Server-defined: the principal's role may not invoke the operation.
pub const FORBIDDEN: i64 = -32003;

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_PING: &str = "ping";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";
pub const NOTIFICATION_PREFIX: &str = "notifications/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(PARSE_ERROR, format!("Parse error: {detail}"))
    }

    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self::new(INVALID_REQUEST, format!("Invalid request: {detail}"))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn is_security_error(&self) -> bool {
        self.code == UNAUTHENTICATED || self.code == FORBIDDEN
    }
}

impl From<&SecurityError> for JsonRpcError {
    fn from(err: &SecurityError) -> Self {
        match err {
            SecurityError::Unauthenticated(_) => Self::new(UNAUTHENTICATED, err.client_message()),
            SecurityError::Forbidden { .. } => Self::new(FORBIDDEN, err.client_message()),
        }
    }
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl JsonRpcRequest {
    /// Decode one envelope. Bad JSON is a parse error; valid JSON of the wrong
    /// shape or version is an invalid request.
    pub fn parse(bytes: &[u8]) -> Result<Self, JsonRpcError> {
        let value: Value = serde_json::from_slice(bytes).map_err(JsonRpcError::parse_error)?;
        let request: Self = serde_json::from_value(value).map_err(JsonRpcError::invalid_request)?;
        if request.jsonrpc != JSONRPC_VERSION {
            return Err(JsonRpcError::invalid_request(format!(
                "unsupported jsonrpc version '{}'",
                request.jsonrpc
            )));
        }
        Ok(request)
    }

    /// Requests without an id expect no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }

    /// What the call is attempting, for the security pipeline.
    pub fn action(&self) -> Result<RequestedAction, JsonRpcError> {
        match self.method.as_str() {
            METHOD_TOOLS_LIST => Ok(RequestedAction::ListTools),
            METHOD_TOOLS_CALL => self
                .params
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(|name| RequestedAction::CallTool(name.to_string()))
                .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "tools/call requires a tool name")),
            other => Ok(RequestedAction::Session(other.to_string())),
        }
    }

    pub fn tool_arguments(&self) -> Value {
        self.params.get("arguments").cloned().unwrap_or(Value::Null)
    }
}

/// How a tool failure reaches the client: protocol-level errors become
/// JSON-RPC errors, domain failures become an `isError` tool result.
pub enum ToolFailure {
    Protocol(JsonRpcError),
    Result(String),
}

impl From<ToolError> for ToolFailure {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::UnknownTool(name) => {
                Self::Protocol(JsonRpcError::new(METHOD_NOT_FOUND, format!("Unknown tool: {name}")))
            }
            ToolError::InvalidArguments(_) => Self::Protocol(JsonRpcError::new(INVALID_PARAMS, err.to_string())),
            ToolError::NotFound(_) | ToolError::Backend(_) => Self::Result(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::AuthFailure;
    use crate::domain::principal::Role;
    use serde_json::json;

    #[test]
    fn test_parse_and_classify() {
        let request = JsonRpcRequest::parse(
            br#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"add_memory","arguments":{"name":"x"}}}"#,
        )
        .unwrap();

        assert_eq!(request.action().unwrap(), RequestedAction::CallTool("add_memory".into()));
        assert_eq!(request.tool_arguments()["name"], "x");
        assert!(!request.is_notification());
    }

    #[test]
    fn test_session_and_listing_methods() {
        let init = JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","id":"a","method":"initialize"}"#).unwrap();
        assert_eq!(init.action().unwrap(), RequestedAction::Session("initialize".into()));

        let list = JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).unwrap();
        assert_eq!(list.action().unwrap(), RequestedAction::ListTools);

        let note = JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(note.is_notification());
    }

    #[test]
    fn test_malformed_envelopes() {
        assert_eq!(JsonRpcRequest::parse(b"{not json").unwrap_err().code, PARSE_ERROR);
        assert_eq!(JsonRpcRequest::parse(br#"{"id":1}"#).unwrap_err().code, INVALID_REQUEST);
        assert_eq!(
            JsonRpcRequest::parse(br#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#)
                .unwrap_err()
                .code,
            INVALID_REQUEST
        );

        let nameless = JsonRpcRequest::parse(br#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{}}"#).unwrap();
        assert_eq!(nameless.action().unwrap_err().code, INVALID_PARAMS);
    }

    #[test]
    fn test_security_errors_keep_distinct_codes() {
        let unauthenticated = JsonRpcError::from(&SecurityError::Unauthenticated(AuthFailure::InvalidToken));
        let forbidden = JsonRpcError::from(&SecurityError::Forbidden {
            role: Role::Readonly,
            operation: "clear_graph".into(),
        });

        assert_eq!(unauthenticated.code, UNAUTHENTICATED);
        assert_eq!(unauthenticated.message, "Invalid or missing API key");
        assert_eq!(forbidden.code, FORBIDDEN);
        assert!(forbidden.message.contains("clear_graph"));
        assert!(forbidden.message.contains("readonly"));
    }

    #[test]
    fn test_response_serialization_omits_empty_members() {
        let ok = serde_json::to_value(JsonRpcResponse::success(json!(1), json!({"a": 1}))).unwrap();
        assert!(ok.get("error").is_none());

        let err = serde_json::to_value(JsonRpcResponse::failure(Value::Null, JsonRpcError::method_not_found("x"))).unwrap();
        assert!(err.get("result").is_none());
        assert_eq!(err["error"]["code"], METHOD_NOT_FOUND);
    }
}
