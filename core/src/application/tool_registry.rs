// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Tool Registry
//!
//! Name-keyed table of invokable operations. The registry is also the
//! [`OperationCatalog`] the policy engine validates against, so a policy can
//! only ever name operations that actually exist.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Tool discovery and dispatch behind the security pipeline

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::operation::OperationCatalog;
use crate::domain::principal::Principal;

/// Tool metadata for discovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Admitted caller of a tool. Only exists once the pipeline has passed.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub principal: Principal,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Tool backend failed: {0}")]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    async fn call(&self, context: &CallContext, arguments: Value) -> Result<Value, ToolError>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its descriptor name. A later registration
    /// with the same name replaces the earlier one.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.descriptor().name;
        if self.tools.insert(name.clone(), handler).is_some() {
            tracing::warn!("Tool {} registered twice; keeping the latest handler", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).cloned()
    }

    /// Descriptors of the named tools, in name order. Names the registry does
    /// not know are skipped.
    pub fn descriptors(&self, visible: &BTreeSet<String>) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .filter(|(name, _)| visible.contains(*name))
            .map(|(_, handler)| handler.descriptor())
            .collect()
    }

    pub async fn invoke(
        &self,
        name: &str,
        context: &CallContext,
        arguments: Value,
    ) -> Result<Value, ToolError> {
        let handler = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        handler.call(context, arguments).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl OperationCatalog for ToolRegistry {
    fn operation_names(&self) -> BTreeSet<String> {
        self.tools.keys().cloned().collect()
    }

    fn exposes(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::principal::Role;
    use serde_json::json;

    struct Echo(&'static str);

    #[async_trait]
    impl ToolHandler for Echo {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor {
                name: self.0.to_string(),
                description: "echo".to_string(),
                input_schema: json!({"type": "object"}),
            }
        }

        async fn call(&self, context: &CallContext, arguments: Value) -> Result<Value, ToolError> {
            Ok(json!({"caller": context.principal.user_id(), "args": arguments}))
        }
    }

    fn context() -> CallContext {
        CallContext {
            principal: Principal::new("tester", Role::Admin),
        }
    }

    #[tokio::test]
    async fn test_invoke_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("echo")));

        let out = registry.invoke("echo", &context(), json!({"x": 1})).await.unwrap();

        assert_eq!(out["caller"], "tester");
        assert_eq!(out["args"]["x"], 1);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.invoke("nope", &context(), Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "nope"));
    }

    #[test]
    fn test_catalog_and_filtered_descriptors() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("b")));
        registry.register(Arc::new(Echo("a")));

        assert!(registry.exposes("a"));
        assert!(!registry.exposes("c"));
        assert_eq!(registry.operation_names().len(), 2);

        let visible: BTreeSet<String> = ["b".to_string(), "c".to_string()].into_iter().collect();
        let descriptors = registry.descriptors(&visible);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "b");

        let serialized = serde_json::to_value(&descriptors[0]).unwrap();
        assert!(serialized.get("inputSchema").is_some());
    }
}
