// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Memory Tools
//!
//! The nine memory operations exposed to MCP clients, backed by the
//! [`InMemoryEpisodeStore`]. Episodes are the only stored entity; entity
//! edges are never materialised, so edge lookups report not-found.
//!
//! Every handler runs only after the security pipeline has admitted the call.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::tool_registry::{CallContext, ToolDescriptor, ToolError, ToolHandler, ToolRegistry};
use crate::infrastructure::episode_store::{Episode, InMemoryEpisodeStore};

/// Group used when a call names none.
pub const DEFAULT_GROUP_ID: &str = "main";
const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryToolKind {
    AddMemory,
    SearchNodes,
    SearchMemoryFacts,
    DeleteEntityEdge,
    DeleteEpisode,
    GetEntityEdge,
    GetEpisodes,
    ClearGraph,
    GetStatus,
}

impl MemoryToolKind {
    pub const ALL: [MemoryToolKind; 9] = [
        Self::AddMemory,
        Self::SearchNodes,
        Self::SearchMemoryFacts,
        Self::DeleteEntityEdge,
        Self::DeleteEpisode,
        Self::GetEntityEdge,
        Self::GetEpisodes,
        Self::ClearGraph,
        Self::GetStatus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AddMemory => "add_memory",
            Self::SearchNodes => "search_nodes",
            Self::SearchMemoryFacts => "search_memory_facts",
            Self::DeleteEntityEdge => "delete_entity_edge",
            Self::DeleteEpisode => "delete_episode",
            Self::GetEntityEdge => "get_entity_edge",
            Self::GetEpisodes => "get_episodes",
            Self::ClearGraph => "clear_graph",
            Self::GetStatus => "get_status",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::AddMemory => "Add an episode to memory.",
            Self::SearchNodes => "Search for nodes in the graph memory.",
            Self::SearchMemoryFacts => "Search the graph memory for relevant facts.",
            Self::DeleteEntityEdge => "Delete an entity edge from the graph memory.",
            Self::DeleteEpisode => "Delete an episode from the graph memory.",
            Self::GetEntityEdge => "Get an entity edge from the graph memory by its UUID.",
            Self::GetEpisodes => "Get episodes from the graph memory.",
            Self::ClearGraph => "Clear all data from the graph for specified group IDs.",
            Self::GetStatus => "Get the status of the memory server.",
        }
    }

    fn input_schema(self) -> Value {
        let group_ids = json!({"type": "array", "items": {"type": "string"}});
        match self {
            Self::AddMemory => json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "episode_body": {"type": "string"},
                    "group_id": {"type": "string"},
                    "source": {"type": "string", "default": "text"},
                    "source_description": {"type": "string", "default": ""},
                    "uuid": {"type": "string"}
                },
                "required": ["name", "episode_body"]
            }),
            Self::SearchNodes => json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "group_ids": group_ids,
                    "max_nodes": {"type": "integer", "default": DEFAULT_LIMIT}
                },
                "required": ["query"]
            }),
            Self::SearchMemoryFacts => json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "group_ids": group_ids,
                    "max_facts": {"type": "integer", "default": DEFAULT_LIMIT},
                    "center_node_uuid": {"type": "string"}
                },
                "required": ["query"]
            }),
            Self::DeleteEntityEdge | Self::DeleteEpisode | Self::GetEntityEdge => json!({
                "type": "object",
                "properties": {"uuid": {"type": "string"}},
                "required": ["uuid"]
            }),
            Self::GetEpisodes => json!({
                "type": "object",
                "properties": {
                    "group_ids": group_ids,
                    "max_episodes": {"type": "integer", "default": DEFAULT_LIMIT}
                }
            }),
            Self::ClearGraph => json!({
                "type": "object",
                "properties": {"group_ids": group_ids}
            }),
            Self::GetStatus => json!({"type": "object", "properties": {}}),
        }
    }
}

impl FromStr for MemoryToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct AddMemoryArgs {
    name: String,
    episode_body: String,
    group_id: Option<String>,
    #[serde(default = "default_source")]
    source: String,
    #[serde(default)]
    source_description: String,
    uuid: Option<String>,
}

fn default_source() -> String {
    "text".to_string()
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    group_ids: Option<Vec<String>>,
    #[serde(alias = "max_nodes", alias = "max_facts")]
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UuidArgs {
    uuid: String,
}

#[derive(Debug, Default, Deserialize)]
struct GroupArgs {
    group_ids: Option<Vec<String>>,
    max_episodes: Option<i64>,
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn parse_uuid(raw: &str) -> Result<Uuid, ToolError> {
    Uuid::parse_str(raw).map_err(|_| ToolError::InvalidArguments(format!("'{raw}' is not a valid UUID")))
}

fn positive_limit(value: Option<i64>, field: &str) -> Result<usize, ToolError> {
    match value {
        None => Ok(DEFAULT_LIMIT),
        Some(n) if n > 0 => Ok(n as usize),
        Some(_) => Err(ToolError::InvalidArguments(format!("{field} must be a positive integer"))),
    }
}

fn effective_groups(group_ids: Option<Vec<String>>) -> Vec<String> {
    match group_ids {
        Some(ids) if !ids.is_empty() => ids,
        _ => vec![DEFAULT_GROUP_ID.to_string()],
    }
}

fn episode_json(episode: &Episode) -> Value {
    json!({
        "uuid": episode.uuid,
        "name": episode.name,
        "content": episode.content,
        "created_at": episode.created_at.to_rfc3339(),
        "source": episode.source,
        "source_description": episode.source_description,
        "group_id": episode.group_id,
    })
}

pub struct MemoryTool {
    kind: MemoryToolKind,
    store: Arc<InMemoryEpisodeStore>,
}

impl MemoryTool {
    pub fn new(kind: MemoryToolKind, store: Arc<InMemoryEpisodeStore>) -> Self {
        Self { kind, store }
    }

    async fn add_memory(&self, args: AddMemoryArgs) -> Result<Value, ToolError> {
        let uuid = match args.uuid.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => parse_uuid(raw)?,
            None => Uuid::new_v4(),
        };
        let group_id = args
            .group_id
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| DEFAULT_GROUP_ID.to_string());
        let episode = Episode {
            uuid,
            name: args.name,
            content: args.episode_body,
            group_id,
            source: args.source.to_lowercase(),
            source_description: args.source_description,
            created_at: Utc::now(),
        };
        let message = format!(
            "Episode '{}' added to group '{}'",
            episode.name, episode.group_id
        );
        self.store.add(episode).await;
        Ok(json!({"message": message, "uuid": uuid}))
    }

    async fn search_nodes(&self, args: SearchArgs) -> Result<Value, ToolError> {
        let limit = positive_limit(args.limit, "max_nodes")?;
        let hits = self
            .store
            .search(&args.query, &effective_groups(args.group_ids), limit)
            .await;
        if hits.is_empty() {
            return Ok(json!({"message": "No relevant nodes found", "nodes": []}));
        }
        let nodes: Vec<Value> = hits
            .iter()
            .map(|e| {
                json!({
                    "uuid": e.uuid,
                    "name": e.name,
                    "labels": ["Episodic"],
                    "created_at": e.created_at.to_rfc3339(),
                    "summary": e.content,
                    "group_id": e.group_id,
                })
            })
            .collect();
        Ok(json!({"message": "Nodes retrieved successfully", "nodes": nodes}))
    }

    async fn search_memory_facts(&self, args: SearchArgs) -> Result<Value, ToolError> {
        let limit = positive_limit(args.limit, "max_facts")?;
        let hits = self
            .store
            .search(&args.query, &effective_groups(args.group_ids), limit)
            .await;
        if hits.is_empty() {
            return Ok(json!({"message": "No relevant facts found", "facts": []}));
        }
        let facts: Vec<Value> = hits
            .iter()
            .map(|e| {
                json!({
                    "uuid": e.uuid,
                    "name": e.name,
                    "fact": e.content,
                    "group_id": e.group_id,
                    "created_at": e.created_at.to_rfc3339(),
                })
            })
            .collect();
        Ok(json!({"message": "Facts retrieved successfully", "facts": facts}))
    }

    async fn delete_episode(&self, args: UuidArgs) -> Result<Value, ToolError> {
        let id = parse_uuid(&args.uuid)?;
        if !self.store.delete(id).await {
            return Err(ToolError::NotFound(format!("Episode with UUID {id} not found")));
        }
        Ok(json!({"message": format!("Episode with UUID {id} deleted successfully")}))
    }

    async fn get_episodes(&self, args: GroupArgs) -> Result<Value, ToolError> {
        let limit = positive_limit(args.max_episodes, "max_episodes")?;
        let episodes = self
            .store
            .recent(&effective_groups(args.group_ids), limit)
            .await;
        if episodes.is_empty() {
            return Ok(json!({"message": "No episodes found", "episodes": []}));
        }
        let episodes: Vec<Value> = episodes.iter().map(episode_json).collect();
        Ok(json!({"message": "Episodes retrieved successfully", "episodes": episodes}))
    }

    async fn clear_graph(&self, args: GroupArgs) -> Result<Value, ToolError> {
        let groups = effective_groups(args.group_ids);
        let removed = self.store.clear(&groups).await;
        info!("Cleared {} episode(s) from groups {:?}", removed, groups);
        Ok(json!({
            "message": format!("Graph data cleared for group IDs: {}", groups.join(", ")),
            "removed": removed,
        }))
    }

    async fn get_status(&self) -> Result<Value, ToolError> {
        let episodes = self.store.len().await;
        Ok(json!({
            "status": "ok",
            "message": format!("Memory server is running with {episodes} stored episode(s)"),
        }))
    }
}

#[async_trait]
impl ToolHandler for MemoryTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.kind.name().to_string(),
            description: self.kind.description().to_string(),
            input_schema: self.kind.input_schema(),
        }
    }

    async fn call(&self, context: &CallContext, arguments: Value) -> Result<Value, ToolError> {
        debug!(
            "Dispatching {} for user_id={}",
            self.kind.name(),
            context.principal.user_id()
        );
        match self.kind {
            MemoryToolKind::AddMemory => self.add_memory(parse_args(arguments)?).await,
            MemoryToolKind::SearchNodes => self.search_nodes(parse_args(arguments)?).await,
            MemoryToolKind::SearchMemoryFacts => self.search_memory_facts(parse_args(arguments)?).await,
            MemoryToolKind::DeleteEpisode => self.delete_episode(parse_args(arguments)?).await,
            MemoryToolKind::DeleteEntityEdge | MemoryToolKind::GetEntityEdge => {
                let args: UuidArgs = parse_args(arguments)?;
                Err(ToolError::NotFound(format!(
                    "Entity edge with UUID {} not found",
                    args.uuid
                )))
            }
            MemoryToolKind::GetEpisodes => self.get_episodes(parse_args(arguments)?).await,
            MemoryToolKind::ClearGraph => self.clear_graph(parse_args(arguments)?).await,
            MemoryToolKind::GetStatus => self.get_status().await,
        }
    }
}

/// Register all nine memory tools against one shared store.
pub fn register_memory_tools(registry: &mut ToolRegistry, store: Arc<InMemoryEpisodeStore>) {
    for kind in MemoryToolKind::ALL {
        registry.register(Arc::new(MemoryTool::new(kind, store.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::operation::OperationCatalog;
    use crate::domain::principal::{Principal, Role};

    fn setup() -> (ToolRegistry, Arc<InMemoryEpisodeStore>) {
        let store = Arc::new(InMemoryEpisodeStore::new());
        let mut registry = ToolRegistry::new();
        register_memory_tools(&mut registry, store.clone());
        (registry, store)
    }

    fn ctx() -> CallContext {
        CallContext {
            principal: Principal::new("admin", Role::Admin),
        }
    }

    #[test]
    fn test_registers_nine_tools() {
        let (registry, _) = setup();
        assert_eq!(registry.len(), 9);
        for kind in MemoryToolKind::ALL {
            assert!(registry.exposes(kind.name()));
            assert_eq!(kind.name().parse::<MemoryToolKind>().unwrap(), kind);
        }
    }

    #[tokio::test]
    async fn test_add_then_search_and_list() {
        let (registry, store) = setup();

        let added = registry
            .invoke(
                "add_memory",
                &ctx(),
                json!({"name": "Kickoff", "episode_body": "Alice owns the roadmap"}),
            )
            .await
            .unwrap();
        assert!(added["message"].as_str().unwrap().contains("group 'main'"));
        assert_eq!(store.len().await, 1);

        let nodes = registry
            .invoke("search_nodes", &ctx(), json!({"query": "ROADMAP"}))
            .await
            .unwrap();
        assert_eq!(nodes["nodes"].as_array().unwrap().len(), 1);

        let facts = registry
            .invoke("search_memory_facts", &ctx(), json!({"query": "nothing here"}))
            .await
            .unwrap();
        assert_eq!(facts["message"], "No relevant facts found");

        let episodes = registry.invoke("get_episodes", &ctx(), Value::Null).await.unwrap();
        assert_eq!(episodes["episodes"][0]["name"], "Kickoff");
    }

    #[tokio::test]
    async fn test_delete_episode_and_missing_edges() {
        let (registry, store) = setup();
        let added = registry
            .invoke("add_memory", &ctx(), json!({"name": "n", "episode_body": "b"}))
            .await
            .unwrap();
        let uuid = added["uuid"].as_str().unwrap().to_string();

        registry
            .invoke("delete_episode", &ctx(), json!({"uuid": uuid}))
            .await
            .unwrap();
        assert!(store.is_empty().await);

        let again = registry
            .invoke("delete_episode", &ctx(), json!({"uuid": uuid}))
            .await
            .unwrap_err();
        assert!(matches!(again, ToolError::NotFound(_)));

        let edge = registry
            .invoke("get_entity_edge", &ctx(), json!({"uuid": uuid}))
            .await
            .unwrap_err();
        assert!(matches!(edge, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let (registry, _) = setup();

        let missing = registry
            .invoke("add_memory", &ctx(), json!({"name": "only a name"}))
            .await
            .unwrap_err();
        assert!(matches!(missing, ToolError::InvalidArguments(_)));

        let zero = registry
            .invoke("search_memory_facts", &ctx(), json!({"query": "x", "max_facts": 0}))
            .await
            .unwrap_err();
        assert!(matches!(zero, ToolError::InvalidArguments(msg) if msg.contains("max_facts")));
    }

    #[tokio::test]
    async fn test_clear_graph_scoped_to_groups() {
        let (registry, store) = setup();
        for group in ["a", "b"] {
            registry
                .invoke(
                    "add_memory",
                    &ctx(),
                    json!({"name": group, "episode_body": "x", "group_id": group}),
                )
                .await
                .unwrap();
        }

        let out = registry
            .invoke("clear_graph", &ctx(), json!({"group_ids": ["a"]}))
            .await
            .unwrap();

        assert_eq!(out["removed"], 1);
        assert_eq!(store.len().await, 1);
        let status = registry.invoke("get_status", &ctx(), json!({})).await.unwrap();
        assert_eq!(status["status"], "ok");
    }
}
