// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Content snippet stored in the memory graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub uuid: Uuid,
    pub name: String,
    pub content: String,
    pub group_id: String,
    pub source: String,
    pub source_description: String,
    pub created_at: DateTime<Utc>,
}

/// Process-local episode storage standing in for the graph database.
///
/// Search is a case-insensitive substring match over name and content.
pub struct InMemoryEpisodeStore {
    episodes: Arc<RwLock<HashMap<Uuid, Episode>>>,
}

impl InMemoryEpisodeStore {
    pub fn new() -> Self {
        Self {
            episodes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn add(&self, episode: Episode) -> Uuid {
        let id = episode.uuid;
        self.episodes.write().await.insert(id, episode);
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Episode> {
        self.episodes.read().await.get(&id).cloned()
    }

    pub async fn delete(&self, id: Uuid) -> bool {
        self.episodes.write().await.remove(&id).is_some()
    }

    /// Most recent episodes of the given groups, newest first.
    pub async fn recent(&self, group_ids: &[String], limit: usize) -> Vec<Episode> {
        let guard = self.episodes.read().await;
        let mut matches: Vec<Episode> = guard
            .values()
            .filter(|e| group_ids.is_empty() || group_ids.contains(&e.group_id))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches.truncate(limit);
        matches
    }

    pub async fn search(&self, query: &str, group_ids: &[String], limit: usize) -> Vec<Episode> {
        let needle = query.to_lowercase();
        let mut matches: Vec<Episode> = self
            .recent(group_ids, usize::MAX)
            .await
            .into_iter()
            .filter(|e| {
                e.name.to_lowercase().contains(&needle) || e.content.to_lowercase().contains(&needle)
            })
            .collect();
        matches.truncate(limit);
        matches
    }

    /// Remove every episode of the given groups. Returns how many were removed.
    pub async fn clear(&self, group_ids: &[String]) -> usize {
        let mut guard = self.episodes.write().await;
        let before = guard.len();
        guard.retain(|_, e| !group_ids.contains(&e.group_id));
        before - guard.len()
    }

    pub async fn len(&self) -> usize {
        self.episodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.episodes.read().await.is_empty()
    }
}

impl Default for InMemoryEpisodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(name: &str, content: &str, group: &str) -> Episode {
        Episode {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            content: content.to_string(),
            group_id: group.to_string(),
            source: "text".to_string(),
            source_description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_add_search_delete() {
        let store = InMemoryEpisodeStore::new();
        let id = store.add(episode("Kickoff", "Alice met Bob", "main")).await;
        store.add(episode("Other", "unrelated", "main")).await;

        let hits = store.search("alice", &[], 10).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].uuid, id);

        assert!(store.delete(id).await);
        assert!(!store.delete(id).await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear_only_touches_given_groups() {
        let store = InMemoryEpisodeStore::new();
        store.add(episode("a", "x", "g1")).await;
        store.add(episode("b", "y", "g2")).await;

        assert_eq!(store.clear(&["g1".to_string()]).await, 1);
        assert_eq!(store.recent(&[], 10).await.len(), 1);
        assert_eq!(store.recent(&["g2".to_string()], 10).await.len(), 1);
    }
}
