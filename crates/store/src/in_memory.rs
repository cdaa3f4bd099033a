//! In-memory backend: volatile history that lives as long as the process.

use async_trait::async_trait;
use seomagic_core::error::StoreError;
use seomagic_core::message::{ConversationId, Turn};
use seomagic_core::store::ConversationStore;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Turns kept per conversation unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 40;

/// An in-memory store keeping the most recent `limit` turns per conversation.
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<ConversationId, Vec<Turn>>>,
    limit: usize,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create a store with a custom retention cap (at least 1).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of conversations currently held.
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, id: &ConversationId, turn: Turn) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        let history = conversations.entry(id.clone()).or_default();
        history.push(turn);

        if history.len() > self.limit {
            let excess = history.len() - self.limit;
            history.drain(..excess);
            debug!(conversation_id = %id, dropped = excess, "Trimmed conversation history");
        }
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Vec<Turn>, StoreError> {
        Ok(self
            .conversations
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn clear(&self, id: &ConversationId) -> Result<bool, StoreError> {
        Ok(self.conversations.write().await.remove(id).is_some())
    }
}
