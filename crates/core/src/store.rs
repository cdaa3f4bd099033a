//! The ConversationStore trait over per-conversation turn history.
//!
//! The store owns every conversation's turns for the lifetime of its id and
//! enforces a retention cap on every append, dropping the oldest turns first.
//! Implementations: in-memory (volatile); a durable backend can sit behind
//! the same contract.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::message::{ConversationId, Turn};

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Append a turn, then trim the history to the retention cap.
    async fn append(&self, id: &ConversationId, turn: Turn) -> std::result::Result<(), StoreError>;

    /// The retained turns in original order. Empty for unknown ids.
    async fn get(&self, id: &ConversationId) -> std::result::Result<Vec<Turn>, StoreError>;

    /// Forget a conversation. Returns whether it existed.
    async fn clear(&self, id: &ConversationId) -> std::result::Result<bool, StoreError>;
}
