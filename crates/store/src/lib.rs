//! Conversation history storage for seomagic.
//!
//! Implements the `ConversationStore` trait from `seomagic-core`:
//! - **InMemoryConversationStore**: volatile, per-process history with a retention cap
//!
//! Also provides [`KeyedLocks`], used to serialize agent runs that target the
//! same conversation id.

pub mod in_memory;
pub mod locks;

pub use in_memory::{DEFAULT_HISTORY_LIMIT, InMemoryConversationStore};
pub use locks::KeyedLocks;
