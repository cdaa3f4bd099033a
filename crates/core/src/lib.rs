//! # seomagic Core
//!
//! Domain types, traits, and error definitions shared by every seomagic crate.
//! This crate has **no framework dependencies**: it defines the conversation
//! model, the model-provider abstraction and the error taxonomy that the
//! remote task client, the agent loop and the gateway implement against.
//!
//! ## Layout
//!
//! - [`message`]: conversation turns and their content blocks
//! - [`provider`]: the [`Provider`] trait over the conversational model
//! - [`tool`]: tool declarations and invocations exchanged with the model
//! - [`store`]: the [`ConversationStore`] trait over turn history
//! - [`error`]: the error taxonomy ([`ErrorKind`]) and error types

pub mod error;
pub mod message;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ErrorKind, ProviderError, Result, StoreError, ToolError};
pub use message::{ContentBlock, ConversationId, Role, Turn, TurnContent};
pub use provider::{ModelRequest, ModelResponse, Provider, StopReason, Usage};
pub use store::ConversationStore;
pub use tool::{ToolDefinition, ToolExecutor, ToolInvocation};
