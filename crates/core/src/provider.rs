//! The Provider trait, the abstraction over the conversational model.
//!
//! A Provider knows how to send a conversation plus a tool catalog to a model
//! and get the model's next turn back, together with the reason it stopped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{ContentBlock, Turn};
use crate::tool::{ToolDefinition, ToolInvocation};

/// A single model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// The model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,

    /// Top-level system instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// The conversation, oldest first
    pub turns: Vec<Turn>,

    /// Tools the model may invoke
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Why the model ended its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    Other(String),
}

impl StopReason {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("end_turn") | None => Self::EndTurn,
            Some("tool_use") => Self::ToolUse,
            Some("max_tokens") => Self::MaxTokens,
            Some("stop_sequence") => Self::StopSequence,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The model's turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Content blocks in emission order
    pub content: Vec<ContentBlock>,

    pub stop_reason: StopReason,

    /// Which model actually responded
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ModelResponse {
    /// Every tool invocation the turn requested, in emission order.
    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolInvocation {
                    call_id: id.clone(),
                    name: name.clone(),
                    arguments: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// All text blocks concatenated.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether the loop should execute tools for this turn.
    pub fn wants_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
            && self
                .content
                .iter()
                .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }
}

/// The core Provider trait.
///
/// The agent loop calls `complete()` without knowing which backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get the model's complete turn.
    async fn complete(&self, request: ModelRequest) -> std::result::Result<ModelResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_reason_parsing() {
        assert_eq!(StopReason::parse(Some("tool_use")), StopReason::ToolUse);
        assert_eq!(StopReason::parse(Some("end_turn")), StopReason::EndTurn);
        assert_eq!(StopReason::parse(None), StopReason::EndTurn);
        assert_eq!(
            StopReason::parse(Some("refusal")),
            StopReason::Other("refusal".into())
        );
    }

    #[test]
    fn invocations_keep_emission_order() {
        let resp = ModelResponse {
            content: vec![
                ContentBlock::Text { text: "Working on it".into() },
                ContentBlock::ToolUse {
                    id: "a".into(),
                    name: "justmagic_cluster".into(),
                    input: serde_json::json!({"queries": ["x"]}),
                },
                ContentBlock::ToolUse {
                    id: "b".into(),
                    name: "justmagic_info".into(),
                    input: serde_json::json!({}),
                },
            ],
            stop_reason: StopReason::ToolUse,
            model: "mock".into(),
            usage: None,
        };
        let calls = resp.invocations();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].call_id, "a");
        assert_eq!(calls[1].name, "justmagic_info");
        assert!(resp.wants_tools());
    }

    #[test]
    fn tool_use_stop_without_blocks_is_final() {
        let resp = ModelResponse {
            content: vec![ContentBlock::Text { text: "done".into() }],
            stop_reason: StopReason::ToolUse,
            model: "mock".into(),
            usage: None,
        };
        assert!(!resp.wants_tools());
        assert_eq!(resp.text(), "done");
    }
}
