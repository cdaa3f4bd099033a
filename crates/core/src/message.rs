//! Conversation turn domain types.
//!
//! These are the value objects that flow through the entire system:
//! a user message becomes a [`Turn`], the model answers with a turn made of
//! content blocks, and tool results travel back as a turn of result blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Generate an id in the `conv_<user>_<unix-ts>` shape.
    pub fn generate(user_id: Option<&str>) -> Self {
        let now = Utc::now();
        Self(format!(
            "conv_{}_{}.{:06}",
            user_id.unwrap_or("anon"),
            now.timestamp(),
            now.timestamp_subsec_micros()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The end user
    User,
    /// The model
    Assistant,
    /// Results of tool invocations, sent back on the model's user side
    ToolResult,
}

/// A structured piece of turn content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

/// Turn content: plain text or an ordered sequence of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: TurnContent,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a plain-text user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Text(text.into()),
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant turn from model-produced blocks.
    pub fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Blocks(blocks),
            timestamp: Utc::now(),
        }
    }

    /// Create a plain-text assistant turn.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::assistant(vec![ContentBlock::Text { text: text.into() }])
    }

    /// Create the combined tool-result turn for one model turn.
    pub fn tool_results(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::ToolResult,
            content: TurnContent::Blocks(blocks),
            timestamp: Utc::now(),
        }
    }

    /// Content viewed as blocks (plain text becomes a single text block).
    pub fn blocks(&self) -> Vec<ContentBlock> {
        match &self.content {
            TurnContent::Text(text) => vec![ContentBlock::Text { text: text.clone() }],
            TurnContent::Blocks(blocks) => blocks.clone(),
        }
    }

    /// All text blocks concatenated, in order.
    pub fn text(&self) -> String {
        match &self.content {
            TurnContent::Text(text) => text.clone(),
            TurnContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Whether this turn can open a model window: a user turn that carries
    /// no tool results.
    pub fn is_user_prompt(&self) -> bool {
        self.role == Role::User
            && match &self.content {
                TurnContent::Text(_) => true,
                TurnContent::Blocks(blocks) => blocks
                    .iter()
                    .all(|b| !matches!(b, ContentBlock::ToolResult { .. })),
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("Cluster my queries");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.text(), "Cluster my queries");
        assert!(turn.is_user_prompt());
    }

    #[test]
    fn text_concatenates_text_blocks_only() {
        let turn = Turn::assistant(vec![
            ContentBlock::Text { text: "Task ".into() },
            ContentBlock::ToolUse {
                id: "toolu_1".into(),
                name: "justmagic_info".into(),
                input: serde_json::json!({}),
            },
            ContentBlock::Text { text: "queued".into() },
        ]);
        assert_eq!(turn.text(), "Task queued");
    }

    #[test]
    fn tool_result_turn_is_not_a_prompt() {
        let turn = Turn::tool_results(vec![ContentBlock::ToolResult {
            tool_use_id: "toolu_1".into(),
            content: "{}".into(),
            is_error: false,
        }]);
        assert!(!turn.is_user_prompt());
    }

    #[test]
    fn block_serialization_is_tagged() {
        let block = ContentBlock::ToolResult {
            tool_use_id: "toolu_9".into(),
            content: "{\"tid\":1}".into(),
            is_error: true,
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "tool_result");
        assert_eq!(json["is_error"], true);

        let ok = ContentBlock::ToolResult {
            tool_use_id: "toolu_9".into(),
            content: "{}".into(),
            is_error: false,
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("is_error").is_none());
    }

    #[test]
    fn generated_conversation_id_shape() {
        let id = ConversationId::generate(Some("42"));
        assert!(id.as_str().starts_with("conv_42_"));
        let anon = ConversationId::generate(None);
        assert!(anon.as_str().starts_with("conv_anon_"));
    }
}
