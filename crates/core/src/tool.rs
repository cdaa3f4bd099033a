//! Tool declarations and invocations exchanged with the model.
//!
//! The catalog itself (schemas, validation, task mapping) lives in
//! `seomagic-tools`; this module only carries the shapes the model sees.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// A tool declaration advertised to the model on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub input_schema: serde_json::Value,
}

/// A model-issued request to call a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Opaque correlation id supplied by the model turn
    pub call_id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Raw arguments, not yet validated
    pub arguments: serde_json::Value,
}

/// Anything that can advertise tools and run model-issued invocations.
///
/// Failures are values: an `Err` is rendered back to the model as a tool
/// result and never aborts the conversation.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// The declarations sent to the model with every request.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Validate and run one invocation.
    async fn execute(&self, invocation: &ToolInvocation)
    -> std::result::Result<serde_json::Value, ToolError>;
}
