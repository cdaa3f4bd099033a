//! The agent reasoning loop implementation.

use futures::future::join_all;
use seomagic_config::AppConfig;
use seomagic_core::error::{Error, ToolError};
use seomagic_core::message::{ContentBlock, ConversationId, Turn};
use seomagic_core::provider::{ModelRequest, ModelResponse, Provider};
use seomagic_core::store::ConversationStore;
use seomagic_core::tool::{ToolDefinition, ToolExecutor, ToolInvocation};
use seomagic_store::KeyedLocks;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::window::model_window;

const PREVIEW_CHARS: usize = 200;

/// One tool call made while answering a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    pub tool: String,
    pub input: serde_json::Value,
    /// The first 200 characters of the rendered result.
    pub result: String,
}

/// The outcome of one user message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatOutcome {
    pub conversation_id: ConversationId,
    pub response: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub iterations: u32,
}

/// The core agent loop that orchestrates model calls and tool execution.
pub struct AgentLoop {
    /// The conversational model
    provider: Arc<dyn Provider>,

    /// The tools offered to the model
    tools: Arc<dyn ToolExecutor>,

    /// Turn history
    store: Arc<dyn ConversationStore>,

    /// Serializes runs per conversation
    locks: KeyedLocks,

    model: String,
    system_prompt: Option<String>,
    max_tokens: u32,
    temperature: Option<f32>,

    /// Maximum model calls per user message
    max_iterations: u32,

    tool_timeout: Duration,
    request_timeout: Duration,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolExecutor>,
        store: Arc<dyn ConversationStore>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            tools,
            store,
            locks: KeyedLocks::new(),
            model: model.into(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: None,
            max_iterations: 10,
            tool_timeout: Duration::from_secs(150),
            request_timeout: Duration::from_secs(600),
        }
    }

    /// Create an agent loop with every setting taken from config.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolExecutor>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        let agent = Self::new(provider, tools, store, config.model.clone())
            .with_system_prompt(config.agent.system_prompt.clone())
            .with_max_tokens(config.max_tokens)
            .with_max_iterations(config.agent.max_iterations)
            .with_tool_timeout(Duration::from_secs(config.agent.tool_timeout_secs))
            .with_request_timeout(Duration::from_secs(config.agent.request_timeout_secs));
        match config.temperature {
            Some(t) => agent.with_temperature(t),
            None => agent,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.is_empty()).then_some(prompt);
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of model calls per user message.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Bound each individual tool execution.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Bound a whole run, including the wait for the conversation lock.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Forget a conversation. Returns whether it existed.
    pub async fn clear(&self, id: &ConversationId) -> Result<bool, Error> {
        let _guard = self.locks.acquire(id).await;
        Ok(self.store.clear(id).await?)
    }

    /// Answer one user message in a conversation.
    ///
    /// The user turn is appended first and stays in history even if the run
    /// fails. Runs for the same conversation are serialized.
    pub async fn run(&self, id: &ConversationId, message: &str) -> Result<ChatOutcome, Error> {
        let secs = self.request_timeout.as_secs();
        match tokio::time::timeout(self.request_timeout, self.run_serialized(id, message)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(conversation_id = %id, timeout_secs = secs, "Run timed out");
                Err(Error::Timeout { secs })
            }
        }
    }

    async fn run_serialized(&self, id: &ConversationId, message: &str) -> Result<ChatOutcome, Error> {
        let _guard = self.locks.acquire(id).await;
        info!(conversation_id = %id, chars = message.chars().count(), "Processing message");

        self.store.append(id, Turn::user(message)).await?;

        let definitions = self.tools.definitions();
        let mut tool_calls = Vec::new();

        for iteration in 1..=self.max_iterations {
            let history = self.store.get(id).await?;
            let request = self.request(model_window(&history), &definitions);
            debug!(conversation_id = %id, iteration, turns = request.turns.len(), "Calling model");

            let response = self.provider.complete(request).await?;
            if let Some(usage) = &response.usage {
                debug!(
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    "Model usage"
                );
            }

            if !response.wants_tools() {
                let text = response.text();
                self.store_final(id, &response).await?;
                info!(
                    conversation_id = %id,
                    iterations = iteration,
                    tool_calls = tool_calls.len(),
                    "Run complete"
                );
                return Ok(ChatOutcome {
                    conversation_id: id.clone(),
                    response: text,
                    tool_calls,
                    iterations: iteration,
                });
            }

            let invocations = response.invocations();
            self.store
                .append(id, Turn::assistant(response.content.clone()))
                .await?;

            let (results, records) = self.execute_all(&invocations).await;
            tool_calls.extend(records);
            self.store.append(id, Turn::tool_results(results)).await?;
        }

        warn!(conversation_id = %id, max = self.max_iterations, "Iteration limit reached");
        Err(Error::IterationLimit {
            max: self.max_iterations,
        })
    }

    fn request(&self, turns: Vec<Turn>, tools: &[ToolDefinition]) -> ModelRequest {
        ModelRequest {
            model: self.model.clone(),
            system: self.system_prompt.clone(),
            turns,
            tools: tools.to_vec(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Store the final answer. Stray tool_use blocks are dropped so the
    /// stored turn never asks for results that will not come.
    async fn store_final(&self, id: &ConversationId, response: &ModelResponse) -> Result<(), Error> {
        let blocks: Vec<ContentBlock> = response
            .content
            .iter()
            .filter(|b| matches!(b, ContentBlock::Text { text } if !text.is_empty()))
            .cloned()
            .collect();
        if !blocks.is_empty() {
            self.store.append(id, Turn::assistant(blocks)).await?;
        }
        Ok(())
    }

    /// Run every invocation concurrently. Results keep invocation order.
    async fn execute_all(
        &self,
        invocations: &[ToolInvocation],
    ) -> (Vec<ContentBlock>, Vec<ToolCallRecord>) {
        let outcomes = join_all(invocations.iter().map(|inv| self.execute_one(inv))).await;

        invocations
            .iter()
            .zip(outcomes)
            .map(|(inv, outcome)| {
                let (content, is_error) = match outcome {
                    Ok(value) => (value.to_string(), false),
                    Err(e) => (e.to_json().to_string(), true),
                };
                let record = ToolCallRecord {
                    tool: inv.name.clone(),
                    input: inv.arguments.clone(),
                    result: content.chars().take(PREVIEW_CHARS).collect(),
                };
                let block = ContentBlock::ToolResult {
                    tool_use_id: inv.call_id.clone(),
                    content,
                    is_error,
                };
                (block, record)
            })
            .unzip()
    }

    async fn execute_one(&self, invocation: &ToolInvocation) -> Result<serde_json::Value, ToolError> {
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.tool_timeout, self.tools.execute(invocation))
            .await
            .unwrap_or_else(|_| {
                Err(ToolError::request(format!(
                    "tool timed out after {}s",
                    self.tool_timeout.as_secs()
                )))
            });
        debug!(
            tool = %invocation.name,
            duration_ms = start.elapsed().as_millis() as u64,
            success = outcome.is_ok(),
            "Tool finished"
        );
        outcome
    }
}
