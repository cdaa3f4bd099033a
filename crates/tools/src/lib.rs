//! Just-Magic SEO tools for the seomagic agent.
//!
//! The model calls tools by name; each name maps to a [`ToolKind`] with a
//! declarative schema ([`schema`]), a pure task builder ([`builder`]) and a
//! remote call through [`TaskApiClient`]. Downloaded results are decoded by
//! [`payload`].

pub mod builder;
pub mod catalog;
pub mod client;
pub mod payload;
pub mod schema;

pub use builder::{RemoteCall, RemoteTask};
pub use catalog::{CatalogError, ToolCatalog, ToolKind};
pub use client::{Submission, TaskApiClient};
pub use payload::TableResult;
pub use schema::ValidatedArgs;

use async_trait::async_trait;
use seomagic_core::error::ToolError;
use seomagic_core::tool::{ToolDefinition, ToolExecutor, ToolInvocation};
use serde_json::Value;
use tracing::{info, warn};

/// The full tool set bound to one task API client.
pub struct TaskToolkit {
    catalog: ToolCatalog,
    client: TaskApiClient,
}

impl TaskToolkit {
    pub fn new(client: TaskApiClient) -> Result<Self, CatalogError> {
        Ok(Self {
            catalog: ToolCatalog::new()?,
            client,
        })
    }

    pub fn client(&self) -> &TaskApiClient {
        &self.client
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Validate arguments for a named tool and build its remote call.
    pub fn prepare(&self, name: &str, arguments: &Value) -> Result<RemoteCall, ToolError> {
        let kind = ToolKind::from_name(name).ok_or_else(|| ToolError::unknown_tool(name))?;
        let spec = self
            .catalog
            .get(kind)
            .ok_or_else(|| ToolError::unknown_tool(name))?;
        let args = spec.validate(arguments)?;
        Ok(builder::build(kind, &args))
    }

    /// Perform a remote call and render its result for the model.
    pub async fn run(&self, call: RemoteCall) -> Result<Value, ToolError> {
        match call {
            RemoteCall::AccountInfo => self.client.info().await,
            RemoteCall::ListTasks { limit, offset } => self.client.list_tasks(limit, offset).await,
            RemoteCall::GetTask { tid, mode } => self.client.get_task(tid, &mode).await,
            RemoteCall::FetchTable { tid, max_rows } => self
                .client
                .fetch_table(tid, max_rows)
                .await
                .map(|table| table.to_json()),
            RemoteCall::Submit(task) => self
                .client
                .submit(&task)
                .await
                .map(Submission::into_result),
        }
    }

    /// Run a tool by name with raw arguments.
    pub async fn call(&self, name: &str, arguments: &Value) -> Result<Value, ToolError> {
        let call = self.prepare(name, arguments)?;
        self.run(call).await
    }
}

#[async_trait]
impl ToolExecutor for TaskToolkit {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.catalog
            .specs()
            .iter()
            .map(|spec| spec.to_definition())
            .collect()
    }

    async fn execute(&self, invocation: &ToolInvocation) -> Result<Value, ToolError> {
        info!(tool = %invocation.name, call_id = %invocation.call_id, "Executing tool");
        let result = self.call(&invocation.name, &invocation.arguments).await;
        if let Err(e) = &result {
            warn!(tool = %invocation.name, kind = %e.kind, error = %e.message, "Tool failed");
        }
        result
    }
}
