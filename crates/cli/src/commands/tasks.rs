//! `seomagic tasks | task | account` — Direct calls to the remote task API.

use seomagic_tools::{TaskApiClient, TaskToolkit};
use serde_json::{Value, json};
use std::path::Path;

fn toolkit(config_path: Option<&Path>) -> Result<TaskToolkit, Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let client = TaskApiClient::from_config(&config.remote).ok_or("JUSTMAGIC_API_KEY not configured")?;
    Ok(TaskToolkit::new(client)?)
}

async fn call_and_print(
    config_path: Option<&Path>,
    tool: &str,
    arguments: Value,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = toolkit(config_path)?.call(tool, &arguments).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn list(config_path: Option<&Path>, limit: i64) -> Result<(), Box<dyn std::error::Error>> {
    call_and_print(config_path, "justmagic_list_tasks", json!({"limit": limit})).await
}

pub async fn show(config_path: Option<&Path>, tid: i64) -> Result<(), Box<dyn std::error::Error>> {
    call_and_print(config_path, "justmagic_get_task", json!({"tid": tid, "mode": "info"})).await
}

pub async fn account(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    call_and_print(config_path, "justmagic_info", json!({})).await
}
