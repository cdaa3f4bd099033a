//! `seomagic chat` — Interactive or single-message chat mode.

use seomagic_agent::{AgentLoop, ChatOutcome};
use seomagic_core::message::ConversationId;
use seomagic_store::InMemoryConversationStore;
use seomagic_tools::{TaskApiClient, TaskToolkit};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
    conversation: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let provider = seomagic_providers::build_from_config(&config).ok_or_else(|| {
        format!(
            "ANTHROPIC_API_KEY not configured. Set the env var or add anthropic_api_key to {}",
            seomagic_config::AppConfig::config_dir()
                .join("config.toml")
                .display()
        )
    })?;
    let client =
        TaskApiClient::from_config(&config.remote).ok_or("JUSTMAGIC_API_KEY not configured")?;
    let tools = Arc::new(TaskToolkit::new(client)?);
    let store = Arc::new(InMemoryConversationStore::with_limit(
        config.agent.history_limit,
    ));
    let agent = AgentLoop::from_config(&config, provider, tools, store);

    let id = conversation
        .map(ConversationId::from)
        .unwrap_or_else(|| ConversationId::generate(Some("cli")));
    info!(conversation_id = %id, model = %config.model, "Chat session started");

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let outcome = agent.run(&id, &msg).await;
        eprint!("\r              \r");
        print_outcome(&outcome?);
        return Ok(());
    }

    println!();
    println!("  seomagic — interactive mode");
    println!("  Model:        {}", config.model);
    println!("  Conversation: {id}");
    println!("  Type your message and press Enter. Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        eprint!("  ...");
        match agent.run(&id, line).await {
            Ok(outcome) => {
                eprint!("\r     \r");
                print_outcome(&outcome);
            }
            Err(e) => {
                eprint!("\r     \r");
                error!(conversation_id = %id, kind = %e.kind(), error = %e, "Chat turn failed");
                eprintln!("  [{}] {}", e.kind(), e.public_message());
                println!();
            }
        }
    }

    println!();
    info!(conversation_id = %id, "Chat session ended");
    Ok(())
}

fn print_outcome(outcome: &ChatOutcome) {
    for call in &outcome.tool_calls {
        println!("  [tool] {} {}", call.tool, call.input);
    }
    println!();
    for line in outcome.response.lines() {
        println!("  Assistant > {line}");
    }
    println!();
}
