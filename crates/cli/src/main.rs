//! seomagic CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP gateway
//! - `chat`     — Interactive or single-message chat with the SEO agent
//! - `tasks`    — List recent remote tasks
//! - `task`     — Show one remote task
//! - `account`  — Show remote account info
//! - `config`   — Print the default or the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "seomagic",
    about = "seomagic — SEO assistant agent over the Just-Magic task API",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.seomagic/config.toml)
    #[arg(short, long, global = true, env = "SEOMAGIC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the SEO agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Continue an existing conversation id
        #[arg(long)]
        conversation: Option<String>,
    },

    /// List recent remote tasks
    Tasks {
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },

    /// Show one remote task
    Task {
        /// Task id
        tid: i64,
    },

    /// Show remote account info
    Account,

    /// Print configuration
    Config {
        /// Print the effective configuration (secrets redacted) instead of the defaults
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Chat {
            message,
            conversation,
        } => commands::chat::run(config_path, message, conversation).await?,
        Commands::Tasks { limit } => commands::tasks::list(config_path, limit).await?,
        Commands::Task { tid } => commands::tasks::show(config_path, tid).await?,
        Commands::Account => commands::tasks::account(config_path).await?,
        Commands::Config { show } => commands::config_cmd::run(config_path, show)?,
    }

    Ok(())
}
