//! llmrelay CLI — entry point.
//!
//! # Commands
//!
//! - `llmrelay serve` — run the `/api/chat` HTTP server
//! - `llmrelay chat -m MESSAGE` — one request through the resolution policy
//! - `llmrelay status` — show configuration and provider status
//! - `llmrelay init` — write a starter config

mod helpers;
mod init;
mod serve;
mod status;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use llmrelay_core::config::load_config;
use llmrelay_core::types::{ChatReply, Message};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// llmrelay — resolve chat requests to LLM providers
#[derive(Parser)]
#[command(name = "llmrelay", version, about, long_about = None)]
struct Cli {
    /// Config file (JSON, or YAML by extension). Defaults to ~/.llmrelay/config.json
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Send a single message and print the reply
    Chat {
        /// Message to send
        #[arg(short, long)]
        message: String,

        /// Your own API key (OpenRouter when combined with --openrouter-model)
        #[arg(long)]
        api_key: Option<String>,

        /// OpenRouter model name
        #[arg(long)]
        openrouter_model: Option<String>,

        /// Model to use instead of the configured default
        #[arg(long)]
        model: Option<String>,
    },

    /// Show configuration and provider status
    Status,

    /// Write a starter config file
    Init,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Serve { host, port } => {
            init_logging(cli.verbose, "info");
            serve::run(config_path.as_deref(), host, port).await
        }
        Commands::Chat {
            message,
            api_key,
            openrouter_model,
            model,
        } => {
            init_logging(cli.verbose, "warn");
            run_chat(config_path, message, api_key, openrouter_model, model).await
        }
        Commands::Status => status::run(config_path.as_deref()),
        Commands::Init => init::run(config_path.as_deref()),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(
    config_path: Option<PathBuf>,
    message: String,
    api_key: Option<String>,
    openrouter_model: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let config = load_config(config_path.as_deref());
    let (manager, _) = serve::build_manager(&config)?;

    info!("processing single message");
    let text = manager
        .generate_response(
            &[Message::user(message)],
            model.as_deref(),
            api_key.as_deref(),
            openrouter_model.as_deref(),
        )
        .await;

    helpers::print_reply(&ChatReply::response(text));
    Ok(())
}

/// Initialize tracing/logging. Without `--verbose`, `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool, quiet_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("llmrelay_cli=debug,llmrelay_core=debug,llmrelay_providers=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(quiet_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
