//! `llmrelay serve` — HTTP front for the client manager.
//!
//! Startup sequence:
//! 1. Load config (file + env)
//! 2. Select the default provider entry (openai_compatible → ollama → openai)
//! 3. Build the `LlmClientManager`
//! 4. Preload the Ollama model if Ollama is the default
//! 5. Serve `POST /api/chat` and `GET /health` until Ctrl+C
//! 6. Unload the Ollama model if configured to

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tracing::{info, warn};

use llmrelay_core::config::{load_config, OllamaConfig, ProviderConfig};
use llmrelay_core::types::{ChatReply, ChatRequest};
use llmrelay_providers::manager::{dispatch_chat, LlmClientManager, ManagerOptions};
use llmrelay_providers::ollama;

use crate::helpers;

// ─────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────

/// Shared handler state. `manager` is `None` until one has been built.
#[derive(Clone, Default)]
pub struct AppState {
    pub manager: Option<Arc<LlmClientManager>>,
}

impl AppState {
    pub fn new(manager: LlmClientManager) -> Self {
        Self {
            manager: Some(Arc::new(manager)),
        }
    }
}

/// Build the axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatReply> {
    Json(dispatch_chat(state.manager.as_deref(), request).await)
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let default_client = state
        .manager
        .as_ref()
        .is_some_and(|m| m.has_default_client());
    Json(json!({
        "status": "ok",
        "default_client": default_client,
    }))
}

// ─────────────────────────────────────────────
// Server lifecycle
// ─────────────────────────────────────────────

/// A running server: bound port plus a shutdown trigger.
pub struct ServeHandle {
    pub port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<tokio::task::JoinHandle<Result<(), std::io::Error>>>,
}

impl ServeHandle {
    /// Trigger graceful shutdown and wait for the server to stop.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            join.await??;
        }
        Ok(())
    }
}

/// Bind `bind` and serve in a spawned task.
pub async fn start(state: AppState, bind: &str) -> Result<ServeHandle> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    let port = listener.local_addr()?.port();
    info!("llmrelay listening on {bind} (port {port})");

    let app = router(state);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("received shutdown signal");
            })
            .await
    });

    Ok(ServeHandle {
        port,
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
    })
}

/// Build the manager from the configured default entry.
///
/// Also returns the Ollama settings when the default is an Ollama entry,
/// so the caller can manage model residency.
pub fn build_manager(
    config: &llmrelay_core::config::Config,
) -> Result<(LlmClientManager, Option<OllamaConfig>)> {
    let selected = config
        .llm_configs
        .select_default()
        .context("invalid default LLM configuration")?;

    let ollama = match &selected {
        Some(ProviderConfig::Ollama(o)) => Some(o.clone()),
        _ => None,
    };

    match &selected {
        Some(p) => info!(
            provider = p.kind().spec().display_name,
            "Initializing LLM manager with default config"
        ),
        None => warn!(
            "No compatible default LLM config found; relying on caller-supplied OpenRouter keys"
        ),
    }

    let options = ManagerOptions {
        request_timeout: config.server.request_timeout(),
        ..Default::default()
    };
    let default = selected.and_then(ProviderConfig::into_openai_compatible);
    Ok((LlmClientManager::new(default, options), ollama))
}

/// Run the server until Ctrl+C.
pub async fn run(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(config_path);
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let (manager, ollama) = build_manager(&config)?;

    if let Some(o) = &ollama {
        ollama::preload(manager.transport(), &o.base.base_url, &o.base.model, o.keep_alive).await;
    }
    let transport = manager.transport().clone();

    helpers::print_banner();
    let handle = start(AppState::new(manager), &config.server.bind_address()).await?;
    println!(
        "  Listening on http://{}:{}  (Ctrl+C to stop)",
        config.server.host, handle.port
    );
    println!();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    handle.shutdown().await?;

    if let Some(o) = ollama.filter(|o| o.unload_at_exit) {
        ollama::unload(&transport, &o.base.base_url, &o.base.model).await;
    }

    info!("llmrelay stopped");
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
