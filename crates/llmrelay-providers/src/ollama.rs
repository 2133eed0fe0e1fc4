//! Ollama model residency: preload at startup, unload at shutdown.
//!
//! These hit Ollama's native API (`/api/...`), not the OpenAI-compatible
//! `/v1` surface. Failures are logged and swallowed; a cold model only
//! makes the first request slower.

use serde_json::json;
use tracing::{debug, info, warn};

/// Strip the OpenAI-compatible `/v1` suffix to reach the native API root.
pub fn native_root(base_url: &str) -> &str {
    let trimmed = base_url.trim_end_matches('/');
    trimmed.strip_suffix("/v1").unwrap_or(trimmed)
}

/// Ask Ollama to load `model` and keep it for `keep_alive` seconds
/// (-1 keeps it indefinitely).
pub async fn preload(client: &reqwest::Client, base_url: &str, model: &str, keep_alive: f64) {
    let url = format!("{}/api/chat", native_root(base_url));
    let body = json!({
        "model": model,
        "messages": [],
        "keep_alive": keep_alive,
    });

    debug!(url = %url, model = %model, "Preloading Ollama model");
    match client.post(&url).json(&body).send().await {
        Ok(resp) if resp.status().is_success() => {
            info!(model = %model, "Ollama model preloaded");
        }
        Ok(resp) => {
            warn!(model = %model, status = %resp.status(), "Ollama preload rejected");
        }
        Err(e) => {
            warn!(model = %model, error = %e, "Failed to preload Ollama model");
        }
    }
}

/// Ask Ollama to drop `model` from memory right away.
pub async fn unload(client: &reqwest::Client, base_url: &str, model: &str) {
    let url = format!("{}/api/generate", native_root(base_url));
    let body = json!({
        "model": model,
        "keep_alive": 0,
    });

    debug!(url = %url, model = %model, "Unloading Ollama model");
    match client.post(&url).json(&body).send().await {
        Ok(resp) if resp.status().is_success() => {
            info!(model = %model, "Ollama model unloaded");
        }
        Ok(resp) => {
            warn!(model = %model, status = %resp.status(), "Ollama unload rejected");
        }
        Err(e) => {
            warn!(model = %model, error = %e, "Failed to unload Ollama model");
        }
    }
}
