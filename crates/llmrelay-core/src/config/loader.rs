//! Config loader — reads `~/.llmrelay/config.json` (or a YAML document) and
//! merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. File: JSON, or YAML when the extension is `.yaml` / `.yml`
//! 3. Environment variables `LLMRELAY_<SECTION>__<FIELD>` (override the file)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::provider::{RawProviderConfig, PROVIDERS};
use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Load configuration from the given (or default) path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let parsed = if is_yaml(path) {
        serde_yml::from_str::<Config>(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Config>(&content).map_err(|e| e.to_string())
    };

    let config = match parsed {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty JSON, or YAML by extension).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = if is_yaml(&config_path) {
        serde_yml::to_string(config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
    } else {
        serde_json::to_string_pretty(config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
    };

    std::fs::write(&config_path, content)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `LLMRELAY_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `LLMRELAY_SERVER__HOST` → `server.host`
/// - `LLMRELAY_SERVER__PORT` → `server.port`
/// - `LLMRELAY_SERVER__REQUEST_TIMEOUT_SECS` → `server.request_timeout_secs`
/// - `LLMRELAY_<CONFIG_KEY>__API_KEY` → `llm_configs.<config_key>.llm_api_key`
/// - `LLMRELAY_<CONFIG_KEY>__BASE_URL` → `llm_configs.<config_key>.base_url`
/// - `LLMRELAY_<CONFIG_KEY>__MODEL` → `llm_configs.<config_key>.model`
///
/// e.g. `LLMRELAY_OLLAMA_LLM__MODEL=qwen2.5:latest`. A provider override
/// creates the entry if the file did not have one.
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("LLMRELAY_SERVER__HOST") {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var("LLMRELAY_SERVER__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.server.port = p;
        }
    }
    if let Ok(val) = std::env::var("LLMRELAY_SERVER__REQUEST_TIMEOUT_SECS") {
        if let Ok(secs) = val.parse::<u64>() {
            config.server.request_timeout_secs = secs;
        }
    }

    for spec in PROVIDERS {
        apply_provider_env(config.llm_configs.slot_mut(spec.kind), spec.config_key);
    }

    config
}

/// Apply env var overrides for a single provider entry.
fn apply_provider_env(entry: &mut Option<RawProviderConfig>, config_key: &str) {
    let prefix = format!("LLMRELAY_{}", config_key.to_uppercase());

    if let Ok(val) = std::env::var(format!("{prefix}__API_KEY")) {
        entry.get_or_insert_with(Default::default).llm_api_key = Some(val);
    }
    if let Ok(val) = std::env::var(format!("{prefix}__BASE_URL")) {
        entry.get_or_insert_with(Default::default).base_url = Some(val);
    }
    if let Ok(val) = std::env::var(format!("{prefix}__MODEL")) {
        entry.get_or_insert_with(Default::default).model = Some(val);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
