//! Configuration schema.
//!
//! Hierarchy: `Config` → `ServerConfig`, `LlmConfigs` → one optional
//! [`RawProviderConfig`] per provider kind.
//!
//! Keys on disk are snake_case in both JSON and YAML documents.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use super::provider::{
    ConfigValidationError, OpenAICompatibleConfig, ProviderConfig, ProviderKind, RawProviderConfig,
    PROVIDERS,
};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.llmrelay/config.json` + env vars.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(deserialize_with = "lenient_server")]
    pub server: ServerConfig,
    pub llm_configs: LlmConfigs,
}

// ─────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────

/// HTTP server and upstream transport settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a single upstream chat-completion call.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 12393,
            request_timeout_secs: 120,
        }
    }
}

/// A malformed `server` section falls back to defaults instead of failing
/// the whole document.
fn lenient_server<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ServerConfig, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(ServerConfig::deserialize(value).unwrap_or_else(|e| {
        warn!("Invalid server section, using defaults: {}", e);
        ServerConfig::default()
    }))
}

// ─────────────────────────────────────────────
// LLM configs
// ─────────────────────────────────────────────

/// Order in which entries are considered for the dispatch manager's
/// default configuration.
pub const MANAGER_DEFAULT_PRIORITY: [ProviderKind; 3] = [
    ProviderKind::OpenAICompatible,
    ProviderKind::Ollama,
    ProviderKind::OpenAI,
];

/// Pool of provider entries. At most one of them ends up as the process
/// default; the others stay dormant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfigs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_compatible_llm: Option<RawProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama_llm: Option<RawProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_llm: Option<RawProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_llm: Option<RawProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mistral_llm: Option<RawProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zhipu_llm: Option<RawProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepseek_llm: Option<RawProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groq_llm: Option<RawProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_llm: Option<RawProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llama_cpp_llm: Option<RawProviderConfig>,
}

impl LlmConfigs {
    /// Get the raw entry for a provider kind.
    pub fn get(&self, kind: ProviderKind) -> Option<&RawProviderConfig> {
        self.slot(kind).as_ref()
    }

    fn slot(&self, kind: ProviderKind) -> &Option<RawProviderConfig> {
        match kind {
            ProviderKind::OpenAICompatible => &self.openai_compatible_llm,
            ProviderKind::Ollama => &self.ollama_llm,
            ProviderKind::OpenAI => &self.openai_llm,
            ProviderKind::Gemini => &self.gemini_llm,
            ProviderKind::Mistral => &self.mistral_llm,
            ProviderKind::Zhipu => &self.zhipu_llm,
            ProviderKind::Deepseek => &self.deepseek_llm,
            ProviderKind::Groq => &self.groq_llm,
            ProviderKind::Claude => &self.claude_llm,
            ProviderKind::LlamaCpp => &self.llama_cpp_llm,
        }
    }

    /// Mutable slot for a provider kind (used by env overrides).
    pub fn slot_mut(&mut self, kind: ProviderKind) -> &mut Option<RawProviderConfig> {
        match kind {
            ProviderKind::OpenAICompatible => &mut self.openai_compatible_llm,
            ProviderKind::Ollama => &mut self.ollama_llm,
            ProviderKind::OpenAI => &mut self.openai_llm,
            ProviderKind::Gemini => &mut self.gemini_llm,
            ProviderKind::Mistral => &mut self.mistral_llm,
            ProviderKind::Zhipu => &mut self.zhipu_llm,
            ProviderKind::Deepseek => &mut self.deepseek_llm,
            ProviderKind::Groq => &mut self.groq_llm,
            ProviderKind::Claude => &mut self.claude_llm,
            ProviderKind::LlamaCpp => &mut self.llama_cpp_llm,
        }
    }

    /// Kinds that have an entry in the document.
    pub fn configured(&self) -> Vec<ProviderKind> {
        PROVIDERS
            .iter()
            .map(|spec| spec.kind)
            .filter(|kind| self.get(*kind).is_some())
            .collect()
    }

    /// Validate the entry for `kind`, if there is one.
    pub fn build(&self, kind: ProviderKind) -> Option<Result<ProviderConfig, ConfigValidationError>> {
        self.get(kind).map(|raw| ProviderConfig::build(kind, raw))
    }

    /// The entry that backs the dispatch manager's default client.
    ///
    /// The first *present* entry in [`MANAGER_DEFAULT_PRIORITY`] wins; if it
    /// fails validation the error is returned rather than falling through.
    pub fn select_default(&self) -> Result<Option<ProviderConfig>, ConfigValidationError> {
        MANAGER_DEFAULT_PRIORITY
            .iter()
            .find_map(|kind| self.build(*kind))
            .transpose()
    }

    /// [`select_default`](Self::select_default) reduced to its
    /// OpenAI-compatible view.
    pub fn default_for_manager(&self) -> Result<Option<OpenAICompatibleConfig>, ConfigValidationError> {
        Ok(self
            .select_default()?
            .and_then(ProviderConfig::into_openai_compatible))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn configs(value: serde_json::Value) -> LlmConfigs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 12393);
        assert_eq!(config.server.request_timeout(), Duration::from_secs(120));
        assert!(config.llm_configs.configured().is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_value(json!({
            "server": { "port": 8080 }
        }))
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.bind_address(), "localhost:8080");
    }

    #[test]
    fn test_configured_lists_present_entries_in_spec_order() {
        let c = configs(json!({
            "groq_llm": { "model": "llama-3.3-70b" },
            "ollama_llm": { "model": "qwen2.5" }
        }));
        assert_eq!(c.configured(), vec![ProviderKind::Ollama, ProviderKind::Groq]);
    }

    #[test]
    fn test_select_default_prefers_openai_compatible() {
        let c = configs(json!({
            "openai_compatible_llm": { "base_url": "http://localhost:1234/v1", "model": "local" },
            "ollama_llm": { "base_url": "http://localhost:11434/v1", "model": "qwen2.5" },
            "openai_llm": { "model": "gpt-4o" }
        }));
        let selected = c.default_for_manager().unwrap().unwrap();
        assert_eq!(selected.model, "local");
    }

    #[test]
    fn test_select_default_falls_back_to_ollama_then_openai() {
        let c = configs(json!({
            "ollama_llm": { "base_url": "http://localhost:11434/v1", "model": "qwen2.5" },
            "openai_llm": { "model": "gpt-4o" }
        }));
        let selected = c.select_default().unwrap().unwrap();
        assert_eq!(selected.kind(), ProviderKind::Ollama);

        let c = configs(json!({ "openai_llm": { "model": "gpt-4o", "llm_api_key": "sk" } }));
        let selected = c.default_for_manager().unwrap().unwrap();
        assert_eq!(selected.base_url, "https://api.openai.com/v1");
        assert_eq!(selected.api_key.as_deref(), Some("sk"));
    }

    #[test]
    fn test_select_default_ignores_other_kinds() {
        let c = configs(json!({
            "groq_llm": { "model": "llama-3.3-70b" },
            "claude_llm": { "llm_api_key": "k", "model": "claude-3" }
        }));
        assert!(c.default_for_manager().unwrap().is_none());
    }

    #[test]
    fn test_select_default_reports_invalid_entry() {
        let c = configs(json!({
            "openai_compatible_llm": { "model": "local" },
            "openai_llm": { "model": "gpt-4o" }
        }));
        let err = c.default_for_manager().unwrap_err();
        assert!(matches!(
            err,
            ConfigValidationError::MissingField { field: "base_url", .. }
        ));
    }

    #[test]
    fn test_build_absent_kind_is_none() {
        assert!(LlmConfigs::default().build(ProviderKind::Gemini).is_none());
    }

    #[test]
    fn test_serialization_skips_absent_entries() {
        let c = configs(json!({ "deepseek_llm": { "model": "deepseek-chat" } }));
        let value = serde_json::to_value(&c).unwrap();
        assert!(value.get("deepseek_llm").is_some());
        assert!(value.get("openai_llm").is_none());
        assert!(value["deepseek_llm"].get("base_url").is_none());
    }

    #[test]
    fn test_malformed_server_section_keeps_llm_configs() {
        let config: Config = serde_json::from_value(json!({
            "server": { "port": "not-a-port" },
            "llm_configs": { "openai_llm": { "model": "gpt-4o", "llm_api_key": "sk" } }
        }))
        .unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert!(config.llm_configs.default_for_manager().unwrap().is_some());
    }

    #[test]
    fn test_malformed_unused_entry_does_not_affect_default() {
        let c = configs(json!({
            "openai_compatible_llm": {
                "base_url": "https://api.example.com/v1",
                "llm_api_key": "dk",
                "model": "gpt-x"
            },
            "groq_llm": { "model": "llama", "interrupt_method": "sideways" }
        }));
        let selected = c.default_for_manager().unwrap().unwrap();
        assert_eq!(selected.model, "gpt-x");
        assert!(matches!(
            c.build(ProviderKind::Groq),
            Some(Err(ConfigValidationError::InvalidField { field: "interrupt_method", .. }))
        ));
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }
}
