//! Configuration system — provider variants, document schema, loading, and
//! env var overrides.
//!
//! # Usage
//! ```no_run
//! use llmrelay_core::config;
//!
//! let cfg = config::load_config(None);
//! let default_llm = cfg.llm_configs.default_for_manager().unwrap();
//! println!("Default model: {:?}", default_llm.map(|c| c.model));
//! ```

pub mod loader;
pub mod provider;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, save_config};
pub use provider::{
    find_by_config_key, find_by_name, ClaudeConfig, ConfigValidationError, InterruptMethod,
    LlamaCppConfig, OllamaConfig, OpenAICompatibleConfig, ProviderConfig, ProviderKind,
    ProviderSpec, RawProviderConfig, PROVIDERS,
};
pub use schema::{Config, LlmConfigs, ServerConfig, MANAGER_DEFAULT_PRIORITY};
