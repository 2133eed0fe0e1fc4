//! `llmrelay init` — write a starter config.
//!
//! The starter document has one Ollama entry pointing at a local server, so
//! `llmrelay serve` works out of the box when Ollama is running.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use llmrelay_core::config::{get_config_path, save_config, Config, ProviderKind, RawProviderConfig};

use crate::helpers::mark;

/// Run the init command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    println!();
    println!("{}", "llmrelay — Setup".cyan().bold());
    println!();

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    if path.exists() {
        println!("  {} config already exists at {}", mark(true), path.display());
    } else {
        save_config(&starter_config(), Some(&path))
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("  {} created config at {}", mark(true), path.display());
    }

    println!();
    println!(
        "{}",
        "  Setup complete! Edit llm_configs, then run `llmrelay serve`.".green()
    );
    println!();
    Ok(())
}

/// Defaults plus a local Ollama entry.
pub fn starter_config() -> Config {
    let mut config = Config::default();
    *config.llm_configs.slot_mut(ProviderKind::Ollama) = Some(RawProviderConfig {
        base_url: Some("http://localhost:11434/v1".into()),
        model: Some("qwen2.5:latest".into()),
        keep_alive: Some(-1.0),
        unload_at_exit: Some(true),
        ..Default::default()
    });
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmrelay_core::config::load_config;

    #[test]
    fn test_starter_config_selects_ollama() {
        let config = starter_config();
        let selected = config.llm_configs.select_default().unwrap().unwrap();
        assert_eq!(selected.kind(), ProviderKind::Ollama);
    }

    #[test]
    fn test_init_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        run(Some(&path)).unwrap();
        assert!(path.exists());
        let loaded = load_config(Some(&path));
        assert!(loaded.llm_configs.get(ProviderKind::Ollama).is_some());

        std::fs::write(&path, "{}").unwrap();
        run(Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }
}
