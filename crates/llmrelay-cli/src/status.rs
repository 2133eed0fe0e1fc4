//! `llmrelay status` — show config path, the selected default provider, and
//! the validation outcome of every configured entry.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use llmrelay_core::config::{get_config_path, load_config, ProviderConfig, PROVIDERS};

use crate::helpers::mark;

/// Run the status command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "llmrelay Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        path.display(),
        config_marker(&path)
    );
    println!(
        "  {:<18} {} | timeout: {}s",
        "Server:".bold(),
        config.server.bind_address(),
        config.server.request_timeout_secs
    );

    // Default selection
    let default = match config.llm_configs.select_default() {
        Ok(Some(selected)) => describe_default(&selected),
        Ok(None) => "· none (caller keys only)".dimmed().to_string(),
        Err(e) => format!("{} {}", mark(false), e),
    };
    println!("  {:<18} {}", "Default LLM:".bold(), default);

    // Entries
    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let status = match config.llm_configs.build(spec.kind) {
            None => "· not configured".dimmed().to_string(),
            Some(Ok(built)) => format!(
                "{} interrupt: {:?}",
                mark(true),
                built.interrupt_method()
            ),
            Some(Err(e)) => format!("{} {}", mark(false), e),
        };
        println!("    {:<20} {}", spec.display_name, status);
    }

    println!();
    Ok(())
}

fn describe_default(selected: &ProviderConfig) -> String {
    let name = selected.kind().spec().display_name;
    match selected.as_openai_compatible() {
        Some(c) => {
            let key = if c.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
                "key set".green().to_string()
            } else {
                "no key, degraded".yellow().to_string()
            };
            format!("{name} · {} @ {} ({key})", c.model, c.base_url)
        }
        None => name.to_string(),
    }
}

fn config_marker(path: &Path) -> String {
    if path.exists() {
        mark(true)
    } else {
        "(not found)".red().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_marker_uses_shared_mark() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(config_marker(file.path()), mark(true));
        assert!(config_marker(Path::new("/nonexistent/llmrelay.json")).contains("not found"));
    }

    #[test]
    fn test_status_runs_with_invalid_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"llm_configs":{"openai_compatible_llm":{"model":"m","interrupt_method":"sideways"}}}"#,
        )
        .unwrap();
        run(Some(&path)).unwrap();
    }
}
