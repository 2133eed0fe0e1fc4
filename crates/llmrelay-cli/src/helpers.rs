//! Shared CLI helpers — path expansion, reply printing, version banner.

use std::path::PathBuf;

use colored::Colorize;

use llmrelay_core::types::ChatReply;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print a chat reply to stdout.
pub fn print_reply(reply: &ChatReply) {
    println!();
    match reply {
        ChatReply::Response { response } => {
            println!("{}", "llmrelay".cyan().bold());
            if response.is_empty() {
                println!("{}", "(no response)".dimmed());
            } else {
                println!("{response}");
            }
        }
        ChatReply::Error { error } => {
            println!("{} {}", "✗".red().bold(), error.red());
        }
    }
    println!();
}

/// Print the banner shown when the server starts.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "llmrelay".cyan().bold(), version.dimmed());
    println!();
}

/// `✓` / `✗` marker.
pub fn mark(ok: bool) -> String {
    if ok {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
