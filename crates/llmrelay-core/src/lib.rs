//! Core crate for llmrelay.
//!
//! - [`config`] — provider variant schema, the configuration document, loader
//! - [`types`] — chat messages plus the OpenAI-compatible wire format
//! - [`utils`] — data directory and string helpers

pub mod config;
pub mod types;
pub mod utils;
