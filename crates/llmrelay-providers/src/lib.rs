//! LLM client layer for llmrelay.
//!
//! # Architecture
//!
//! - [`traits::ChatClient`] — one chat completion against one endpoint
//! - [`http_provider::HttpClient`] — OpenAI-compatible HTTP implementation
//! - [`manager::LlmClientManager`] — picks client + model per request and
//!   turns every outcome into a reply string
//! - [`ollama`] — model preload/unload for Ollama backends

pub mod error;
pub mod http_provider;
pub mod manager;
pub mod ollama;
pub mod traits;

pub use error::{ClientUnavailableError, ResolveError, UpstreamCallError};
pub use http_provider::{build_transport, HttpClient};
pub use manager::{dispatch_chat, LlmClientManager, ManagerOptions, Resolution, Route};
pub use traits::{ChatClient, Completion};
