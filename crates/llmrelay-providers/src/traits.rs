//! Chat client trait — the seam between dispatch and transport.
//!
//! `HttpClient` in `http_provider.rs` covers every OpenAI-compatible API.

use async_trait::async_trait;
use llmrelay_core::types::{ChatCompletionResponse, Message};

use crate::error::UpstreamCallError;

/// First choice of a chat completion, reduced to what dispatch needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The provider returned zero choices.
    NoChoices,
    /// Content of the first choice's message (`None` when absent or null).
    Message(Option<String>),
}

impl From<ChatCompletionResponse> for Completion {
    fn from(resp: ChatCompletionResponse) -> Self {
        match resp.choices.unwrap_or_default().into_iter().next() {
            Some(choice) => Completion::Message(choice.message.and_then(|m| m.content)),
            None => Completion::NoChoices,
        }
    }
}

/// A credential + endpoint binding able to run one chat completion.
///
/// Implementations hold connection configuration only, so a shared instance
/// is safe to use from concurrent requests.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Run one non-streaming chat completion.
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<Completion, UpstreamCallError>;

    /// Endpoint this client talks to, for logging.
    fn base_url(&self) -> &str;
}
