//! Generic HTTP client for OpenAI-compatible chat-completion APIs.
//!
//! Covers every OpenAI-compatible provider kind (OpenAI, Ollama, Gemini,
//! Mistral, Zhipu, DeepSeek, Groq, OpenRouter, self-hosted servers).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, error, warn};

use llmrelay_core::config::OpenAICompatibleConfig;
use llmrelay_core::types::{ChatCompletionRequest, ChatCompletionResponse, Message};
use llmrelay_core::utils::truncate_string;

use crate::error::UpstreamCallError;
use crate::traits::{ChatClient, Completion};

// ─────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────

/// Build the pooled HTTP transport shared by every client of a manager.
///
/// The timeout bounds each upstream call end to end.
pub fn build_transport(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build HTTP client with timeout, falling back to defaults");
            reqwest::Client::new()
        })
}

// ─────────────────────────────────────────────
// HttpClient
// ─────────────────────────────────────────────

/// A credential + endpoint binding for one OpenAI-compatible API.
///
/// Holds no per-call state. The underlying `reqwest::Client` is a shared
/// connection pool; the credential stays with this binding and is attached
/// per request.
pub struct HttpClient {
    /// HTTP transport (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    base_url: String,
    /// API key for Bearer authentication, if any.
    api_key: Option<String>,
    /// Organization / project headers.
    extra_headers: HeaderMap,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl HttpClient {
    /// Bind a key and base URL to a transport.
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        HttpClient {
            client,
            base_url: base_url.into(),
            api_key,
            extra_headers: HeaderMap::new(),
        }
    }

    /// Bind a loaded provider config, including its organization/project ids.
    pub fn from_config(client: reqwest::Client, config: &OpenAICompatibleConfig) -> Self {
        let mut http = Self::new(client, config.base_url.clone(), config.api_key.clone());

        let ids = [
            ("openai-organization", config.organization_id.as_deref()),
            ("openai-project", config.project_id.as_deref()),
        ];
        for (name, value) in ids {
            let Some(value) = value else { continue };
            match HeaderValue::from_str(value) {
                Ok(val) => {
                    http.extra_headers.insert(name, val);
                }
                Err(_) => warn!("Invalid header value for {}", name),
            }
        }

        http
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl ChatClient for HttpClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<Completion, UpstreamCallError> {
        debug!(
            base_url = %self.base_url,
            model = %model,
            messages = messages.len(),
            "Calling LLM"
        );

        let body = ChatCompletionRequest { model, messages };

        let mut request = self
            .client
            .post(self.completions_url())
            .headers(self.extra_headers.clone())
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(base_url = %self.base_url, error = %e, "HTTP request failed");
            UpstreamCallError::Transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                base_url = %self.base_url,
                status = %status,
                body = %truncate_string(&body, 500),
                "API error"
            );
            return Err(UpstreamCallError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            error!(base_url = %self.base_url, error = %e, "Failed to parse LLM response");
            UpstreamCallError::Decode(e)
        })?;

        let completion = Completion::from(parsed);
        debug!(
            base_url = %self.base_url,
            has_content = matches!(completion, Completion::Message(Some(_))),
            "LLM response received"
        );
        Ok(completion)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
