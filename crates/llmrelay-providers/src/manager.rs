//! Client resolution and dispatch.
//!
//! [`LlmClientManager`] owns the long-lived default client built from the
//! loaded configuration. For every chat request it picks a client and a
//! model by a fixed priority, runs one completion, and folds every failure
//! into a reply string.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use llmrelay_core::config::OpenAICompatibleConfig;
use llmrelay_core::types::{ChatReply, ChatRequest, Message};

use crate::error::{ClientUnavailableError, ResolveError};
use crate::http_provider::{build_transport, HttpClient};
use crate::traits::{ChatClient, Completion};

/// Fixed endpoint for requests that carry their own OpenRouter key and model.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub const NOT_CONFIGURED: &str =
    "LLM client not configured. Please provide API key/model or check default configuration.";
pub const MODEL_NOT_DETERMINED: &str = "Model name not determined. Cannot generate response.";
pub const NO_CHOICES: &str = "Received no choices from LLM.";
pub const EMPTY_MESSAGE: &str = "Received an empty message from LLM.";
/// Reported as `{"error": ...}` when the server has no manager at all.
pub const NOT_INITIALIZED: &str = "LLM Client Manager not initialized.";

/// Upstream failure text, embedding the error's display form.
pub fn error_reply(details: impl std::fmt::Display) -> String {
    format!("Sorry, I encountered an error: {details}")
}

// ─────────────────────────────────────────────
// Options & resolution result
// ─────────────────────────────────────────────

/// Construction-time knobs for [`LlmClientManager`].
#[derive(Clone, Debug)]
pub struct ManagerOptions {
    /// Timeout applied to every upstream call.
    pub request_timeout: Duration,
    /// Endpoint used when the caller supplies both key and model.
    pub openrouter_base_url: String,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            openrouter_base_url: OPENROUTER_BASE_URL.to_string(),
        }
    }
}

/// Which rule of the resolution policy served a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Caller key and model, sent to OpenRouter.
    OpenRouter,
    /// Caller key against the default configuration's endpoint.
    UserKey,
    /// The cached default client.
    Default,
}

/// A client/model pair picked for one request.
pub struct Resolution {
    pub client: Arc<dyn ChatClient>,
    /// `None` when no rule could name a model.
    pub model: Option<String>,
    pub route: Route,
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("base_url", &self.client.base_url())
            .field("model", &self.model)
            .field("route", &self.route)
            .finish()
    }
}

// ─────────────────────────────────────────────
// LlmClientManager
// ─────────────────────────────────────────────

/// Resolves chat requests to upstream clients and runs them.
///
/// Build one per process and share it (`Arc<LlmClientManager>`). State is
/// fixed at construction; every method takes `&self`, so concurrent
/// requests never contend. Clients built from caller credentials live for
/// one request and are never cached.
pub struct LlmClientManager {
    default_config: Option<OpenAICompatibleConfig>,
    default_client: Option<Arc<dyn ChatClient>>,
    default_model: Option<String>,
    /// Connection pool shared by the default and per-request clients.
    transport: reqwest::Client,
    openrouter_base_url: String,
}

impl LlmClientManager {
    /// Create a manager around an optional default configuration.
    ///
    /// The default client is built only when the configuration has both a
    /// non-empty API key and base URL. Otherwise the manager runs degraded
    /// and serves only requests that bring their own key.
    pub fn new(config: Option<OpenAICompatibleConfig>, options: ManagerOptions) -> Self {
        let transport = build_transport(options.request_timeout);

        let mut default_client: Option<Arc<dyn ChatClient>> = None;
        let mut default_model = None;

        match &config {
            Some(cfg) if non_empty(cfg.api_key.as_deref()).is_some() && !cfg.base_url.is_empty() => {
                default_client = Some(Arc::new(HttpClient::from_config(transport.clone(), cfg)));
                default_model = Some(cfg.model.clone());
                info!(
                    base_url = %cfg.base_url,
                    model = %cfg.model,
                    "Default LLM client initialized from config"
                );
            }
            Some(cfg) => {
                warn!(
                    base_url = %cfg.base_url,
                    "Default LLM config has no API key; only requests with their own key will be served"
                );
            }
            None => {
                warn!("No default LLM config; only requests with their own key will be served");
            }
        }

        Self {
            default_config: config,
            default_client,
            default_model,
            transport,
            openrouter_base_url: options.openrouter_base_url,
        }
    }

    // ── Accessors ──

    pub fn default_config(&self) -> Option<&OpenAICompatibleConfig> {
        self.default_config.as_ref()
    }

    pub fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    pub fn has_default_client(&self) -> bool {
        self.default_client.is_some()
    }

    /// The shared connection pool (also used for Ollama lifecycle calls).
    pub fn transport(&self) -> &reqwest::Client {
        &self.transport
    }

    // ── Resolution ──

    /// Pick a client for the given caller credentials.
    ///
    /// 1. key and base URL: a fresh client bound to both
    /// 2. key only, with a default config: a fresh client on the default's base URL
    /// 3. a default client exists: that client, shared
    /// 4. otherwise [`ClientUnavailableError`]
    ///
    /// Empty strings count as absent.
    pub fn acquire_client(
        &self,
        user_api_key: Option<&str>,
        user_base_url: Option<&str>,
    ) -> Result<Arc<dyn ChatClient>, ClientUnavailableError> {
        let user_api_key = non_empty(user_api_key);
        let user_base_url = non_empty(user_base_url);

        match (user_api_key, user_base_url, &self.default_config) {
            (Some(key), Some(base_url), _) => {
                debug!(base_url = %base_url, "Using caller API key and base URL");
                Ok(self.ephemeral(base_url, key))
            }
            (Some(key), None, Some(cfg)) if !cfg.base_url.is_empty() => {
                debug!(base_url = %cfg.base_url, "Using caller API key with default base URL");
                Ok(self.ephemeral(&cfg.base_url, key))
            }
            _ => match &self.default_client {
                Some(client) => {
                    debug!("Using default client from configuration");
                    Ok(Arc::clone(client))
                }
                None => Err(ClientUnavailableError),
            },
        }
    }

    fn ephemeral(&self, base_url: &str, api_key: &str) -> Arc<dyn ChatClient> {
        Arc::new(HttpClient::new(
            self.transport.clone(),
            base_url,
            Some(api_key.to_string()),
        ))
    }

    /// Choose client and model for one request. Performs no I/O.
    ///
    /// Rules, first match wins:
    /// 1. caller key and model name: OpenRouter with the caller's model
    /// 2. caller key: default endpoint; model from override, caller name, then default
    /// 3. default client with a default model: model from override, then default
    pub fn resolve(
        &self,
        model_override: Option<&str>,
        user_api_key: Option<&str>,
        user_model_name: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let model_override = non_empty(model_override);
        let user_api_key = non_empty(user_api_key);
        let user_model_name = non_empty(user_model_name);

        if let (Some(key), Some(model)) = (user_api_key, user_model_name) {
            let client = self.acquire_client(Some(key), Some(self.openrouter_base_url.as_str()))?;
            return Ok(Resolution {
                client,
                model: Some(model.to_string()),
                route: Route::OpenRouter,
            });
        }

        if let Some(key) = user_api_key {
            let default_base_url = self.default_config.as_ref().map(|c| c.base_url.as_str());
            let client = self.acquire_client(Some(key), default_base_url)?;
            let model = model_override
                .or(user_model_name)
                .or(self.default_model.as_deref())
                .map(str::to_string);
            return Ok(Resolution {
                client,
                model,
                route: Route::UserKey,
            });
        }

        if let (Some(client), Some(default_model)) = (&self.default_client, &self.default_model) {
            let model = model_override.unwrap_or(default_model);
            return Ok(Resolution {
                client: Arc::clone(client),
                model: Some(model.to_string()),
                route: Route::Default,
            });
        }

        Err(ResolveError::NotConfigured)
    }

    // ── Dispatch ──

    /// Run one chat completion. Never fails: every outcome is a string.
    pub async fn generate_response(
        &self,
        messages: &[Message],
        model_override: Option<&str>,
        user_api_key: Option<&str>,
        user_model_name: Option<&str>,
    ) -> String {
        let resolution = match self.resolve(model_override, user_api_key, user_model_name) {
            Ok(r) => r,
            Err(e) => {
                warn!(reason = %e, "No LLM client for request");
                return NOT_CONFIGURED.to_string();
            }
        };

        let Some(model) = resolution.model.as_deref() else {
            warn!(route = ?resolution.route, "No model name for request");
            return MODEL_NOT_DETERMINED.to_string();
        };

        info!(
            route = ?resolution.route,
            model = %model,
            base_url = %resolution.client.base_url(),
            "Generating response"
        );

        match resolution.client.complete(model, messages).await {
            Ok(Completion::NoChoices) => NO_CHOICES.to_string(),
            Ok(Completion::Message(Some(content))) if !content.is_empty() => content,
            Ok(Completion::Message(_)) => EMPTY_MESSAGE.to_string(),
            Err(e) => {
                error!(
                    base_url = %resolution.client.base_url(),
                    model = %model,
                    error = %e,
                    "LLM API call failed"
                );
                error_reply(e)
            }
        }
    }

    /// Body of `POST /api/chat`: history plus the new turn, caller
    /// credentials from the request.
    pub async fn handle_chat(&self, request: ChatRequest) -> ChatReply {
        let api_key = request.open_router_api_key.clone();
        let model_name = request.open_router_model_name.clone();
        let messages = request.into_messages();

        let text = self
            .generate_response(&messages, None, api_key.as_deref(), model_name.as_deref())
            .await;
        ChatReply::response(text)
    }
}

impl std::fmt::Debug for LlmClientManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClientManager")
            .field("default_config", &self.default_config)
            .field("default_model", &self.default_model)
            .field("has_default_client", &self.default_client.is_some())
            .field("openrouter_base_url", &self.openrouter_base_url)
            .finish()
    }
}

/// Dispatch a chat request, reporting a missing manager as an error reply.
pub async fn dispatch_chat(manager: Option<&LlmClientManager>, request: ChatRequest) -> ChatReply {
    match manager {
        Some(m) => m.handle_chat(request).await,
        None => {
            error!("Chat request received before the LLM client manager was initialized");
            ChatReply::error(NOT_INITIALIZED)
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
