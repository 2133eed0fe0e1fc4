//! Error taxonomy for client resolution and upstream calls.
//!
//! None of these cross the manager boundary: `generate_response` folds every
//! one of them into a reply string.

use thiserror::Error;

/// No caller credentials and no usable default configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("LLM client cannot be initialized: no default config and no user API key/base_url provided")]
pub struct ClientUnavailableError;

/// Failure reported by the transport or the provider.
#[derive(Debug, Error)]
pub enum UpstreamCallError {
    /// Connection, TLS, or timeout failure.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status (auth, rate limit, bad model, …).
    #[error("Error code: {status} - {body}")]
    Status { status: u16, body: String },

    /// 2xx with a body that is not a chat completion.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why no client/model pair could be resolved for a request.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no default client and no caller credentials")]
    NotConfigured,

    #[error(transparent)]
    ClientUnavailable(#[from] ClientUnavailableError),
}
