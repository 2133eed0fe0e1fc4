//! Provider configuration variants.
//!
//! Every supported upstream is one [`ProviderKind`]. Its static
//! [`ProviderSpec`] row fixes the defaults (base URL, interrupt method,
//! placeholder key) that get substituted when a [`RawProviderConfig`] read
//! from disk is turned into a typed [`ProviderConfig`].

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::types::Message;

// ─────────────────────────────────────────────
// Interrupt method
// ─────────────────────────────────────────────

/// Channel used to inject an interruption signal into the conversation.
///
/// Providers that accept a system prompt anywhere in the history use
/// `System`; the rest need the note disguised as a `User` turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterruptMethod {
    System,
    User,
}

impl InterruptMethod {
    /// Build the message that carries an interruption note.
    pub fn signal_message(self, text: impl Into<String>) -> Message {
        match self {
            InterruptMethod::System => Message::system(text),
            InterruptMethod::User => Message::user(text),
        }
    }
}

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider kind
// ─────────────────────────────────────────────

/// The closed set of provider variants.
///
/// Declaration order matches [`PROVIDERS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAICompatible,
    Ollama,
    OpenAI,
    Gemini,
    Mistral,
    Zhipu,
    Deepseek,
    Groq,
    Claude,
    LlamaCpp,
}

impl ProviderKind {
    /// The static spec row for this kind.
    pub fn spec(self) -> &'static ProviderSpec {
        &PROVIDERS[self as usize]
    }
}

/// Static specification of one provider kind.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    /// Internal name (e.g. `"ollama"`).
    pub name: &'static str,
    /// Key under `llm_configs` in the config document (e.g. `"ollama_llm"`).
    pub config_key: &'static str,
    /// Human-readable name for logs.
    pub display_name: &'static str,
    /// Base URL used when the document leaves `base_url` out.
    pub default_base_url: Option<&'static str>,
    pub default_interrupt_method: InterruptMethod,
    /// API key used when the document leaves `llm_api_key` out.
    pub default_api_key: Option<&'static str>,
}

/// All provider kinds, in [`ProviderKind`] declaration order.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        kind: ProviderKind::OpenAICompatible,
        name: "openai_compatible",
        config_key: "openai_compatible_llm",
        display_name: "OpenAI-compatible",
        default_base_url: None,
        default_interrupt_method: InterruptMethod::User,
        default_api_key: None,
    },
    ProviderSpec {
        kind: ProviderKind::Ollama,
        name: "ollama",
        config_key: "ollama_llm",
        display_name: "Ollama",
        default_base_url: None,
        default_interrupt_method: InterruptMethod::System,
        default_api_key: Some("default_api_key"),
    },
    ProviderSpec {
        kind: ProviderKind::OpenAI,
        name: "openai",
        config_key: "openai_llm",
        display_name: "OpenAI",
        default_base_url: Some("https://api.openai.com/v1"),
        default_interrupt_method: InterruptMethod::System,
        default_api_key: None,
    },
    ProviderSpec {
        kind: ProviderKind::Gemini,
        name: "gemini",
        config_key: "gemini_llm",
        display_name: "Gemini",
        default_base_url: Some("https://generativelanguage.googleapis.com/v1beta/openai/"),
        default_interrupt_method: InterruptMethod::User,
        default_api_key: None,
    },
    ProviderSpec {
        kind: ProviderKind::Mistral,
        name: "mistral",
        config_key: "mistral_llm",
        display_name: "Mistral",
        default_base_url: Some("https://api.mistral.ai/v1"),
        default_interrupt_method: InterruptMethod::User,
        default_api_key: None,
    },
    ProviderSpec {
        kind: ProviderKind::Zhipu,
        name: "zhipu",
        config_key: "zhipu_llm",
        display_name: "Zhipu",
        default_base_url: Some("https://open.bigmodel.cn/api/paas/v4/"),
        default_interrupt_method: InterruptMethod::System,
        default_api_key: None,
    },
    ProviderSpec {
        kind: ProviderKind::Deepseek,
        name: "deepseek",
        config_key: "deepseek_llm",
        display_name: "DeepSeek",
        default_base_url: Some("https://api.deepseek.com/v1"),
        default_interrupt_method: InterruptMethod::System,
        default_api_key: None,
    },
    ProviderSpec {
        kind: ProviderKind::Groq,
        name: "groq",
        config_key: "groq_llm",
        display_name: "Groq",
        default_base_url: Some("https://api.groq.com/openai/v1"),
        default_interrupt_method: InterruptMethod::System,
        default_api_key: None,
    },
    ProviderSpec {
        kind: ProviderKind::Claude,
        name: "claude",
        config_key: "claude_llm",
        display_name: "Claude",
        default_base_url: Some("https://api.anthropic.com"),
        default_interrupt_method: InterruptMethod::User,
        default_api_key: None,
    },
    ProviderSpec {
        kind: ProviderKind::LlamaCpp,
        name: "llama_cpp",
        config_key: "llama_cpp_llm",
        display_name: "llama.cpp",
        default_base_url: None,
        default_interrupt_method: InterruptMethod::System,
        default_api_key: None,
    },
];

/// Find a provider spec by internal name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

/// Find a provider spec by its `llm_configs` key.
pub fn find_by_config_key(key: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.config_key == key)
}

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// A provider entry that cannot be turned into a usable configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{provider}: missing required field `{field}`")]
    MissingField {
        provider: &'static str,
        field: &'static str,
    },
    #[error("{provider}: invalid value for `{field}`: {reason}")]
    InvalidField {
        provider: &'static str,
        field: &'static str,
        reason: String,
    },
    #[error("{provider}: invalid base_url '{value}': {reason}")]
    InvalidUrl {
        provider: &'static str,
        value: String,
        reason: String,
    },
}

// ─────────────────────────────────────────────
// On-disk shape
// ─────────────────────────────────────────────

/// One provider entry as written in the config document.
///
/// Every field is optional here; defaults and required-field checks are
/// applied by [`ProviderConfig::build`]. Deserialization never fails on a
/// malformed field: the field is left unset and recorded in `rejected`, so
/// one bad entry cannot take the rest of the document down with it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RawProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupt_method: Option<InterruptMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Ollama only: seconds to keep the model loaded, -1 for indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<f64>,
    /// Ollama only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unload_at_exit: Option<bool>,
    /// llama.cpp only: path to the GGUF model file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
    /// Fields present in the document that could not be read, with the reason.
    #[serde(skip)]
    pub rejected: Vec<(&'static str, String)>,
}

impl<'de> Deserialize<'de> for RawProviderConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(value))
    }
}

impl RawProviderConfig {
    /// Read an entry field by field. Unknown keys are ignored.
    pub fn from_value(value: Value) -> Self {
        let mut raw = RawProviderConfig::default();
        let mut map = match value {
            Value::Object(map) => map,
            Value::Null => return raw,
            other => {
                raw.rejected
                    .push(("entry", format!("expected a mapping, found {other}")));
                return raw;
            }
        };

        let api_key = map.remove("llm_api_key").or_else(|| map.remove("api_key"));
        raw.llm_api_key = field(&mut raw.rejected, "llm_api_key", api_key);
        raw.interrupt_method = take(&mut map, &mut raw.rejected, "interrupt_method");
        raw.base_url = take(&mut map, &mut raw.rejected, "base_url");
        raw.model = take(&mut map, &mut raw.rejected, "model");
        raw.organization_id = take(&mut map, &mut raw.rejected, "organization_id");
        raw.project_id = take(&mut map, &mut raw.rejected, "project_id");
        raw.temperature = take(&mut map, &mut raw.rejected, "temperature");
        raw.keep_alive = take(&mut map, &mut raw.rejected, "keep_alive");
        raw.unload_at_exit = take(&mut map, &mut raw.rejected, "unload_at_exit");
        raw.model_path = take(&mut map, &mut raw.rejected, "model_path");
        raw
    }
}

fn take<T: DeserializeOwned>(
    map: &mut Map<String, Value>,
    rejected: &mut Vec<(&'static str, String)>,
    name: &'static str,
) -> Option<T> {
    field(rejected, name, map.remove(name))
}

fn field<T: DeserializeOwned>(
    rejected: &mut Vec<(&'static str, String)>,
    name: &'static str,
    value: Option<Value>,
) -> Option<T> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => match serde_json::from_value(v) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                rejected.push((name, e.to_string()));
                None
            }
        },
    }
}

// ─────────────────────────────────────────────
// Typed variants
// ─────────────────────────────────────────────

/// Settings shared by every OpenAI-compatible provider.
#[derive(Clone, PartialEq)]
pub struct OpenAICompatibleConfig {
    pub interrupt_method: InterruptMethod,
    pub base_url: String,
    /// `None` means no credential at all, which is not the same as `Some("")`.
    pub api_key: Option<String>,
    pub model: String,
    pub organization_id: Option<String>,
    pub project_id: Option<String>,
    pub temperature: f64,
}

impl OpenAICompatibleConfig {
    /// Minimal config with the generic provider's defaults.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            interrupt_method: ProviderKind::OpenAICompatible
                .spec()
                .default_interrupt_method,
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
            organization_id: None,
            project_id: None,
            temperature: 1.0,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl fmt::Debug for OpenAICompatibleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAICompatibleConfig")
            .field("interrupt_method", &self.interrupt_method)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("organization_id", &self.organization_id)
            .field("project_id", &self.project_id)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Ollama: OpenAI-compatible plus model residency controls.
#[derive(Clone, Debug, PartialEq)]
pub struct OllamaConfig {
    pub base: OpenAICompatibleConfig,
    pub keep_alive: f64,
    pub unload_at_exit: bool,
}

/// Anthropic's native API — not OpenAI-compatible.
#[derive(Clone, PartialEq)]
pub struct ClaudeConfig {
    pub interrupt_method: InterruptMethod,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("interrupt_method", &self.interrupt_method)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Local llama.cpp inference.
#[derive(Clone, Debug, PartialEq)]
pub struct LlamaCppConfig {
    pub interrupt_method: InterruptMethod,
    pub model_path: String,
}

/// A validated provider configuration, one variant per [`ProviderKind`].
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderConfig {
    OpenAICompatible(OpenAICompatibleConfig),
    Ollama(OllamaConfig),
    OpenAI(OpenAICompatibleConfig),
    Gemini(OpenAICompatibleConfig),
    Mistral(OpenAICompatibleConfig),
    Zhipu(OpenAICompatibleConfig),
    Deepseek(OpenAICompatibleConfig),
    Groq(OpenAICompatibleConfig),
    Claude(ClaudeConfig),
    LlamaCpp(LlamaCppConfig),
}

impl ProviderConfig {
    /// Apply the kind's defaults to `raw` and check its required fields.
    pub fn build(kind: ProviderKind, raw: &RawProviderConfig) -> Result<Self, ConfigValidationError> {
        let spec = kind.spec();
        if let Some((field, reason)) = raw.rejected.first() {
            return Err(ConfigValidationError::InvalidField {
                provider: spec.name,
                field,
                reason: reason.clone(),
            });
        }
        let interrupt_method = raw
            .interrupt_method
            .unwrap_or(spec.default_interrupt_method);

        let config = match kind {
            ProviderKind::OpenAICompatible => {
                Self::OpenAICompatible(openai_compatible(spec, raw, interrupt_method)?)
            }
            ProviderKind::Ollama => Self::Ollama(OllamaConfig {
                base: openai_compatible(spec, raw, interrupt_method)?,
                keep_alive: raw.keep_alive.unwrap_or(-1.0),
                unload_at_exit: raw.unload_at_exit.unwrap_or(true),
            }),
            ProviderKind::OpenAI => Self::OpenAI(openai_compatible(spec, raw, interrupt_method)?),
            ProviderKind::Gemini => Self::Gemini(openai_compatible(spec, raw, interrupt_method)?),
            ProviderKind::Mistral => Self::Mistral(openai_compatible(spec, raw, interrupt_method)?),
            ProviderKind::Zhipu => Self::Zhipu(openai_compatible(spec, raw, interrupt_method)?),
            ProviderKind::Deepseek => {
                Self::Deepseek(openai_compatible(spec, raw, interrupt_method)?)
            }
            ProviderKind::Groq => Self::Groq(openai_compatible(spec, raw, interrupt_method)?),
            ProviderKind::Claude => Self::Claude(ClaudeConfig {
                interrupt_method,
                base_url: base_url(spec, raw)?,
                api_key: raw.llm_api_key.clone().ok_or(ConfigValidationError::MissingField {
                    provider: spec.name,
                    field: "llm_api_key",
                })?,
                model: required(spec, "model", raw.model.as_deref())?,
            }),
            ProviderKind::LlamaCpp => Self::LlamaCpp(LlamaCppConfig {
                interrupt_method,
                model_path: required(spec, "model_path", raw.model_path.as_deref())?,
            }),
        };
        Ok(config)
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAICompatible(_) => ProviderKind::OpenAICompatible,
            Self::Ollama(_) => ProviderKind::Ollama,
            Self::OpenAI(_) => ProviderKind::OpenAI,
            Self::Gemini(_) => ProviderKind::Gemini,
            Self::Mistral(_) => ProviderKind::Mistral,
            Self::Zhipu(_) => ProviderKind::Zhipu,
            Self::Deepseek(_) => ProviderKind::Deepseek,
            Self::Groq(_) => ProviderKind::Groq,
            Self::Claude(_) => ProviderKind::Claude,
            Self::LlamaCpp(_) => ProviderKind::LlamaCpp,
        }
    }

    pub fn interrupt_method(&self) -> InterruptMethod {
        match self {
            Self::Claude(c) => c.interrupt_method,
            Self::LlamaCpp(c) => c.interrupt_method,
            other => other
                .as_openai_compatible()
                .map(|c| c.interrupt_method)
                .unwrap_or(other.kind().spec().default_interrupt_method),
        }
    }

    /// The OpenAI-compatible view of this config, if it has one.
    pub fn as_openai_compatible(&self) -> Option<&OpenAICompatibleConfig> {
        match self {
            Self::OpenAICompatible(c)
            | Self::OpenAI(c)
            | Self::Gemini(c)
            | Self::Mistral(c)
            | Self::Zhipu(c)
            | Self::Deepseek(c)
            | Self::Groq(c) => Some(c),
            Self::Ollama(o) => Some(&o.base),
            Self::Claude(_) | Self::LlamaCpp(_) => None,
        }
    }

    pub fn into_openai_compatible(self) -> Option<OpenAICompatibleConfig> {
        match self {
            Self::OpenAICompatible(c)
            | Self::OpenAI(c)
            | Self::Gemini(c)
            | Self::Mistral(c)
            | Self::Zhipu(c)
            | Self::Deepseek(c)
            | Self::Groq(c) => Some(c),
            Self::Ollama(o) => Some(o.base),
            Self::Claude(_) | Self::LlamaCpp(_) => None,
        }
    }
}

fn openai_compatible(
    spec: &ProviderSpec,
    raw: &RawProviderConfig,
    interrupt_method: InterruptMethod,
) -> Result<OpenAICompatibleConfig, ConfigValidationError> {
    Ok(OpenAICompatibleConfig {
        interrupt_method,
        base_url: base_url(spec, raw)?,
        api_key: raw
            .llm_api_key
            .clone()
            .or_else(|| spec.default_api_key.map(String::from)),
        model: required(spec, "model", raw.model.as_deref())?,
        organization_id: raw.organization_id.clone(),
        project_id: raw.project_id.clone(),
        temperature: raw.temperature.unwrap_or(1.0),
    })
}

/// A field that must be present and non-blank.
fn required(
    spec: &ProviderSpec,
    field: &'static str,
    value: Option<&str>,
) -> Result<String, ConfigValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigValidationError::MissingField {
            provider: spec.name,
            field,
        }),
    }
}

/// Configured base URL, else the kind's default; must be absolute http(s).
fn base_url(spec: &ProviderSpec, raw: &RawProviderConfig) -> Result<String, ConfigValidationError> {
    let value = raw
        .base_url
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or(spec.default_base_url)
        .ok_or(ConfigValidationError::MissingField {
            provider: spec.name,
            field: "base_url",
        })?;

    let parsed = Url::parse(value).map_err(|e| ConfigValidationError::InvalidUrl {
        provider: spec.name,
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigValidationError::InvalidUrl {
            provider: spec.name,
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(value.to_string())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(model: &str) -> RawProviderConfig {
        RawProviderConfig {
            model: Some(model.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_spec_table_matches_kind_order() {
        for (i, spec) in PROVIDERS.iter().enumerate() {
            assert_eq!(spec.kind as usize, i, "{} out of order", spec.name);
            assert_eq!(spec.kind.spec().name, spec.name);
        }
        assert_eq!(PROVIDERS.len(), 10);
    }

    #[test]
    fn test_find_by_name_and_key() {
        assert_eq!(find_by_name("groq").unwrap().kind, ProviderKind::Groq);
        assert_eq!(
            find_by_config_key("llama_cpp_llm").unwrap().kind,
            ProviderKind::LlamaCpp
        );
        assert!(find_by_name("nonexistent").is_none());
    }

    #[test]
    fn test_openai_default_base_url() {
        let config = ProviderConfig::build(ProviderKind::OpenAI, &raw("gpt-4o")).unwrap();
        let c = config.as_openai_compatible().unwrap();
        assert_eq!(c.base_url, "https://api.openai.com/v1");
        assert_eq!(c.interrupt_method, InterruptMethod::System);
        assert_eq!(c.temperature, 1.0);
        assert!(c.api_key.is_none());
    }

    #[test]
    fn test_configured_base_url_overrides_default() {
        let mut r = raw("mistral-large");
        r.base_url = Some("https://proxy.example.com/v1".into());
        let config = ProviderConfig::build(ProviderKind::Mistral, &r).unwrap();
        assert_eq!(
            config.as_openai_compatible().unwrap().base_url,
            "https://proxy.example.com/v1"
        );
    }

    #[test]
    fn test_default_interrupt_methods() {
        let expected = [
            (ProviderKind::OpenAI, InterruptMethod::System),
            (ProviderKind::Gemini, InterruptMethod::User),
            (ProviderKind::Mistral, InterruptMethod::User),
            (ProviderKind::Zhipu, InterruptMethod::System),
            (ProviderKind::Deepseek, InterruptMethod::System),
            (ProviderKind::Groq, InterruptMethod::System),
        ];
        for (kind, method) in expected {
            let config = ProviderConfig::build(kind, &raw("m")).unwrap();
            assert_eq!(config.interrupt_method(), method, "{kind:?}");
            assert_eq!(config.kind(), kind);
        }
    }

    #[test]
    fn test_interrupt_method_override() {
        let mut r = raw("gpt-4o");
        r.interrupt_method = Some(InterruptMethod::User);
        let config = ProviderConfig::build(ProviderKind::OpenAI, &r).unwrap();
        assert_eq!(config.interrupt_method(), InterruptMethod::User);
    }

    #[test]
    fn test_generic_requires_base_url() {
        let err = ProviderConfig::build(ProviderKind::OpenAICompatible, &raw("m")).unwrap_err();
        assert_eq!(
            err,
            ConfigValidationError::MissingField {
                provider: "openai_compatible",
                field: "base_url"
            }
        );
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_missing_model_is_rejected() {
        let err = ProviderConfig::build(ProviderKind::OpenAI, &RawProviderConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigValidationError::MissingField { field: "model", .. }
        ));
    }

    #[test]
    fn test_blank_model_is_rejected() {
        let err = ProviderConfig::build(ProviderKind::Groq, &raw("   ")).unwrap_err();
        assert!(matches!(
            err,
            ConfigValidationError::MissingField { field: "model", .. }
        ));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let mut r = raw("m");
        r.base_url = Some("not a url".into());
        let err = ProviderConfig::build(ProviderKind::OpenAICompatible, &r).unwrap_err();
        assert!(matches!(err, ConfigValidationError::InvalidUrl { .. }));
    }

    #[test]
    fn test_non_http_scheme_is_rejected() {
        let mut r = raw("m");
        r.base_url = Some("localhost:11434".into());
        let err = ProviderConfig::build(ProviderKind::Ollama, &r).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_ollama_defaults() {
        let mut r = raw("qwen2.5:latest");
        r.base_url = Some("http://localhost:11434/v1".into());
        let config = ProviderConfig::build(ProviderKind::Ollama, &r).unwrap();
        let ProviderConfig::Ollama(ollama) = config else {
            panic!("expected ollama variant");
        };
        assert_eq!(ollama.base.api_key.as_deref(), Some("default_api_key"));
        assert_eq!(ollama.keep_alive, -1.0);
        assert!(ollama.unload_at_exit);
        assert_eq!(ollama.base.interrupt_method, InterruptMethod::System);
    }

    #[test]
    fn test_absent_and_empty_api_key_are_distinct() {
        let mut r = raw("m");
        r.base_url = Some("http://localhost:1234/v1".into());
        let absent = ProviderConfig::build(ProviderKind::OpenAICompatible, &r).unwrap();
        assert_eq!(absent.as_openai_compatible().unwrap().api_key, None);

        r.llm_api_key = Some(String::new());
        let empty = ProviderConfig::build(ProviderKind::OpenAICompatible, &r).unwrap();
        assert_eq!(
            empty.as_openai_compatible().unwrap().api_key.as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_temperature_passes_through_unvalidated() {
        let mut r = raw("gpt-4o");
        r.temperature = Some(7.5);
        let config = ProviderConfig::build(ProviderKind::OpenAI, &r).unwrap();
        assert_eq!(config.as_openai_compatible().unwrap().temperature, 7.5);
    }

    #[test]
    fn test_claude_requires_api_key() {
        let err = ProviderConfig::build(ProviderKind::Claude, &raw("claude-3-haiku")).unwrap_err();
        assert_eq!(
            err,
            ConfigValidationError::MissingField {
                provider: "claude",
                field: "llm_api_key"
            }
        );

        let mut r = raw("claude-3-haiku");
        r.llm_api_key = Some("sk-ant".into());
        let config = ProviderConfig::build(ProviderKind::Claude, &r).unwrap();
        assert!(config.as_openai_compatible().is_none());
        assert_eq!(config.interrupt_method(), InterruptMethod::User);
        let ProviderConfig::Claude(claude) = config else {
            panic!("expected claude variant");
        };
        assert_eq!(claude.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_llama_cpp_requires_model_path() {
        let err =
            ProviderConfig::build(ProviderKind::LlamaCpp, &RawProviderConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigValidationError::MissingField { field: "model_path", .. }
        ));

        let r = RawProviderConfig {
            model_path: Some("/models/llama.gguf".into()),
            ..Default::default()
        };
        let config = ProviderConfig::build(ProviderKind::LlamaCpp, &r).unwrap();
        assert_eq!(config.interrupt_method(), InterruptMethod::System);
        assert!(config.into_openai_compatible().is_none());
    }

    #[test]
    fn test_malformed_field_is_reported_by_name() {
        let r: RawProviderConfig = serde_json::from_value(serde_json::json!({
            "model": "llama-3.3-70b",
            "interrupt_method": "sideways",
            "temperature": 0.2
        }))
        .unwrap();
        assert!(r.interrupt_method.is_none());
        assert_eq!(r.temperature, Some(0.2));
        assert_eq!(r.model.as_deref(), Some("llama-3.3-70b"));

        let err = ProviderConfig::build(ProviderKind::Groq, &r).unwrap_err();
        match err {
            ConfigValidationError::InvalidField {
                provider, field, ..
            } => {
                assert_eq!(provider, "groq");
                assert_eq!(field, "interrupt_method");
            }
            other => panic!("expected InvalidField, got {other:?}"),
        }
        assert!(err.to_string().contains("interrupt_method"));
    }

    #[test]
    fn test_wrong_type_and_non_mapping_entries() {
        let r: RawProviderConfig = serde_json::from_value(serde_json::json!({
            "model": "qwen2.5",
            "keep_alive": "forever"
        }))
        .unwrap();
        assert!(matches!(
            ProviderConfig::build(ProviderKind::Ollama, &r),
            Err(ConfigValidationError::InvalidField { field: "keep_alive", .. })
        ));

        let r: RawProviderConfig = serde_json::from_value(serde_json::json!("gpt-4o")).unwrap();
        assert!(matches!(
            ProviderConfig::build(ProviderKind::OpenAI, &r),
            Err(ConfigValidationError::InvalidField { field: "entry", .. })
        ));
    }

    #[test]
    fn test_raw_accepts_api_key_alias() {
        let r: RawProviderConfig = serde_json::from_value(serde_json::json!({
            "api_key": "sk-1",
            "model": "gpt-4o",
            "interrupt_method": "user"
        }))
        .unwrap();
        assert_eq!(r.llm_api_key.as_deref(), Some("sk-1"));
        assert_eq!(r.interrupt_method, Some(InterruptMethod::User));
    }

    #[test]
    fn test_signal_message_follows_method() {
        let json = serde_json::to_value(InterruptMethod::System.signal_message("[Interrupted]"))
            .unwrap();
        assert_eq!(json["role"], "system");

        let json =
            serde_json::to_value(InterruptMethod::User.signal_message("[Interrupted]")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "[Interrupted]");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = OpenAICompatibleConfig::new("https://api.example.com/v1", "gpt-x")
            .with_api_key("secret-key");
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("gpt-x"));
    }
}
