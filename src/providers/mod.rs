//! Provider selection on top of `edgequake-llm`.
//!
//! Every backend is an [`LLMProvider`] from `edgequake-llm`; this module only
//! decides which one to build for a factory key and with which credentials.
//! Retrying, outline parsing and validation live in [`crate::pipeline::llm`].
//!
//! Credentials are read at construction time, so a missing key fails with
//! [`DeckError::ConfigurationError`] before any request is sent. DeepSeek is
//! reached through the OpenAI provider pointed at its compatible endpoint.

use crate::config::GenerationConfig;
use crate::error::DeckError;
use edgequake_llm::{AnthropicProvider, OllamaProvider, OpenAIProvider};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LLMResponse, LlmError};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

// ── Registry ─────────────────────────────────────────────────────────────

/// Backends known to the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    DeepSeek,
    OpenAi,
    Anthropic,
    Ollama,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::DeepSeek,
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn info(&self) -> &'static ProviderInfo {
        match self {
            ProviderKind::DeepSeek => &PROVIDERS[0],
            ProviderKind::OpenAi => &PROVIDERS[1],
            ProviderKind::Anthropic => &PROVIDERS[2],
            ProviderKind::Ollama => &PROVIDERS[3],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| DeckError::UnknownProvider {
                name: s.to_string(),
                available: ProviderKind::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Static description of a backend, for `--providers`.
#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub default_model: &'static str,
    /// Environment variable holding the API key; `None` for local backends.
    pub env_var: Option<&'static str>,
    pub description: &'static str,
}

static PROVIDERS: [ProviderInfo; 4] = [
    ProviderInfo {
        name: "deepseek",
        default_model: "deepseek-chat",
        env_var: Some("DEEPSEEK_API_KEY"),
        description: "DeepSeek chat API (OpenAI-compatible)",
    },
    ProviderInfo {
        name: "openai",
        default_model: "gpt-4o",
        env_var: Some("OPENAI_API_KEY"),
        description: "OpenAI chat completions",
    },
    ProviderInfo {
        name: "anthropic",
        default_model: "claude-3-5-sonnet-20241022",
        env_var: Some("ANTHROPIC_API_KEY"),
        description: "Anthropic Claude messages API",
    },
    ProviderInfo {
        name: "ollama",
        default_model: "llama3.1",
        env_var: None,
        description: "Local Ollama server (no key, needs a running endpoint)",
    },
];

/// All registered backends, in display order.
pub fn list_providers() -> &'static [ProviderInfo] {
    &PROVIDERS
}

// ── Factory ──────────────────────────────────────────────────────────────

/// Build the provider named by `config.provider_name`, reading credentials
/// from the process environment.
pub fn create_backend(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, DeckError> {
    create_backend_with_env(config, |var| std::env::var(var).ok())
}

/// Same as [`create_backend`] with an injectable environment lookup.
pub fn create_backend_with_env<F>(
    config: &GenerationConfig,
    env: F,
) -> Result<Arc<dyn LLMProvider>, DeckError>
where
    F: Fn(&str) -> Option<String>,
{
    let kind: ProviderKind = config.provider_name.parse()?;
    let info = kind.info();
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| info.default_model.to_string());

    let backend: Arc<dyn LLMProvider> = match kind {
        ProviderKind::DeepSeek => {
            let key = require_key(info, &env)?;
            Arc::new(OpenAIProvider::compatible(key, DEEPSEEK_BASE_URL).with_model(model))
        }
        ProviderKind::OpenAi => {
            let key = require_key(info, &env)?;
            Arc::new(OpenAIProvider::new(key).with_model(model))
        }
        ProviderKind::Anthropic => {
            let key = require_key(info, &env)?;
            Arc::new(AnthropicProvider::new(key).with_model(model))
        }
        ProviderKind::Ollama => {
            let raw = config
                .ollama_url
                .clone()
                .or_else(|| env("OLLAMA_HOST"))
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
            let host = normalise_ollama_url(&raw).ok_or_else(|| DeckError::ConfigurationError {
                provider: info.name.into(),
                hint: format!(
                    "Ollama endpoint '{raw}' is not an http(s) URL.\n\
Set --ollama-url or OLLAMA_HOST, e.g. {DEFAULT_OLLAMA_URL}"
                ),
            })?;
            let provider = OllamaProvider::builder()
                .host(host)
                .model(model)
                .build()
                .map_err(|e| DeckError::ConfigurationError {
                    provider: info.name.into(),
                    hint: e.to_string(),
                })?;
            Arc::new(provider)
        }
    };

    tracing::debug!(
        "Created backend '{}' ({}) with model '{}'",
        info.name,
        backend.name(),
        backend.model()
    );
    Ok(backend)
}

/// Name used in logs, errors and stats: the factory key for built backends,
/// the provider's own name for an injected one.
pub(crate) fn backend_label(config: &GenerationConfig, backend: &dyn LLMProvider) -> String {
    if config.provider.is_some() {
        return backend.name().to_string();
    }
    config
        .provider_name
        .parse::<ProviderKind>()
        .map(|k| k.as_str().to_string())
        .unwrap_or_else(|_| backend.name().to_string())
}

fn require_key<F>(info: &ProviderInfo, env: &F) -> Result<String, DeckError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = info.env_var.unwrap_or_default();
    match env(var) {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(DeckError::ConfigurationError {
            provider: info.name.into(),
            hint: format!("Set {var} to your API key, or pick another backend with --provider."),
        }),
    }
}

/// Trailing slashes stripped; `None` unless the URL is http(s).
fn normalise_ollama_url(raw: &str) -> Option<String> {
    let url = raw.trim().trim_end_matches('/');
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))?;
    (!rest.is_empty()).then(|| url.to_string())
}
