//! Provider interaction: prompt the model and validate its outline.
//!
//! All prompt wording lives in [`crate::prompts`] and backend construction in
//! [`crate::providers`]; this module owns the retry loop and the hand-off to
//! [`crate::outline::parse_outline`].
//!
//! ## Retry Strategy
//!
//! A failed [`LLMProvider::chat`] call is retried when the [`LlmError`]'s own
//! retry strategy allows it (network errors, timeouts, rate limits, server
//! errors), with exponential backoff (`retry_backoff_ms * 2^(attempt-1)`).
//! With the defaults of 1 s and 3 retries the waits are 1 s → 2 s → 4 s.
//! Auth, bad-request, unknown-model and context-size errors end the loop at
//! once. Either way the caller sees one [`DeckError::ProviderError`] naming
//! the backend and the attempt count.
//!
//! A response that arrives but is not a valid outline is never retried.

use crate::config::GenerationConfig;
use crate::error::DeckError;
use crate::outline::{parse_outline, RawOutline};
use crate::prompts::{outline_user_prompt, DEFAULT_SYSTEM_PROMPT};
use crate::providers::{backend_label, ChatMessage, CompletionOptions, LLMProvider, LLMResponse, LlmError};
use edgequake_llm::RetryStrategy;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// A validated outline plus how the provider call went.
#[derive(Debug, Clone)]
pub struct OutlineResponse {
    pub outline: RawOutline,
    pub attempts: u32,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Ask the provider for an outline of `doc_text`.
pub async fn generate_outline(
    provider: &Arc<dyn LLMProvider>,
    doc_text: &str,
    file_name: &str,
    config: &GenerationConfig,
) -> Result<OutlineResponse, DeckError> {
    let start = Instant::now();
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(outline_user_prompt(doc_text, file_name)),
    ];
    let options = build_options(config);
    let label = backend_label(config, provider.as_ref());

    let (response, attempts) =
        chat_with_retry(provider.as_ref(), &label, &messages, &options, config).await?;
    debug!(
        "{}: {} chars from '{}' after {} attempt(s), {} input / {} output tokens",
        file_name,
        response.content.len(),
        label,
        attempts,
        response.prompt_tokens,
        response.completion_tokens
    );

    let outline = parse_outline(&response.content)?;
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "{}: outline with {} slide(s) in {}ms",
        file_name,
        outline.slides.len(),
        duration_ms
    );
    Ok(OutlineResponse {
        outline,
        attempts,
        input_tokens: response.prompt_tokens,
        output_tokens: response.completion_tokens,
        duration_ms,
    })
}

async fn chat_with_retry(
    provider: &dyn LLMProvider,
    label: &str,
    messages: &[ChatMessage],
    options: &CompletionOptions,
    config: &GenerationConfig,
) -> Result<(LLMResponse, u32), DeckError> {
    let max_attempts = config.max_attempts();
    let call_timeout = Duration::from_secs(config.api_timeout_secs);
    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config
                .retry_backoff_ms
                .saturating_mul(2u64.saturating_pow(attempt - 1));
            warn!(
                "{}: retry {}/{} after {}ms",
                label, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        if let Some(cb) = &config.progress_callback {
            cb.on_provider_attempt(attempt + 1, max_attempts);
        }

        let result = match timeout(call_timeout, provider.chat(messages, Some(options))).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout),
        };

        match result {
            Ok(response) => return Ok((response, attempt + 1)),
            Err(e) if is_retryable(&e) => {
                warn!("{}: attempt {} failed: {}", label, attempt + 1, e);
                last_err = Some(e.to_string());
            }
            Err(e) => {
                warn!("{}: permanent failure: {}", label, e);
                return Err(DeckError::ProviderError {
                    provider: label.to_string(),
                    attempts: attempt + 1,
                    detail: e.to_string(),
                });
            }
        }
    }

    Err(DeckError::ProviderError {
        provider: label.to_string(),
        attempts: max_attempts,
        detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Whether another attempt may succeed. `ReduceContext` is not a retry:
/// the same prompt would overflow again.
fn is_retryable(e: &LlmError) -> bool {
    matches!(
        e.retry_strategy(),
        RetryStrategy::ExponentialBackoff { .. } | RetryStrategy::WaitAndRetry { .. }
    )
}

fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
