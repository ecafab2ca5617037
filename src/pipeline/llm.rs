//! LLM interaction: ask the provider for invoice fields and parse the reply.
//!
//! All prompt text lives in [`crate::prompts`]; this module only owns the
//! retry loop and reply parsing.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors are transient. Exponential backoff
//! (`retry_backoff_ms * 2^(attempt-1)`) with a 500 ms base and 3 retries waits
//! 500 ms → 1 s → 2 s. Each wait is capped at [`MAX_BACKOFF_MS`]. A reply that arrives but is not valid JSON is not
//! retried; the model gave its answer.

use crate::config::DatasetConfig;
use crate::error::FileError;
use crate::output::InvoiceFields;
use crate::pipeline::postprocess;
use crate::prompts::INVOICE_EXTRACTION_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Upper bound on a single retry wait.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Extract invoice fields from one Markdown document.
pub async fn extract_invoice(
    provider: &Arc<dyn LLMProvider>,
    file: &str,
    markdown: &str,
    config: &DatasetConfig,
) -> Result<InvoiceFields, FileError> {
    let start = Instant::now();
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(INVOICE_EXTRACTION_PROMPT);

    let messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(markdown)];
    let options = build_options(config);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                file, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    file,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                return parse_reply(&response.content).map_err(|detail| {
                    FileError::ExtractionFailed {
                        file: file.to_string(),
                        retries: attempt,
                        detail,
                    }
                });
            }
            Err(e) => {
                let err_msg = format!("{}", e);
                warn!("{}: attempt {} failed — {}", file, attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
        }
    }

    Err(FileError::ExtractionFailed {
        file: file.to_string(),
        retries: config.max_retries,
        detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Parse the model's reply into [`InvoiceFields`], tolerating a code fence.
pub fn parse_reply(content: &str) -> Result<InvoiceFields, String> {
    let body = postprocess::strip_outer_fences(content);
    if body.is_empty() {
        return Err("empty reply".to_string());
    }
    serde_json::from_str(&body).map_err(|e| format!("reply is not invoice JSON: {e}"))
}

/// Delay before retry number `attempt` (1-based).
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

/// Build `CompletionOptions` from the dataset config.
fn build_options(config: &DatasetConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
