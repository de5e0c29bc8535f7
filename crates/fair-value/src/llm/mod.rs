//! Language model clients.
//!
//! Both providers are reached over plain HTTPS with `reqwest`; each client
//! takes a base URL so tests can point it at a mock server.

mod anthropic;
mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use async_trait::async_trait;

use crate::error::LlmError;

/// A single prompt to a chat model.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[async_trait]
pub trait Llm: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Returns the model's text reply.
    async fn complete(&self, request: &Completion<'_>) -> Result<String, LlmError>;
}

/// Removes a surrounding Markdown code fence (with or without a language
/// tag) from a model reply.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{}"), "{}");
    }
}
