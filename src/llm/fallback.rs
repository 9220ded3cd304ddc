//! Canned responder used when no API key is configured.

use crate::conversation::PromptMessage;
use crate::error::LlmError;
use crate::llm::CompletionClient;

use async_trait::async_trait;

/// Reply returned for every prompt in fallback mode.
pub const FALLBACK_RESPONSE: &str = "(Gratismodus) Jeg mangler OpenAI-nøkkel, så jeg svarer enkelt. \
    Be eieren legge inn OPENAI_API_KEY i .env for fulle svar 🤖.";

/// Answers every prompt with [`FALLBACK_RESPONSE`]. Never fails, never does I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackClient;

#[async_trait]
impl CompletionClient for FallbackClient {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn complete(&self, _messages: &[PromptMessage]) -> Result<String, LlmError> {
        Ok(FALLBACK_RESPONSE.to_string())
    }
}
