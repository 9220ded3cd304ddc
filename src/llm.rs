//! Completion clients: the real chat-completions API and the keyless fallback.

pub mod fallback;
pub mod openai;

pub use fallback::{FALLBACK_RESPONSE, FallbackClient};
pub use openai::OpenAiClient;

use crate::config::LlmConfig;
use crate::conversation::PromptMessage;
use crate::error::{LlmError, Result};

use async_trait::async_trait;
use std::sync::Arc;

/// Sampling temperature used for every command.
pub const TEMPERATURE: f64 = 0.2;

/// Turns an assembled prompt into a single reply text.
#[async_trait]
pub trait CompletionClient: Send + Sync + 'static {
    /// Short label for logs.
    fn name(&self) -> &str;

    async fn complete(&self, messages: &[PromptMessage]) -> std::result::Result<String, LlmError>;
}

/// Pick the completion client once at startup.
///
/// Without an API key the bot runs in fallback mode and answers with a canned
/// response.
pub fn select_client(config: &LlmConfig) -> Result<Arc<dyn CompletionClient>> {
    match &config.openai_key {
        Some(api_key) => {
            let client = OpenAiClient::new(api_key, &config.model, &config.base_url)?;
            tracing::info!(model = %client.model(), "OpenAI completion client configured");
            Ok(Arc::new(client))
        }
        None => {
            tracing::warn!("no OpenAI API key configured, running in fallback mode");
            Ok(Arc::new(FallbackClient))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(openai_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            openai_key: openai_key.map(str::to_string),
            model: "gpt-4o".into(),
            base_url: "https://api.openai.com/v1".into(),
        }
    }

    #[test]
    fn missing_key_selects_fallback() {
        let client = select_client(&llm_config(None)).unwrap();
        assert_eq!(client.name(), "fallback");
    }

    #[test]
    fn configured_key_selects_openai() {
        let client = select_client(&llm_config(Some("sk-test"))).unwrap();
        assert_eq!(client.name(), "openai");
    }
}
