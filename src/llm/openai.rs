//! OpenAI chat-completions client.

use crate::conversation::PromptMessage;
use crate::error::{LlmError, Result};
use crate::llm::{CompletionClient, TEMPERATURE};

use anyhow::Context as _;
use async_trait::async_trait;
use std::time::Duration;

/// Default upper bound on a single completion round trip.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Calls `POST {base_url}/chat/completions` with bearer auth.
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self> {
        Self::with_timeout(api_key, model, base_url, REQUEST_TIMEOUT)
    }

    /// A timed-out request surfaces as [`LlmError::Request`].
    pub fn with_timeout(
        api_key: &str,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http_client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, messages: &[PromptMessage]) -> std::result::Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": TEMPERATURE,
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_body: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let message = response_body["error"]["message"]
                .as_str()
                .unwrap_or("unknown error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: message.to_string(),
            });
        }

        parse_openai_response(&response_body)
    }
}

fn parse_openai_response(body: &serde_json::Value) -> std::result::Result<String, LlmError> {
    let text = body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = OpenAiClient::new("sk-test", "gpt-4o", "http://localhost:1234/v1/").unwrap();
        assert_eq!(client.endpoint, "http://localhost:1234/v1/chat/completions");
        assert_eq!(client.model(), "gpt-4o");
    }

    #[test]
    fn reply_text_is_trimmed() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "  hei!\n"}}]
        });
        assert_eq!(parse_openai_response(&body).unwrap(), "hei!");
    }

    #[test]
    fn missing_content_is_an_error() {
        let body = serde_json::json!({"choices": []});
        assert!(matches!(
            parse_openai_response(&body),
            Err(LlmError::EmptyResponse)
        ));
    }
}
