use crate::completion::{CompletionError, CompletionModel, TokenUsage};
use crate::providers::endpoint;
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, info, instrument};

pub const DEFAULT_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2:latest";
pub const DEFAULT_TEMP: f64 = 0.0;

/// Chat model served by a local [Ollama](https://ollama.com) instance.
///
/// Requests are non-streaming; the whole reply comes back in one response.
pub struct OllamaCompletionModel {
    api_url: String,
    client: reqwest::Client,
    model: String,
    temperature: f64,
}

impl OllamaCompletionModel {
    pub fn new(api_url: impl Into<String>, model: impl Into<String>, temperature: f64) -> Self {
        Self {
            api_url: endpoint(&api_url.into(), "api/chat"),
            client: reqwest::Client::new(),
            model: model.into(),
            temperature,
        }
    }
}

impl Default for OllamaCompletionModel {
    fn default() -> Self {
        Self::new(DEFAULT_URL, DEFAULT_MODEL, DEFAULT_TEMP)
    }
}

#[async_trait]
impl CompletionModel for OllamaCompletionModel {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn send(&self, prompt: &str) -> Result<String, CompletionError> {
        let request_body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
            "options": { "temperature": self.temperature },
        });
        debug!(request_body = ?request_body, "Sending request to Ollama");

        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Request failed");
                CompletionError::RequestError(e.to_string())
            })?;

        let status = response.status();
        debug!(%status, "Received API response");

        if !status.is_success() {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error (failed to read response body)".to_string());
            error!(status = %status, error = %error_msg, "API returned error response");
            return Err(CompletionError::ProviderError(status.into(), error_msg));
        }

        let response_json: serde_json::Value = response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse response JSON");
            CompletionError::ParseError(e.to_string())
        })?;

        let content = response_json["message"]["content"]
            .as_str()
            .ok_or_else(|| CompletionError::ParseError("Invalid response body".to_string()))?
            .to_string();

        let token_usage = TokenUsage {
            prompt_tokens: response_json["prompt_eval_count"].as_u64(),
            completion_tokens: response_json["eval_count"].as_u64(),
        };
        info!(
            prompt_tokens = token_usage.prompt_tokens,
            completion_tokens = token_usage.completion_tokens,
            "Token usage recorded"
        );

        Ok(content)
    }
}
