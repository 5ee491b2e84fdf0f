use crate::completion::{CompletionError, CompletionModel, TokenUsage};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, info, instrument};

pub const URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TOKENS: usize = 2400;

/// Chat model behind any OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAICompletionModel {
    api_key: String,
    api_url: String,
    client: reqwest::Client,
    model: String,
    temperature: f64,
    max_tokens: usize,
}

impl OpenAICompletionModel {
    #[must_use]
    pub fn new(api_key: String, api_url: String, model: String, temperature: f64) -> Self {
        Self {
            api_key,
            api_url,
            client: reqwest::Client::new(),
            model,
            temperature,
            max_tokens: DEFAULT_TOKENS,
        }
    }
}

#[async_trait]
impl CompletionModel for OpenAICompletionModel {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn send(&self, prompt: &str) -> Result<String, CompletionError> {
        let request_body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        debug!(request_body = ?request_body, "Sending request to OpenAI");

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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

        if status.is_success() {
            let response_json: serde_json::Value = response.json().await.map_err(|e| {
                error!(error = ?e, "Failed to parse response JSON");
                CompletionError::ParseError(e.to_string())
            })?;

            let response_message = response_json["choices"][0]["message"]["content"]
                .as_str()
                .ok_or(CompletionError::ParseError(
                    "Invalid response body".to_string(),
                ))?
                .to_string();

            let usage_response = &response_json["usage"];
            let token_usage = TokenUsage {
                prompt_tokens: usage_response["prompt_tokens"].as_u64(),
                completion_tokens: usage_response["completion_tokens"].as_u64(),
            };
            info!(
                prompt_tokens = token_usage.prompt_tokens,
                completion_tokens = token_usage.completion_tokens,
                "Token usage recorded"
            );

            Ok(response_message)
        } else {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error (failed to read response body)".to_string());

            error!(
                status = %status,
                error = %error_msg,
                "API returned error response"
            );

            Err(CompletionError::ProviderError(status.into(), error_msg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn model_for(server: &mockito::ServerGuard) -> OpenAICompletionModel {
        OpenAICompletionModel::new(
            "secret".to_string(),
            format!("{}/v1/chat/completions", server.url()),
            DEFAULT_MODEL.to_string(),
            0.0,
        )
    }

    #[tokio::test]
    async fn test_completion_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": "hi" }],
            })))
            .with_status(200)
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"okay"}}],"usage":{"prompt_tokens":5,"completion_tokens":1,"total_tokens":6}}"#,
            )
            .create_async()
            .await;

        let reply = model_for(&server).send("hi").await;

        mock.assert_async().await;
        assert_eq!(reply, Ok("okay".to_string()));
    }

    #[tokio::test]
    async fn test_completion_without_choices() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        assert_eq!(
            model_for(&server).send("hi").await,
            Err(CompletionError::ParseError("Invalid response body".to_string()))
        );
    }

    #[tokio::test]
    async fn test_completion_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .expect(1)
            .create_async()
            .await;

        assert_eq!(
            model_for(&server).send("hi").await,
            Err(CompletionError::ProviderError(429, "slow down".to_string()))
        );
    }
}
