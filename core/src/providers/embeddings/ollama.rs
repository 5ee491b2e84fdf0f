use crate::embeddings::{model::EmbeddingModel, EmbedderError};
use crate::providers::endpoint;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, instrument};

pub const DEFAULT_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "all-minilm";

/// Embedding model served by a local [Ollama](https://ollama.com) instance.
///
/// The default model, `all-minilm`, is the MiniLM-L6 sentence embedder.
pub struct OllamaEmbeddingModel {
    api_url: String,
    model: String,
    client: Client,
}

impl OllamaEmbeddingModel {
    pub fn new(api_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_url: endpoint(&api_url.into(), "api/embed"),
            model: model.into(),
            client: Client::new(),
        }
    }
}

impl Default for OllamaEmbeddingModel {
    fn default() -> Self {
        Self::new(DEFAULT_URL, DEFAULT_MODEL)
    }
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embeddings: Vec<Vec<f64>>,
}

#[async_trait]
impl EmbeddingModel for OllamaEmbeddingModel {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, data), fields(model = %self.model, len = data.len()))]
    async fn embed(&self, data: &str) -> Result<Vec<f64>, EmbedderError> {
        let request_body = json!({
            "model": self.model,
            "input": data,
        });
        debug!(url = %self.api_url, "Sending embedding request to Ollama");

        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Embedding request failed");
                EmbedderError::RequestError(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            let response = response
                .json::<OllamaEmbeddingResponse>()
                .await
                .map_err(|e| EmbedderError::ParseError(e.to_string()))?;

            response
                .embeddings
                .into_iter()
                .next()
                .ok_or_else(|| EmbedderError::ParseError("Response held no embeddings".to_string()))
        } else {
            let error_message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(%status, error = %error_message, "Ollama returned error response");

            Err(EmbedderError::ProviderError(format!("{status}: {error_message}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_embed_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/embed")
            .match_body(Matcher::PartialJson(json!({
                "model": "all-minilm",
                "input": "fast shipping",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"model":"all-minilm","embeddings":[[0.1,0.2,0.3]]}"#)
            .create_async()
            .await;

        let model = OllamaEmbeddingModel::new(server.url(), DEFAULT_MODEL);
        let embedding = model.embed("fast shipping").await;

        mock.assert_async().await;
        assert_eq!(embedding, Ok(vec![0.1, 0.2, 0.3]));
        assert_eq!(model.name(), "all-minilm");
    }

    #[tokio::test]
    async fn test_embed_provider_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/embed")
            .with_status(404)
            .with_body(r#"{"error":"model \"all-minilm\" not found"}"#)
            .create_async()
            .await;

        let model = OllamaEmbeddingModel::new(format!("{}/", server.url()), DEFAULT_MODEL);
        let result = model.embed("fast shipping").await;

        assert!(matches!(result, Err(EmbedderError::ProviderError(msg)) if msg.contains("not found")));
    }

    #[tokio::test]
    async fn test_embed_unexpected_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/embed")
            .with_status(200)
            .with_body(r#"{"embeddings":[]}"#)
            .create_async()
            .await;

        let model = OllamaEmbeddingModel::new(server.url(), DEFAULT_MODEL);
        assert!(matches!(
            model.embed("fast shipping").await,
            Err(EmbedderError::ParseError(_))
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn simple_ollama_embed_request() {
        let model = OllamaEmbeddingModel::default();
        let response = model.embed("test").await;
        assert!(response.is_ok());
    }
}
