use crate::embeddings::{model::EmbeddingModel, EmbedderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, instrument};

pub const DEFAULT_URL: &str = "https://api.openai.com/v1/embeddings";
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Embedding model behind any OpenAI-compatible `/v1/embeddings` endpoint.
pub struct OpenAIEmbeddingModel {
    api_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAIEmbeddingModel {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            api_url,
            api_key,
            model,
            client: Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    pub data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    pub embedding: Vec<f64>,
}

#[async_trait]
impl EmbeddingModel for OpenAIEmbeddingModel {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, data), fields(model = %self.model))]
    async fn embed(&self, data: &str) -> Result<Vec<f64>, EmbedderError> {
        let request_body = json!({
                "input": data,
                "model": self.model,
        });
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| EmbedderError::RequestError(e.to_string()))?;

        if response.status().is_success() {
            let response = response
                .json::<OpenAIEmbeddingResponse>()
                .await
                .map_err(|e| EmbedderError::ParseError(e.to_string()))?;

            response
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .ok_or_else(|| EmbedderError::ParseError("Response held no embeddings".to_string()))
        } else {
            let error_message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(error = %error_message, "Embedding API returned error response");

            Err(EmbedderError::ProviderError(error_message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_embed_request_sends_bearer_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/embeddings")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(json!({"model": "text-embedding-3-small"})))
            .with_status(200)
            .with_body(r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.5,-0.5]}]}"#)
            .create_async()
            .await;

        let model = OpenAIEmbeddingModel::new(
            "secret".to_string(),
            format!("{}/v1/embeddings", server.url()),
            "text-embedding-3-small".to_string(),
        );

        assert_eq!(model.embed("test").await, Ok(vec![0.5, -0.5]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/embeddings")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let model = OpenAIEmbeddingModel::new(
            "wrong".to_string(),
            format!("{}/v1/embeddings", server.url()),
            "text-embedding-3-small".to_string(),
        );

        assert_eq!(
            model.embed("test").await,
            Err(EmbedderError::ProviderError("invalid api key".to_string()))
        );
    }

    #[tokio::test]
    #[ignore]
    async fn simple_openai_embed_request() {
        let api_key = std::env::var("REVIEWQA_OPENAI_API_KEY").unwrap();
        let model = OpenAIEmbeddingModel::new(
            api_key,
            DEFAULT_URL.to_string(),
            "text-embedding-3-small".to_string(),
        );

        assert!(model.embed("test").await.is_ok());
    }
}
