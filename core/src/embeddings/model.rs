use crate::embeddings::EmbedderError;
use async_trait::async_trait;

/// A pretrained text embedding model.
///
/// Implementations are shared read-only between the encoder's workers, so
/// `embed` takes `&self` and must not depend on call order.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Identifier of the model, recorded with persisted indexes.
    fn name(&self) -> &str;

    async fn embed(&self, data: &str) -> Result<Vec<f64>, EmbedderError>;
}
