pub mod embedding;
pub mod model;

use embedding::Embedding;
use model::EmbeddingModel;
use std::num::NonZeroUsize;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info, instrument};

use crate::document::Chunk;

const FALLBACK_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedderError {
    #[error("RequestError: {0}")]
    RequestError(String),
    #[error("ParseError: {0}")]
    ParseError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Model returned an empty embedding for `{0}`")]
    EmptyEmbedding(String),
    #[error("Embedding for `{id}` has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        found: usize,
    },
    #[error("Worker pool needs at least one worker")]
    NoWorkers,
    #[error("Encoding worker failed: {0}")]
    WorkerFailed(String),
}

/// Number of encoding workers used when none is configured.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(FALLBACK_WORKERS, NonZeroUsize::get)
}

/// Encodes chunks with a shared [`EmbeddingModel`] over a fixed-size pool of tokio tasks.
#[derive(Clone)]
pub struct Embedder {
    model: Arc<dyn EmbeddingModel>,
    workers: usize,
}

impl Embedder {
    pub fn new(model: Arc<dyn EmbeddingModel>, workers: usize) -> Result<Self, EmbedderError> {
        if workers == 0 {
            return Err(EmbedderError::NoWorkers);
        }
        Ok(Self { model, workers })
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Embed a single query string on the calling task.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f64>, EmbedderError> {
        let vector = self.model.embed(query).await?;
        if vector.is_empty() {
            return Err(EmbedderError::EmptyEmbedding(query.to_string()));
        }
        Ok(vector)
    }

    /// Embed every chunk, returning the embeddings in input order.
    ///
    /// The first failing chunk aborts the remaining workers and its error is
    /// returned; no embeddings are handed back in that case.
    #[instrument(skip_all, fields(chunks = chunks.len(), workers = self.workers))]
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Embedding>, EmbedderError> {
        if chunks.is_empty() {
            return Ok(vec![]);
        }
        info!("Encoding documents in parallel...");

        let texts: Arc<Vec<String>> = Arc::new(chunks.iter().map(|c| c.content.clone()).collect());
        let next = Arc::new(AtomicUsize::new(0));
        let mut pool = JoinSet::new();

        for _ in 0..self.workers.min(texts.len()) {
            let model = Arc::clone(&self.model);
            let texts = Arc::clone(&texts);
            let next = Arc::clone(&next);
            pool.spawn(async move {
                let mut encoded = vec![];
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(text) = texts.get(index) else {
                        break;
                    };
                    let vector = model.embed(text).await.map_err(|e| (index, e))?;
                    encoded.push((index, vector));
                }
                Ok::<_, (usize, EmbedderError)>(encoded)
            });
        }

        let mut vectors: Vec<Option<Vec<f64>>> = vec![None; texts.len()];
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(Ok(encoded)) => {
                    for (index, vector) in encoded {
                        vectors[index] = Some(vector);
                    }
                }
                Ok(Err((index, e))) => {
                    pool.abort_all();
                    error!(chunk = %chunks[index].id(), "Error during encoding: {e}");
                    return Err(e);
                }
                Err(e) => {
                    pool.abort_all();
                    error!("Encoding worker failed: {e}");
                    return Err(EmbedderError::WorkerFailed(e.to_string()));
                }
            }
        }

        let embeddings = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                vector
                    .map(|embedded_data| Embedding {
                        id: chunk.id(),
                        embedded_data,
                        raw_data: chunk.content.clone(),
                    })
                    .ok_or_else(|| EmbedderError::WorkerFailed(format!("chunk {} was never encoded", chunk.id())))
            })
            .collect::<Result<Vec<_>, _>>()?;

        check_dimensions(&embeddings)?;
        info!("Documents encoded successfully.");
        Ok(embeddings)
    }
}

fn check_dimensions(embeddings: &[Embedding]) -> Result<(), EmbedderError> {
    let Some(first) = embeddings.first() else {
        return Ok(());
    };
    let expected = first.dimension();
    for embedding in embeddings {
        if embedding.embedded_data.is_empty() {
            error!(chunk = %embedding.id, "Model returned an empty embedding");
            return Err(EmbedderError::EmptyEmbedding(embedding.id.clone()));
        }
        if embedding.dimension() != expected {
            error!(chunk = %embedding.id, expected, found = embedding.dimension(), "Embedding dimension mismatch");
            return Err(EmbedderError::DimensionMismatch {
                id: embedding.id.clone(),
                expected,
                found: embedding.dimension(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{chunks_from, FailingEmbedding, HashEmbedding, ShuffledEmbedding};

    #[tokio::test]
    async fn test_zero_workers_rejected() {
        let result = Embedder::new(Arc::new(HashEmbedding::default()), 0);
        assert!(matches!(result, Err(EmbedderError::NoWorkers)));
    }

    #[tokio::test]
    async fn test_embed_chunks_keeps_input_order() {
        let model = Arc::new(ShuffledEmbedding);
        let embedder = Embedder::new(model, 3).unwrap();
        let chunks = chunks_from(&["a", "bbbbbbbb", "cc", "ddddd", "e", "ffffffffffff", "ggg"]);

        let embeddings = embedder.embed_chunks(&chunks).await.unwrap();

        assert_eq!(embeddings.len(), chunks.len());
        for (chunk, embedding) in chunks.iter().zip(&embeddings) {
            assert_eq!(embedding.id, chunk.id());
            assert_eq!(embedding.raw_data, chunk.content);
            assert_eq!(embedding.embedded_data, vec![chunk.content.len() as f64, 1.0]);
        }
    }

    #[tokio::test]
    async fn test_embed_chunks_is_deterministic() {
        let embedder = Embedder::new(Arc::new(HashEmbedding::default()), 4).unwrap();
        let chunks = chunks_from(&["fast shipping", "broken on arrival", "fast shipping"]);

        let first = embedder.embed_chunks(&chunks).await.unwrap();
        let second = embedder.embed_chunks(&chunks).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].embedded_data, first[2].embedded_data);
    }

    #[tokio::test]
    async fn test_one_failure_fails_batch() {
        let embedder = Embedder::new(Arc::new(FailingEmbedding::new("boom")), 2).unwrap();
        let chunks = chunks_from(&["one", "two", "boom", "four", "five"]);

        let result = embedder.embed_chunks(&chunks).await;

        assert_eq!(
            result,
            Err(EmbedderError::ProviderError("model error on `boom`".to_string()))
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let embedder = Embedder::new(Arc::new(HashEmbedding::default()), 2).unwrap();
        assert_eq!(embedder.embed_chunks(&[]).await, Ok(vec![]));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let embeddings = vec![
            Embedding {
                id: "0:0".to_string(),
                embedded_data: vec![1.0, 2.0],
                raw_data: "a".to_string(),
            },
            Embedding {
                id: "1:0".to_string(),
                embedded_data: vec![1.0],
                raw_data: "b".to_string(),
            },
        ];
        assert_eq!(
            check_dimensions(&embeddings),
            Err(EmbedderError::DimensionMismatch {
                id: "1:0".to_string(),
                expected: 2,
                found: 1
            })
        );
    }

    #[tokio::test]
    async fn test_empty_query_vector_rejected() {
        let embedder = Embedder::new(Arc::new(HashEmbedding::with_dimension(0)), 1).unwrap();
        assert!(matches!(
            embedder.embed_query("anything").await,
            Err(EmbedderError::EmptyEmbedding(_))
        ));
    }
}
