pub mod in_memory_vec_store;

pub use in_memory_vec_store::{IndexManifest, InMemoryVectorStore, SourceInfo, INDEX_FILE, MANIFEST_FILE};

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use super::embeddings::embedding::Embedding;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorStoreError {
    #[error("Embedding not found")]
    EmbeddingNotFound,
    #[error("Embedding `{0}` has no dimensions")]
    EmptyEmbedding(String),
    #[error("Vector has {found} dimensions, the index holds {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Vector `{0}` holds a NaN or infinite value")]
    NonFinite(String),
    #[error("Duplicate embedding id `{0}`")]
    DuplicateId(String),
    #[error("Index was built with `{index}`, not `{requested}`")]
    ModelMismatch { index: String, requested: String },
    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("Failed to (de)serialize {path}: {message}")]
    Serialization { path: PathBuf, message: String },
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),
}

/// One ranked result of a similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    /// Cosine similarity with the query, higher is nearer.
    pub score: f64,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Embedding, VectorStoreError>;

    /// The `n` entries most similar to `query`, nearest first.
    async fn top_n(&self, query: &[f64], n: usize) -> Result<Vec<SearchHit>, VectorStoreError>;
}

/// Cosine similarity of two equally sized vectors; 0 when either is all zeros.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
