use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use super::{cosine_similarity, SearchHit, VectorStore, VectorStoreError};
use crate::embeddings::embedding::Embedding;

pub const INDEX_FILE: &str = "index.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Where an index's entries came from, used to decide whether a saved index
/// can be reused instead of rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Digest over the input files' contents.
    pub fingerprint: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// Description of a persisted index, stored next to its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub index_id: Uuid,
    pub embedding_model: String,
    pub dimension: usize,
    pub entries: usize,
    pub source: Option<SourceInfo>,
    pub created_at: DateTime<Utc>,
}

/// Exact (flat) cosine-similarity index held in memory and persisted as JSON.
///
/// Entries keep their insertion order, which also decides the order of equally
/// scored search results.
pub struct InMemoryVectorStore {
    index_id: Uuid,
    embedding_model: String,
    source: Option<SourceInfo>,
    created_at: DateTime<Utc>,
    embeddings: RwLock<Vec<Embedding>>,
}

impl InMemoryVectorStore {
    /// An empty index for vectors produced by `embedding_model`.
    pub fn new(embedding_model: impl Into<String>) -> Self {
        Self {
            index_id: Uuid::new_v4(),
            embedding_model: embedding_model.into(),
            source: None,
            created_at: Utc::now(),
            embeddings: RwLock::new(vec![]),
        }
    }

    /// Build an index from already computed embeddings.
    ///
    /// Every embedding needs a unique id and the same, non-zero dimensionality.
    pub fn from_embeddings(
        embedding_model: impl Into<String>,
        embeddings: Vec<Embedding>,
    ) -> Result<Self, VectorStoreError> {
        validate_entries(&embeddings)?;
        info!("Built index with {} entries", embeddings.len());
        Ok(Self {
            embeddings: RwLock::new(embeddings),
            ..Self::new(embedding_model)
        })
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceInfo) -> Self {
        self.source = Some(source);
        self
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Fails unless the index was built with `model`; vectors from different
    /// models are not comparable.
    pub fn check_model(&self, model: &str) -> Result<(), VectorStoreError> {
        if self.embedding_model == model {
            Ok(())
        } else {
            Err(VectorStoreError::ModelMismatch {
                index: self.embedding_model.clone(),
                requested: model.to_string(),
            })
        }
    }

    pub async fn len(&self) -> usize {
        self.embeddings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.embeddings.read().await.is_empty()
    }

    pub async fn manifest(&self) -> IndexManifest {
        let embeddings = self.embeddings.read().await;
        IndexManifest {
            index_id: self.index_id,
            embedding_model: self.embedding_model.clone(),
            dimension: embeddings.first().map_or(0, Embedding::dimension),
            entries: embeddings.len(),
            source: self.source.clone(),
            created_at: self.created_at,
        }
    }

    /// Persist the index into `dir`, creating it if needed.
    ///
    /// The manifest is written last, so a directory without one never holds a
    /// complete index.
    pub async fn save_local(&self, dir: impl AsRef<Path>) -> Result<(), VectorStoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| io_error(dir, &e))?;

        let manifest = self.manifest().await;
        {
            let embeddings = self.embeddings.read().await;
            write_json(&dir.join(INDEX_FILE), &*embeddings)?;
        }
        write_json(&dir.join(MANIFEST_FILE), &manifest)?;
        info!(dir = %dir.display(), entries = manifest.entries, "Index saved");
        Ok(())
    }

    /// Reconstruct an index saved with [`save_local`](Self::save_local) without re-embedding.
    pub fn load_local(dir: impl AsRef<Path>) -> Result<Self, VectorStoreError> {
        let dir = dir.as_ref();
        let manifest: IndexManifest = read_json(&dir.join(MANIFEST_FILE))?;
        let embeddings: Vec<Embedding> = read_json(&dir.join(INDEX_FILE))?;

        if embeddings.len() != manifest.entries {
            return Err(corrupt(format!(
                "manifest lists {} entries, found {}",
                manifest.entries,
                embeddings.len()
            )));
        }
        validate_entries(&embeddings)?;
        if let Some(first) = embeddings.first() {
            if first.dimension() != manifest.dimension {
                return Err(corrupt(format!(
                    "manifest lists dimension {}, entries have {}",
                    manifest.dimension,
                    first.dimension()
                )));
            }
        }

        info!(dir = %dir.display(), entries = embeddings.len(), "Index loaded");
        Ok(Self {
            index_id: manifest.index_id,
            embedding_model: manifest.embedding_model,
            source: manifest.source,
            created_at: manifest.created_at,
            embeddings: RwLock::new(embeddings),
        })
    }

    /// The manifest saved in `dir`, or `None` when no index was saved there.
    pub fn read_manifest(dir: impl AsRef<Path>) -> Result<Option<IndexManifest>, VectorStoreError> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn get_by_id(&self, id: &str) -> Result<Embedding, VectorStoreError> {
        let embeddings = self.embeddings.read().await;
        embeddings
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(VectorStoreError::EmbeddingNotFound)
    }

    async fn top_n(&self, query: &[f64], n: usize) -> Result<Vec<SearchHit>, VectorStoreError> {
        let embeddings = self.embeddings.read().await;
        if n == 0 || embeddings.is_empty() {
            return Ok(vec![]);
        }
        let expected = embeddings[0].dimension();
        if query.len() != expected {
            return Err(VectorStoreError::DimensionMismatch {
                expected,
                found: query.len(),
            });
        }
        if !query.iter().all(|x| x.is_finite()) {
            return Err(VectorStoreError::NonFinite("query".to_string()));
        }

        let mut results = embeddings
            .iter()
            .map(|embedding| (cosine_similarity(query, &embedding.embedded_data), embedding))
            .collect::<Vec<_>>();
        // stable, so equal scores keep insertion order
        results.sort_by(|a, b| b.0.total_cmp(&a.0));
        results.truncate(n);
        Ok(results
            .into_iter()
            .map(|(score, em)| SearchHit {
                id: em.id.clone(),
                text: em.raw_data.clone(),
                score,
            })
            .collect())
    }
}

fn validate_entries(embeddings: &[Embedding]) -> Result<(), VectorStoreError> {
    let mut seen = HashSet::new();
    let expected = embeddings.first().map_or(0, Embedding::dimension);
    for embedding in embeddings {
        if embedding.embedded_data.is_empty() {
            return Err(VectorStoreError::EmptyEmbedding(embedding.id.clone()));
        }
        if !embedding.embedded_data.iter().all(|x| x.is_finite()) {
            return Err(VectorStoreError::NonFinite(embedding.id.clone()));
        }
        if embedding.dimension() != expected {
            return Err(VectorStoreError::DimensionMismatch {
                expected,
                found: embedding.dimension(),
            });
        }
        if !seen.insert(embedding.id.as_str()) {
            return Err(VectorStoreError::DuplicateId(embedding.id.clone()));
        }
    }
    Ok(())
}

fn corrupt(message: String) -> VectorStoreError {
    error!("Corrupt index: {message}");
    VectorStoreError::CorruptIndex(message)
}

fn io_error(path: &Path, e: &std::io::Error) -> VectorStoreError {
    error!(path = %path.display(), error = %e, "Index I/O failed");
    VectorStoreError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), VectorStoreError> {
    let bytes = serde_json::to_vec(value).map_err(|e| VectorStoreError::Serialization {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes).map_err(|e| io_error(&tmp, &e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_error(path, &e))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, VectorStoreError> {
    let bytes = std::fs::read(path).map_err(|e| io_error(path, &e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to parse index file");
        VectorStoreError::Serialization {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })
}
