use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::{
    embeddings::{EmbedderError, Embedder},
    loader::{builtins::file_loaders::CsvLoader, Loader, LoaderError},
    splitter::{CharacterSplitter, SplitError},
    vector_store::{InMemoryVectorStore, SourceInfo, VectorStoreError},
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Load error: {0}")]
    Load(#[from] LoaderError),
    #[error("Split error: {0}")]
    Split(#[from] SplitError),
    #[error("Encode error: {0}")]
    Encode(#[from] EmbedderError),
    #[error("Index error: {0}")]
    Index(#[from] VectorStoreError),
}

/// Runs load, split, encode and index in order. A failing stage stops the run
/// before anything downstream of it happens.
pub struct IndexPipeline {
    loader: CsvLoader,
    splitter: CharacterSplitter,
    embedder: Embedder,
}

impl IndexPipeline {
    pub fn new(loader: CsvLoader, splitter: CharacterSplitter, embedder: Embedder) -> Self {
        Self {
            loader,
            splitter,
            embedder,
        }
    }

    /// Describes the current input so a saved index can be matched against it.
    pub async fn source_info(&self) -> Result<SourceInfo, PipelineError> {
        let files = self.loader.files().to_vec();
        let fingerprint = tokio::task::spawn_blocking(move || fingerprint(&files))
            .await
            .map_err(|e| LoaderError::Task(e.to_string()))??;
        Ok(SourceInfo {
            fingerprint,
            chunk_size: self.splitter.chunk_size(),
            chunk_overlap: self.splitter.chunk_overlap(),
        })
    }

    /// Builds a fresh in-memory index from the input files.
    #[instrument(skip(self), fields(files = self.loader.files().len()))]
    pub async fn build(&self) -> Result<InMemoryVectorStore, PipelineError> {
        let source = self.source_info().await?;

        info!("Loading documents...");
        let documents = self.loader.load().await?;

        info!("Splitting documents...");
        let chunks = self.splitter.split_documents(&documents);
        info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "Documents split into chunks"
        );

        let embeddings = self.embedder.embed_chunks(&chunks).await?;

        info!("Creating vector index...");
        let store = InMemoryVectorStore::from_embeddings(self.embedder.model_name(), embeddings)
            .inspect_err(|e| error!("Error creating vector index: {e}"))?
            .with_source(source);
        Ok(store)
    }

    /// Builds the index and persists it into `dir`.
    pub async fn build_and_save(
        &self,
        dir: impl AsRef<Path>,
    ) -> Result<InMemoryVectorStore, PipelineError> {
        let store = self.build().await?;
        store.save_local(dir.as_ref()).await?;
        info!(dir = %dir.as_ref().display(), "Vector index created and saved");
        Ok(store)
    }

    /// Loads the index saved in `dir` when it was built from the same input,
    /// chunk parameters and embedding model; builds and saves a new one otherwise.
    pub async fn open_or_build(
        &self,
        dir: impl AsRef<Path>,
        rebuild: bool,
    ) -> Result<InMemoryVectorStore, PipelineError> {
        let dir = dir.as_ref();
        if !rebuild && self.is_current(dir).await? {
            info!(dir = %dir.display(), "Reusing saved vector index");
            return Ok(InMemoryVectorStore::load_local(dir)?);
        }
        self.build_and_save(dir).await
    }

    async fn is_current(&self, dir: &Path) -> Result<bool, PipelineError> {
        let manifest = match InMemoryVectorStore::read_manifest(dir) {
            Ok(Some(manifest)) => manifest,
            Ok(None) => return Ok(false),
            Err(e) => {
                warn!("Ignoring unreadable index manifest: {e}");
                return Ok(false);
            }
        };
        let source = self.source_info().await?;
        Ok(manifest.embedding_model == self.embedder.model_name()
            && manifest.source.as_ref() == Some(&source))
    }
}

/// Loads a saved index for querying with `embedding_model`.
pub fn open_index(
    dir: impl AsRef<Path>,
    embedding_model: &str,
) -> Result<InMemoryVectorStore, PipelineError> {
    let store = InMemoryVectorStore::load_local(dir)?;
    store
        .check_model(embedding_model)
        .inspect_err(|e| error!("Cannot query index: {e}"))?;
    Ok(store)
}

/// SHA-256 over the files' contents, in order.
pub fn fingerprint(files: &[PathBuf]) -> Result<String, LoaderError> {
    let mut hasher = Sha256::new();
    for file in files {
        let bytes = std::fs::read(file).map_err(|source| LoaderError::Io {
            path: file.clone(),
            source,
        })?;
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
