use crate::{
    completion::CompletionError, config::ConfigError, embeddings::EmbedderError,
    import::ImportError, loader::LoaderError, pipeline::PipelineError, qa::AnswerError,
    splitter::SplitError, vector_store::VectorStoreError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),
    #[error("Split error: {0}")]
    Split(#[from] SplitError),
    #[error("Embedder error: {0}")]
    Embedder(#[from] EmbedderError),
    #[error("VectorStore error: {0}")]
    VectorStore(#[from] VectorStoreError),
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),
    #[error("Answer error: {0}")]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Import error: {0}")]
    Import(#[from] ImportError),
}
