use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::{
    completion::CompletionModel,
    embeddings::{default_workers, model::EmbeddingModel, Embedder},
    error::Error,
    loader::builtins::file_loaders::{CsvLoader, CsvLoaderBuilder},
    providers::{
        completions::{self, Ollama, OpenAI},
        embeddings::{self as embedding_providers, OllamaEmbedding, OpenAIEmbedding},
    },
    qa::{prompt, PromptTemplate, RetrievalQa, DEFAULT_TOP_K},
    splitter::{CharacterSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE},
    vector_store::VectorStore,
};

pub const DEFAULT_INDEX_DIR: &str = "customer_reviews_index_minilm";
pub const DEFAULT_LOG_FILE: &str = "data_pipeline.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Environment variable `{var}` holding the {provider} API key is not set")]
    MissingApiKey { provider: &'static str, var: String },
    #[error("The {0} provider needs `api_key_var` to name an environment variable")]
    NoApiKeyVar(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ollama,
    OpenAI,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingConfig {
    pub provider: Provider,
    /// Provider default when unset.
    pub model: Option<String>,
    /// Provider default when unset.
    pub api_url: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_var: Option<String>,
}

impl EmbeddingConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(match self.provider {
            Provider::Ollama => embedding_providers::ollama::DEFAULT_MODEL,
            Provider::OpenAI => embedding_providers::openai::DEFAULT_MODEL,
        })
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: None,
            api_url: None,
            api_key_var: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompletionConfig {
    pub provider: Provider,
    pub model: Option<String>,
    pub api_url: Option<String>,
    pub api_key_var: Option<String>,
    pub temperature: f64,
}

impl CompletionConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(match self.provider {
            Provider::Ollama => completions::ollama::DEFAULT_MODEL,
            Provider::OpenAI => completions::openai::DEFAULT_MODEL,
        })
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: None,
            api_url: None,
            api_key_var: None,
            temperature: completions::ollama::DEFAULT_TEMP,
        }
    }
}

/// Settings shared by every command, read from a JSON file.
///
/// Every field is optional; `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub workers: usize,
    pub top_k: usize,
    pub index_dir: PathBuf,
    pub log_file: PathBuf,
    pub delimiter: char,
    pub source_column: Option<String>,
    pub required_columns: Vec<String>,
    pub prompt_template: String,
    pub embedding: EmbeddingConfig,
    pub completion: CompletionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            workers: default_workers(),
            top_k: DEFAULT_TOP_K,
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            delimiter: ',',
            source_column: None,
            required_columns: vec![],
            prompt_template: prompt::DEFAULT_TEMPLATE.to_string(),
            embedding: EmbeddingConfig::default(),
            completion: CompletionConfig::default(),
        }
    }
}

impl Config {
    /// Reads and validates the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Defaults when `path` is `None`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).inspect_err(|e| {
            error!("Failed to parse config: {e}");
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.splitter()?;
        self.prompt()?;
        self.delimiter_byte()?;
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn splitter(&self) -> Result<CharacterSplitter, ConfigError> {
        CharacterSplitter::new(self.chunk_size, self.chunk_overlap)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn prompt(&self) -> Result<PromptTemplate, ConfigError> {
        PromptTemplate::new(self.prompt_template.clone())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.delimiter).ok().filter(u8::is_ascii).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "delimiter `{}` is not a single-byte character",
                self.delimiter
            ))
        })
    }

    pub fn csv_loader(&self, patterns: Vec<String>) -> Result<CsvLoader, Error> {
        let mut builder = CsvLoaderBuilder::new(patterns)?
            .delimiter(self.delimiter_byte()?)
            .required_columns(self.required_columns.clone());
        if let Some(column) = &self.source_column {
            builder = builder.source_column(column.clone());
        }
        Ok(builder.build()?)
    }

    pub fn embedding_model(&self) -> Result<Arc<dyn EmbeddingModel>, ConfigError> {
        let cfg = &self.embedding;
        Ok(match cfg.provider {
            Provider::Ollama => Arc::new(OllamaEmbedding::new(
                cfg.api_url
                    .as_deref()
                    .unwrap_or(embedding_providers::ollama::DEFAULT_URL),
                cfg.model(),
            )),
            Provider::OpenAI => Arc::new(OpenAIEmbedding::new(
                api_key("OpenAI", cfg.api_key_var.as_deref())?,
                cfg.api_url
                    .clone()
                    .unwrap_or_else(|| embedding_providers::openai::DEFAULT_URL.to_string()),
                cfg.model().to_string(),
            )),
        })
    }

    pub fn embedder(&self) -> Result<Embedder, Error> {
        Ok(Embedder::new(self.embedding_model()?, self.workers)?)
    }

    pub fn completion_model(&self) -> Result<Arc<dyn CompletionModel>, ConfigError> {
        let cfg = &self.completion;
        Ok(match cfg.provider {
            Provider::Ollama => Arc::new(Ollama::new(
                cfg.api_url
                    .as_deref()
                    .unwrap_or(completions::ollama::DEFAULT_URL),
                cfg.model(),
                cfg.temperature,
            )),
            Provider::OpenAI => Arc::new(OpenAI::new(
                api_key("OpenAI", cfg.api_key_var.as_deref())?,
                cfg.api_url
                    .clone()
                    .unwrap_or_else(|| completions::openai::URL.to_string()),
                cfg.model().to_string(),
                cfg.temperature,
            )),
        })
    }

    /// Question answering over `store`, which must have been built with this
    /// config's embedding model.
    pub fn retrieval_qa(&self, store: Arc<dyn VectorStore>) -> Result<RetrievalQa, Error> {
        Ok(
            RetrievalQa::new(self.embedder()?, store, self.completion_model()?)
                .with_prompt(self.prompt()?)
                .with_top_k(self.top_k),
        )
    }
}

fn api_key(provider: &'static str, var: Option<&str>) -> Result<String, ConfigError> {
    let var = var.ok_or(ConfigError::NoApiKeyVar(provider))?;
    std::env::var(var).map_err(|_| {
        error!("Missing API key in `{var}`");
        ConfigError::MissingApiKey {
            provider,
            var: var.to_string(),
        }
    })
}
