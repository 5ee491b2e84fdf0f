pub mod builtins;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::document::Document;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Invalid glob-pattern")]
    InvalidGlobPattern(#[from] glob::PatternError),
    #[error("No files matched `{0}`")]
    NoMatchingFiles(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} has no header row")]
    MissingHeader { path: PathBuf },
    #[error("{path} is missing required columns: {}", columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },
    #[error("No records found in the loaded files")]
    NoRecords,
    #[error("Loader task failed: {0}")]
    Task(String),
}

/// A source of [`Document`]s.
///
/// Loading is all-or-nothing, a loader never hands back a partial result.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self) -> Result<Vec<Document>, LoaderError>;
}
