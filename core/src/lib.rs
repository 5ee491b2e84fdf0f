//! # reviewqa
//!
//! Retrieval-augmented question answering over a spreadsheet of customer
//! reviews.
//!
//! Rows are loaded as documents, cut into overlapping character windows,
//! embedded by a pool of workers sharing one model and stored in a flat
//! cosine-similarity index that is saved to disk. Questions are embedded with
//! the same model, the nearest chunks are "stuffed" into a prompt and a
//! language model answers.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reviewqa::{config::Config, pipeline::IndexPipeline};
//!
//! # async fn run() -> Result<(), reviewqa::error::Error> {
//! let config = Config::default();
//! let pipeline = IndexPipeline::new(
//!     config.csv_loader(vec!["data/reviews.csv".to_string()])?,
//!     config.splitter()?,
//!     config.embedder()?,
//! );
//! let store = pipeline.open_or_build(&config.index_dir, false).await?;
//!
//! let qa = config.retrieval_qa(Arc::new(store))?;
//! let answer = qa.ask("What do customers say about shipping?").await?;
//! println!("{}", answer.text().unwrap_or("no answer"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! Name | Description | Default?
//! ---|---|---
//! `postgres` | enables inserting imported reviews into PostgreSQL | No

/// Language model interface
pub mod completion;

/// Settings and the factories built from them
pub mod config;

/// Documents and chunks
pub mod document;

/// Text embeddings and the encoding worker pool
pub mod embeddings;

/// Error types for all library operations
pub mod error;

/// Review spreadsheet import and preprocessing
pub mod import;

/// Resource loading utilities
pub mod loader;

/// Load, split, encode and index in one run
pub mod pipeline;

/// Builtin completion and embedding model providers
pub mod providers;

/// Retrieval and answering
pub mod qa;

pub mod splitter;

/// Vector storage and retrieval
pub mod vector_store;

#[cfg(test)]
mod test_util;
