use thiserror::Error;
use tracing::info;

use crate::document::{Chunk, Document};

pub const DEFAULT_CHUNK_SIZE: usize = 200;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("Chunk overlap ({overlap}) must be smaller than the chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// Cuts text into fixed-size character windows, each sharing `chunk_overlap`
/// characters with the window before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for CharacterSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl CharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, SplitError> {
        if chunk_size == 0 {
            return Err(SplitError::ZeroChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(SplitError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits `text` into windows of at most `chunk_size` characters.
    ///
    /// Text no longer than `chunk_size` comes back as a single window, empty
    /// text as none.
    pub fn split_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        // byte offset of every char boundary, including the end of the string
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = boundaries.len() - 1;
        if char_count == 0 {
            return vec![];
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut windows = vec![];
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            windows.push(&text[boundaries[start]..boundaries[end]]);
            if end == char_count {
                break;
            }
            start += step;
        }
        windows
    }

    /// Splits every document, keeping chunk order within each document.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .enumerate()
                    .map(|(index, content)| Chunk {
                        document_id: doc.id,
                        index,
                        content: content.to_string(),
                    })
            })
            .collect();
        info!("Split {} documents into {} chunks", documents.len(), chunks.len());
        chunks
    }
}
