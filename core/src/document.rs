use std::collections::BTreeMap;

/// Metadata key holding the file (or source column value) a document came from.
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the 0-based row index a document was read from.
pub const ROW_KEY: &str = "row";

/// A single loaded record, one per spreadsheet row.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Document {
    pub id: usize,
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: usize, content: String) -> Self {
        Self {
            id,
            content,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A bounded slice of a [`Document`]'s content, the unit of embedding and retrieval.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Chunk {
    /// Id of the document this chunk was cut from.
    pub document_id: usize,
    /// Position of the chunk within its document, starting at 0.
    pub index: usize,
    pub content: String,
}

impl Chunk {
    /// Stable identifier of the chunk, `"{document}:{index}"`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.document_id, self.index)
    }
}
