use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Embedding of a chunk
pub struct Embedding {
    /// A unique identifier for the embedding, the id of the chunk it was made from.
    pub id: String,
    /// The numerical embedding vector of the chunk's content.
    pub embedded_data: Vec<f64>,
    /// The raw text data from which the embedding was generated.
    pub raw_data: String,
}

impl Embedding {
    pub fn dimension(&self) -> usize {
        self.embedded_data.len()
    }
}
