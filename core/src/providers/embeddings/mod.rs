pub(crate) mod ollama;
pub(crate) mod openai;

pub use ollama::OllamaEmbeddingModel as OllamaEmbedding;
pub use openai::OpenAIEmbeddingModel as OpenAIEmbedding;
