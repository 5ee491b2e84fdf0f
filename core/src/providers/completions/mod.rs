pub(crate) mod ollama;
pub(crate) mod openai;

pub use ollama::OllamaCompletionModel as Ollama;
pub use openai::OpenAICompletionModel as OpenAI;
