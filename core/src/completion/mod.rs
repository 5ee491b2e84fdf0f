use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("Provider error -> HTTP Status {0}: {1}")]
    ProviderError(u16, String),
    #[error("RequestError: {0}")]
    RequestError(String),
    #[error("ParseError: {0}")]
    ParseError(String),
}

/// Token accounting reported by a provider, when it reports any.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

/// A language model answering a fully rendered prompt.
///
/// One request, one response: implementations do not retry.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    fn name(&self) -> &str;

    /// Send the prompt to the model and return the text of its reply.
    async fn send(&self, prompt: &str) -> Result<String, CompletionError>;
}
