pub mod prompt;

pub use prompt::PromptTemplate;

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::{
    completion::{CompletionError, CompletionModel},
    embeddings::{EmbedderError, Embedder},
    vector_store::{SearchHit, VectorStore, VectorStoreError},
};

pub const DEFAULT_TOP_K: usize = 4;
const CONTEXT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("Failed to embed the question: {0}")]
    Embedding(#[from] EmbedderError),
    #[error("Failed to retrieve context: {0}")]
    Retrieval(#[from] VectorStoreError),
    #[error("Language model call failed: {0}")]
    Completion(#[from] CompletionError),
    #[error("Language model returned an empty answer")]
    EmptyAnswer,
    #[error("Prompt template is missing the {0} placeholder")]
    InvalidTemplate(&'static str),
    #[error("Question is empty")]
    EmptyQuestion,
}

/// Outcome of one question.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// The model answered; `sources` are the chunks it was shown, nearest first.
    Found {
        text: String,
        sources: Vec<SearchHit>,
    },
    /// The model call failed or its reply was unusable.
    NoAnswer {
        reason: String,
        sources: Vec<SearchHit>,
    },
}

impl Answer {
    pub fn text(&self) -> Option<&str> {
        match self {
            Answer::Found { text, .. } => Some(text),
            Answer::NoAnswer { .. } => None,
        }
    }

    pub fn sources(&self) -> &[SearchHit] {
        match self {
            Answer::Found { sources, .. } | Answer::NoAnswer { sources, .. } => sources,
        }
    }
}

/// Retrieval-augmented answering: embed the question, fetch the nearest
/// chunks and "stuff" them into a single prompt.
///
/// The embedder has to use the model the store was built with.
pub struct RetrievalQa {
    embedder: Embedder,
    store: Arc<dyn VectorStore>,
    model: Arc<dyn CompletionModel>,
    prompt: PromptTemplate,
    top_k: usize,
}

impl RetrievalQa {
    pub fn new(embedder: Embedder, store: Arc<dyn VectorStore>, model: Arc<dyn CompletionModel>) -> Self {
        info!("Initializing QA chain with `{}`", model.name());
        Self {
            embedder,
            store,
            model,
            prompt: PromptTemplate::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    /// Number of chunks retrieved per question, at least 1.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// The chunks nearest to `question`, nearest first.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchHit>, AnswerError> {
        let query = self.embedder.embed_query(question).await?;
        Ok(self.store.top_n(&query, self.top_k).await?)
    }

    /// Answer `question` from the indexed chunks.
    ///
    /// Failing to embed the question or search the index is an error; a failed
    /// or unusable model reply is reported as [`Answer::NoAnswer`].
    #[instrument(skip(self), fields(top_k = self.top_k))]
    pub async fn ask(&self, question: &str) -> Result<Answer, AnswerError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }

        let sources = self.retrieve(question).await.inspect_err(|e| {
            error!("Error retrieving context: {e}");
        })?;
        let context = sources
            .iter()
            .map(|hit| hit.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);
        let prompt = self.prompt.format(&context, question);

        match self.generate(&prompt).await {
            Ok(text) => {
                info!(sources = sources.len(), "Answered question");
                Ok(Answer::Found { text, sources })
            }
            Err(e) => {
                error!("Error during QA chain invocation: {e}");
                Ok(Answer::NoAnswer {
                    reason: e.to_string(),
                    sources,
                })
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, AnswerError> {
        let reply = self.model.send(prompt).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(AnswerError::EmptyAnswer);
        }
        Ok(reply.to_string())
    }
}
