use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::completion::{CompletionError, CompletionModel};
use crate::document::Chunk;
use crate::embeddings::{model::EmbeddingModel, EmbedderError};

/// Deterministic bag-of-words model: each lowercase word is hashed into a
/// bucket and the counts are L2-normalized.
pub struct HashEmbedding {
    dimension: usize,
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self { dimension: 32 }
    }
}

impl HashEmbedding {
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingModel for HashEmbedding {
    fn name(&self) -> &str {
        "hash-embedding"
    }

    async fn embed(&self, data: &str) -> Result<Vec<f64>, EmbedderError> {
        if self.dimension == 0 {
            return Ok(vec![]);
        }
        let mut vector = vec![0.0; self.dimension];
        for word in data
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = (fnv1a(&word.to_lowercase()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}

/// Fails on any text containing `trigger`, otherwise behaves like [`HashEmbedding`].
pub struct FailingEmbedding {
    trigger: String,
    inner: HashEmbedding,
}

impl FailingEmbedding {
    pub fn new(trigger: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            inner: HashEmbedding::default(),
        }
    }
}

#[async_trait]
impl EmbeddingModel for FailingEmbedding {
    fn name(&self) -> &str {
        "hash-embedding"
    }

    async fn embed(&self, data: &str) -> Result<Vec<f64>, EmbedderError> {
        if data.contains(&self.trigger) {
            return Err(EmbedderError::ProviderError(format!(
                "model error on `{}`",
                self.trigger
            )));
        }
        self.inner.embed(data).await
    }
}

/// Finishes longer texts first so workers complete out of input order.
/// Embeds a text as `[len, 1.0]`.
pub struct ShuffledEmbedding;

#[async_trait]
impl EmbeddingModel for ShuffledEmbedding {
    fn name(&self) -> &str {
        "shuffled"
    }

    async fn embed(&self, data: &str) -> Result<Vec<f64>, EmbedderError> {
        let delay = 20u64.saturating_sub(data.len() as u64);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(vec![data.len() as f64, 1.0])
    }
}

/// One chunk per text, each from its own document.
pub fn chunks_from(texts: &[&str]) -> Vec<Chunk> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| Chunk {
            document_id: i,
            index: 0,
            content: (*t).to_string(),
        })
        .collect()
}

/// Completion model that replays a fixed reply and records every prompt it receives.
pub struct ScriptedCompletion {
    reply: Result<String, CompletionError>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn answering(answer: &str) -> Self {
        Self {
            reply: Ok(answer.to_string()),
            prompts: Mutex::new(vec![]),
        }
    }

    pub fn failing(error: CompletionError) -> Self {
        Self {
            reply: Err(error),
            prompts: Mutex::new(vec![]),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionModel for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}
