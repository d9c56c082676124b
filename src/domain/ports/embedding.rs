//! Embedding generation port (C5).
//!
//! Grounded in the teacher's `domain::ports::embedding::EmbeddingProvider`:
//! same shape (single + batch embed, declared dimension, model name), with
//! `embed_one`/`embed_many` naming and the batch-size contract spec.md adds.

use crate::domain::error::Result;
use async_trait::async_trait;

/// Abstract embedding generation, implemented by the local, remote, and
/// hybrid adapters.
///
/// Every returned vector has length [`EmbeddingPort::dimension`]; batch
/// output order matches input order.
#[async_trait]
pub trait EmbeddingPort: Send + Sync {
    /// Embed a single text. `Err(Error::InvalidInput)` on an empty string.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving order. `Err(Error::InvalidInput)`
    /// on an empty batch; `Err(Error::BatchTooLarge)` if `texts.len()`
    /// exceeds the provider's declared maximum.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The fixed vector length every embedding produced by this port has.
    fn dimension(&self) -> usize;

    /// Stable model identifier, persisted on [`crate::domain::types::CodeEmbedding`].
    fn model_name(&self) -> &str;

    /// The largest batch this provider accepts in one `embed_many` call.
    fn max_batch_size(&self) -> usize {
        50
    }
}
