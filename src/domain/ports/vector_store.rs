//! Vector similarity storage port (C6).

use crate::domain::error::Result;
use crate::domain::types::CodeEmbedding;
use async_trait::async_trait;

/// A single similarity hit: chunk id paired with its cosine similarity to
/// the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    pub chunk_id: String,
    pub similarity: f32,
}

/// Persists embeddings and answers similarity queries.
///
/// Implementations may back this with an exact or approximate index; the
/// engine only requires recall ≥ 0.99 against brute-force cosine for k ≤ 50.
#[async_trait]
pub trait VectorStorePort: Send + Sync {
    /// Upsert embeddings by chunk id. Idempotent: re-saving the same chunk
    /// id replaces its vector.
    async fn save_many(&self, project_id: &str, embeddings: &[CodeEmbedding]) -> Result<()>;

    /// Top-`k` cosine-similarity search within `project_id`, descending by
    /// similarity, ties broken by chunk id ascending, filtering out hits
    /// below `threshold`. Never returns an embedding whose schema version
    /// differs from `schema_version`.
    async fn search(
        &self,
        project_id: &str,
        query_vector: &[f32],
        k: usize,
        threshold: f32,
        schema_version: i32,
    ) -> Result<Vec<SimilarityHit>>;

    /// Remove every embedding belonging to `chunk_ids` (used when a file's
    /// chunks are replaced or deleted).
    async fn delete_chunks(&self, project_id: &str, chunk_ids: &[String]) -> Result<()>;
}

/// Cosine similarity between two equal-length vectors, in `[-1, 1]`.
/// Returns `0.0` if either vector is all-zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
