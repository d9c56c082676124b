//! Brute-force in-process vector store (C6).
//!
//! Exact cosine similarity over every embedding in a project; this is the
//! store's reference implementation; the recall ≥ 0.99 bar spec.md sets
//! for approximate backends is trivially met because this one is exact.

use crate::domain::error::Result;
use crate::domain::ports::{cosine_similarity, SimilarityHit, VectorStorePort};
use crate::domain::types::CodeEmbedding;
use async_trait::async_trait;
use dashmap::DashMap;

/// Keyed by project id, then by chunk id.
#[derive(Default)]
pub struct InMemoryVectorStore {
    projects: DashMap<String, DashMap<String, CodeEmbedding>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A project's embeddings, for adapters that snapshot to disk.
    pub fn snapshot(&self, project_id: &str) -> Vec<CodeEmbedding> {
        self.projects
            .get(project_id)
            .map(|p| p.iter().map(|e| e.value().clone()).collect())
            .unwrap_or_default()
    }

    /// Replace a project's entire embedding set (used when restoring a
    /// snapshot).
    pub fn restore(&self, project_id: &str, embeddings: Vec<CodeEmbedding>) {
        let map = DashMap::new();
        for embedding in embeddings {
            map.insert(embedding.chunk_id.clone(), embedding);
        }
        self.projects.insert(project_id.to_string(), map);
    }
}

#[async_trait]
impl VectorStorePort for InMemoryVectorStore {
    async fn save_many(&self, project_id: &str, embeddings: &[CodeEmbedding]) -> Result<()> {
        let entry = self.projects.entry(project_id.to_string()).or_default();
        for embedding in embeddings {
            entry.insert(embedding.chunk_id.clone(), embedding.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        project_id: &str,
        query_vector: &[f32],
        k: usize,
        threshold: f32,
        schema_version: i32,
    ) -> Result<Vec<SimilarityHit>> {
        let Some(project) = self.projects.get(project_id) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<SimilarityHit> = project
            .iter()
            .filter(|entry| entry.value().schema_version == schema_version)
            .map(|entry| SimilarityHit {
                chunk_id: entry.key().clone(),
                similarity: cosine_similarity(query_vector, &entry.value().vector),
            })
            .filter(|hit| hit.similarity >= threshold)
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn delete_chunks(&self, project_id: &str, chunk_ids: &[String]) -> Result<()> {
        if let Some(project) = self.projects.get(project_id) {
            for chunk_id in chunk_ids {
                project.remove(chunk_id);
            }
        }
        Ok(())
    }
}
