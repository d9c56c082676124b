//! JSON-snapshotting vector store (C6).
//!
//! Wraps [`InMemoryVectorStore`] with a write-through snapshot to a
//! `{dir}/{project_id}.json` file per project, so a process restart can
//! rehydrate before serving searches. Mirrors the teacher's pattern of
//! layering a persistence adapter over an in-process index rather than
//! reimplementing similarity search per backend.

use super::in_memory::InMemoryVectorStore;
use crate::domain::error::{Error, Result};
use crate::domain::ports::{SimilarityHit, VectorStorePort};
use crate::domain::types::CodeEmbedding;
use async_trait::async_trait;
use std::path::PathBuf;

pub struct FilesystemVectorStore {
    inner: InMemoryVectorStore,
    dir: PathBuf,
}

impl FilesystemVectorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: InMemoryVectorStore::new(),
            dir: dir.into(),
        }
    }

    fn snapshot_path(&self, project_id: &str) -> PathBuf {
        self.dir.join(format!("{project_id}.json"))
    }

    /// Load a project's snapshot from disk into memory, if present. A
    /// missing file is not an error: it means the project has no saved
    /// embeddings yet.
    pub async fn load_project(&self, project_id: &str) -> Result<()> {
        let path = self.snapshot_path(project_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::from(e)),
        };
        let embeddings: Vec<CodeEmbedding> = serde_json::from_slice(&bytes)?;
        self.inner.restore(project_id, embeddings);
        Ok(())
    }

    async fn persist_project(&self, project_id: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let embeddings = self.inner.snapshot(project_id);
        let bytes = serde_json::to_vec(&embeddings)?;
        tokio::fs::write(self.snapshot_path(project_id), bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorStorePort for FilesystemVectorStore {
    async fn save_many(&self, project_id: &str, embeddings: &[CodeEmbedding]) -> Result<()> {
        self.inner.save_many(project_id, embeddings).await?;
        self.persist_project(project_id).await
    }

    async fn search(
        &self,
        project_id: &str,
        query_vector: &[f32],
        k: usize,
        threshold: f32,
        schema_version: i32,
    ) -> Result<Vec<SimilarityHit>> {
        self.inner
            .search(project_id, query_vector, k, threshold, schema_version)
            .await
    }

    async fn delete_chunks(&self, project_id: &str, chunk_ids: &[String]) -> Result<()> {
        self.inner.delete_chunks(project_id, chunk_ids).await?;
        self.persist_project(project_id).await
    }
}
