//! Persistence port (C7).
//!
//! Modeled as narrow, capability-segregated traits per spec.md §4.7 rather
//! than one God-trait; `ProjectRepository` is the supertrait an adapter
//! implements to satisfy the orchestrator and search service in full.

use crate::domain::error::Result;
use crate::domain::types::{CodeChunk, CodeFile, MerkleNode, Project};
use async_trait::async_trait;

/// A page of results plus the total row count, for paginated listings.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The rows for this page.
    pub items: Vec<T>,
    /// Total row count across all pages, not just this one.
    pub total: u64,
}

/// Project CRUD.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(&self, project: Project) -> Result<Project>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Project>>;
    async fn find_by_url_branch(&self, url: &str, branch: &str) -> Result<Option<Project>>;
    async fn update(&self, project: Project) -> Result<Project>;
    /// Cascades to the project's files, chunks, embeddings, and Merkle nodes.
    async fn delete(&self, id: &str) -> Result<()>;
    async fn list(&self, offset: u64, limit: u64) -> Result<Page<Project>>;
}

/// File rows within a project.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Atomic per batch: partial failure leaves prior state intact.
    async fn save_many(&self, files: &[CodeFile]) -> Result<()>;
    async fn add_one(&self, file: CodeFile) -> Result<CodeFile>;
    async fn list_by_project(&self, project_id: &str) -> Result<Vec<CodeFile>>;
    async fn find_by_path(&self, project_id: &str, path: &str) -> Result<Option<CodeFile>>;
    async fn update_parsed_flag(
        &self,
        file_id: &str,
        parsed: bool,
        parse_error: Option<String>,
    ) -> Result<()>;
    /// Deletes the rows for `file_ids`; callers cascade chunks/embeddings
    /// separately via [`ChunkStore::delete_by_project`].
    async fn delete_many(&self, file_ids: &[String]) -> Result<()>;
}

/// Chunk rows within a project.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Atomic per batch: partial failure leaves prior state intact.
    async fn save_many(&self, chunks: &[CodeChunk]) -> Result<()>;
    async fn list_by_project(&self, project_id: &str, offset: u64, limit: u64) -> Result<Page<CodeChunk>>;
    async fn list_by_file(&self, file_id: &str) -> Result<Vec<CodeChunk>>;
    /// Used for full re-index: removes every chunk row for `file_ids`.
    async fn delete_by_files(&self, project_id: &str, file_ids: &[String]) -> Result<Vec<String>>;
}

/// Merkle persistence: the tree must be reconstructable from this set alone.
#[async_trait]
pub trait MerkleStore: Send + Sync {
    async fn save_root_hash(&self, project_id: &str, root_hash: Option<&str>) -> Result<()>;
    async fn save_nodes(&self, project_id: &str, nodes: &[MerkleNode]) -> Result<()>;
    async fn load_nodes(&self, project_id: &str) -> Result<Vec<MerkleNode>>;
}

/// Thin PRD-generator linkage: out of scope beyond this one binding.
#[async_trait]
pub trait PrdLinkStore: Send + Sync {
    async fn link_prd_request(&self, prd_request_id: &str, project_id: &str) -> Result<()>;
}

/// Full persistence contract the orchestrator and search service depend on.
pub trait ProjectRepository:
    ProjectStore + FileStore + ChunkStore + MerkleStore + PrdLinkStore
{
}

impl<T> ProjectRepository for T where
    T: ProjectStore + FileStore + ChunkStore + MerkleStore + PrdLinkStore
{
}
