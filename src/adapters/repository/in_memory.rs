//! In-process `ProjectRepository` implementation (C7).
//!
//! Reference adapter used by tests and by callers that don't need durable
//! storage. "Atomic per batch" is naturally satisfied here: a batch is
//! applied to the in-memory maps in one pass with nothing else able to
//! observe a partial write, since each map mutation is a single `DashMap`
//! operation.

use crate::domain::error::{Error, Result};
use crate::domain::ports::{ChunkStore, FileStore, MerkleStore, Page, PrdLinkStore, ProjectStore};
use crate::domain::types::{CodeChunk, CodeFile, MerkleNode, Project};
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Default)]
pub struct InMemoryProjectRepository {
    projects: DashMap<String, Project>,
    files: DashMap<String, CodeFile>,
    chunks: DashMap<String, CodeChunk>,
    merkle_nodes: DashMap<String, Vec<MerkleNode>>,
    prd_links: DashMap<String, String>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectRepository {
    async fn create(&self, project: Project) -> Result<Project> {
        if self.projects.contains_key(&project.id) {
            return Err(Error::persistence(format!(
                "project {} already exists",
                project.id
            )));
        }
        self.projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.projects.get(id).map(|p| p.clone()))
    }

    async fn find_by_url_branch(&self, url: &str, branch: &str) -> Result<Option<Project>> {
        Ok(self
            .projects
            .iter()
            .find(|p| p.repository_url == url && p.branch == branch)
            .map(|p| p.clone()))
    }

    async fn update(&self, project: Project) -> Result<Project> {
        if !self.projects.contains_key(&project.id) {
            return Err(Error::not_found("project", &project.id));
        }
        self.projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.projects.remove(id);
        let file_ids: Vec<String> = self
            .files
            .iter()
            .filter(|f| f.project_id == id)
            .map(|f| f.id.clone())
            .collect();
        for file_id in &file_ids {
            self.files.remove(file_id);
        }
        let chunk_ids: Vec<String> = self
            .chunks
            .iter()
            .filter(|c| c.project_id == id)
            .map(|c| c.id.clone())
            .collect();
        for chunk_id in &chunk_ids {
            self.chunks.remove(chunk_id);
        }
        self.merkle_nodes.remove(id);
        Ok(())
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Page<Project>> {
        let mut all: Vec<Project> = self.projects.iter().map(|p| p.clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(Page { items, total })
    }
}

#[async_trait]
impl FileStore for InMemoryProjectRepository {
    async fn save_many(&self, files: &[CodeFile]) -> Result<()> {
        for file in files {
            self.files.insert(file.id.clone(), file.clone());
        }
        Ok(())
    }

    async fn add_one(&self, file: CodeFile) -> Result<CodeFile> {
        self.files.insert(file.id.clone(), file.clone());
        Ok(file)
    }

    async fn list_by_project(&self, project_id: &str) -> Result<Vec<CodeFile>> {
        Ok(self
            .files
            .iter()
            .filter(|f| f.project_id == project_id)
            .map(|f| f.clone())
            .collect())
    }

    async fn find_by_path(&self, project_id: &str, path: &str) -> Result<Option<CodeFile>> {
        Ok(self
            .files
            .iter()
            .find(|f| f.project_id == project_id && f.path == path)
            .map(|f| f.clone()))
    }

    async fn update_parsed_flag(
        &self,
        file_id: &str,
        parsed: bool,
        parse_error: Option<String>,
    ) -> Result<()> {
        match self.files.get_mut(file_id) {
            Some(mut file) => {
                file.parsed = parsed;
                file.parse_error = parse_error;
                Ok(())
            }
            None => Err(Error::not_found("file", file_id)),
        }
    }

    async fn delete_many(&self, file_ids: &[String]) -> Result<()> {
        for file_id in file_ids {
            self.files.remove(file_id);
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkStore for InMemoryProjectRepository {
    async fn save_many(&self, chunks: &[CodeChunk]) -> Result<()> {
        for chunk in chunks {
            self.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn list_by_project(&self, project_id: &str, offset: u64, limit: u64) -> Result<Page<CodeChunk>> {
        let mut all: Vec<CodeChunk> = self
            .chunks
            .iter()
            .filter(|c| c.project_id == project_id)
            .map(|c| c.clone())
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn list_by_file(&self, file_id: &str) -> Result<Vec<CodeChunk>> {
        Ok(self
            .chunks
            .iter()
            .filter(|c| c.file_id == file_id)
            .map(|c| c.clone())
            .collect())
    }

    async fn delete_by_files(&self, project_id: &str, file_ids: &[String]) -> Result<Vec<String>> {
        let to_remove: Vec<String> = self
            .chunks
            .iter()
            .filter(|c| c.project_id == project_id && file_ids.contains(&c.file_id))
            .map(|c| c.id.clone())
            .collect();
        for chunk_id in &to_remove {
            self.chunks.remove(chunk_id);
        }
        Ok(to_remove)
    }
}

#[async_trait]
impl MerkleStore for InMemoryProjectRepository {
    async fn save_root_hash(&self, project_id: &str, root_hash: Option<&str>) -> Result<()> {
        match self.projects.get_mut(project_id) {
            Some(mut project) => {
                project.merkle_root_hash = root_hash.map(str::to_string);
                Ok(())
            }
            None => Err(Error::not_found("project", project_id)),
        }
    }

    async fn save_nodes(&self, project_id: &str, nodes: &[MerkleNode]) -> Result<()> {
        self.merkle_nodes
            .insert(project_id.to_string(), nodes.to_vec());
        Ok(())
    }

    async fn load_nodes(&self, project_id: &str) -> Result<Vec<MerkleNode>> {
        Ok(self
            .merkle_nodes
            .get(project_id)
            .map(|n| n.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl PrdLinkStore for InMemoryProjectRepository {
    async fn link_prd_request(&self, prd_request_id: &str, project_id: &str) -> Result<()> {
        self.prd_links
            .insert(prd_request_id.to_string(), project_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{IndexingStatus, SourceSystem};

    fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            repository_url: "https://example.test/repo".to_string(),
            branch: "main".to_string(),
            source_system: SourceSystem::HostedGitA,
            merkle_root_hash: None,
            total_files: 0,
            indexed_files: 0,
            total_chunks: 0,
            indexing_status: IndexingStatus::Pending,
            progress: 0,
            last_indexed_at: None,
            detected_languages: Default::default(),
            detected_frameworks: Vec::new(),
            architecture_patterns: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let repo = InMemoryProjectRepository::new();
        repo.create(project("p1")).await.unwrap();
        let found = repo.find_by_id("p1").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let repo = InMemoryProjectRepository::new();
        repo.create(project("p1")).await.unwrap();
        assert!(repo.create(project("p1")).await.is_err());
    }

    #[tokio::test]
    async fn delete_cascades_to_files_and_chunks() {
        let repo = InMemoryProjectRepository::new();
        repo.create(project("p1")).await.unwrap();
        FileStore::save_many(
            &repo,
            &[CodeFile {
                id: "f1".to_string(),
                project_id: "p1".to_string(),
                path: "a.py".to_string(),
                content_hash: "h".to_string(),
                size_bytes: 10,
                language: None,
                parsed: false,
                parse_error: None,
                created_at: 0,
                updated_at: 0,
            }],
        )
        .await
        .unwrap();
        repo.delete("p1").await.unwrap();
        assert!(FileStore::list_by_project(&repo, "p1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn merkle_nodes_round_trip() {
        let repo = InMemoryProjectRepository::new();
        repo.create(project("p1")).await.unwrap();
        let nodes = vec![MerkleNode {
            hash: "h1".to_string(),
            path: "a.py".to_string(),
            is_leaf: true,
            file_id: Some("f1".to_string()),
            left_hash: None,
            right_hash: None,
        }];
        MerkleStore::save_nodes(&repo, "p1", &nodes).await.unwrap();
        let loaded = MerkleStore::load_nodes(&repo, "p1").await.unwrap();
        assert_eq!(loaded, nodes);
    }
}
