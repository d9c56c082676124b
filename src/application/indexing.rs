//! The indexing use case (C8): ingest a file list, diff the Merkle tree,
//! parse changed files, embed their chunks, and persist the result.
//!
//! Grounded in the shape of the teacher's `services::indexing::IndexingService`
//! (a sequential per-file pipeline that records, rather than aborts on, a
//! single file's failure), generalized to the nine-step algorithm and
//! concurrency model spec.md §4.8/§5 require.

use crate::domain::chunking;
use crate::domain::error::{Error, Result};
use crate::domain::hashing::hash_hex;
use crate::domain::language;
use crate::domain::merkle::MerkleTree;
use crate::domain::ports::{ChunkStore, EmbeddingPort, FileStore, MerkleStore, ProjectStore, VectorStorePort};
use crate::domain::types::{
    CodeChunk, CodeEmbedding, CodeFile, FileFailure, IndexingReport, IndexingStatus, IngestRecord,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use validator::Validate;

const EMBEDDING_SCHEMA_VERSION: i32 = 1;
const MAX_CONCURRENT_TASKS: usize = 8;

/// Backoff parameters for the remote-provider rate-limit retry loop.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling the exponential backoff delay never exceeds.
    pub max_delay: Duration,
    /// Maximum retry attempts before giving up.
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

/// Drives the ingest → chunk → embed → persist pipeline for one project at
/// a time, rejecting concurrent runs against the same project id.
pub struct IndexingOrchestrator {
    repository: Arc<dyn ProjectStore>,
    files: Arc<dyn FileStore>,
    chunks: Arc<dyn ChunkStore>,
    merkle: Arc<dyn MerkleStore>,
    vector_store: Arc<dyn VectorStorePort>,
    embedding: Arc<dyn EmbeddingPort>,
    backoff: BackoffPolicy,
    in_progress: DashMap<String, ()>,
}

impl IndexingOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Arc<dyn ProjectStore>,
        files: Arc<dyn FileStore>,
        chunks: Arc<dyn ChunkStore>,
        merkle: Arc<dyn MerkleStore>,
        vector_store: Arc<dyn VectorStorePort>,
        embedding: Arc<dyn EmbeddingPort>,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            repository,
            files,
            chunks,
            merkle,
            vector_store,
            embedding,
            backoff,
            in_progress: DashMap::new(),
        }
    }

    /// Run the nine-step indexing algorithm for `project_id` over `records`,
    /// the latest known state of the repository.
    pub async fn run(
        &self,
        project_id: &str,
        records: Vec<IngestRecord>,
        batch_size: usize,
        cancel: CancellationToken,
    ) -> Result<IndexingReport> {
        if self.in_progress.insert(project_id.to_string(), ()).is_some() {
            return Err(Error::AlreadyIndexing);
        }
        let result = self.run_inner(project_id, records, batch_size, cancel).await;
        self.in_progress.remove(project_id);
        result
    }

    async fn run_inner(
        &self,
        project_id: &str,
        mut records: Vec<IngestRecord>,
        batch_size: usize,
        cancel: CancellationToken,
    ) -> Result<IndexingReport> {
        for record in &records {
            record
                .validate()
                .map_err(|e| Error::invalid_input(format!("{}: {e}", record.path)))?;
        }

        let mut project = self
            .repository
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| Error::not_found("project", project_id))?;
        project.indexing_status = IndexingStatus::Indexing;
        project.progress = 0;
        self.repository.update(project.clone()).await?;

        // Step 1: previous tree from persisted nodes.
        let previous_nodes = self.merkle.load_nodes(project_id).await?;
        let old_tree = MerkleTree::from_nodes(project.merkle_root_hash.clone(), previous_nodes);

        // Step 2: new tree over the input, sorted by path for determinism.
        records.sort_by(|a, b| a.path.cmp(&b.path));
        let pairs: Vec<(String, String)> = records
            .iter()
            .map(|r| (r.path.clone(), r.sha.clone()))
            .collect();
        let new_tree = MerkleTree::build(&pairs);
        let diff = MerkleTree::diff(&old_tree, &new_tree);

        if diff.changed_paths.is_empty() && diff.new_paths.is_empty() && diff.deleted_paths.is_empty()
            && old_tree.root_hash().is_some()
        {
            project.indexing_status = IndexingStatus::Completed;
            self.repository.update(project).await?;
            return Ok(IndexingReport::default());
        }

        let existing_files = self.files.list_by_project(project_id).await?;
        let mut existing_by_path = std::collections::HashMap::new();
        for file in existing_files {
            existing_by_path.insert(file.path.clone(), file);
        }

        // Step 3: delete chunks/embeddings/files for deleted ∪ changed.
        let mut to_remove: Vec<String> = diff.deleted_paths.clone();
        to_remove.extend(diff.changed_paths.iter().cloned());
        let remove_file_ids: Vec<String> = to_remove
            .iter()
            .filter_map(|path| existing_by_path.get(path).map(|f| f.id.clone()))
            .collect();
        if !remove_file_ids.is_empty() {
            let removed_chunk_ids = self
                .chunks
                .delete_by_files(project_id, &remove_file_ids)
                .await?;
            self.vector_store
                .delete_chunks(project_id, &removed_chunk_ids)
                .await?;
            self.files.delete_many(&remove_file_ids).await?;
        }

        if cancel.is_cancelled() {
            return self.cancel_run(project, "cancelled before save").await;
        }

        // Step 4: save file rows for new ∪ changed.
        let mut to_save: Vec<String> = diff.new_paths.clone();
        to_save.extend(diff.changed_paths.iter().cloned());
        let now = now_timestamp();
        let record_by_path: std::collections::HashMap<&str, &IngestRecord> =
            records.iter().map(|r| (r.path.as_str(), r)).collect();

        let mut saved_files = Vec::new();
        for path in &to_save {
            let Some(record) = record_by_path.get(path.as_str()) else {
                continue;
            };
            let file_id = existing_by_path
                .get(path)
                .map(|f| f.id.clone())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            saved_files.push(CodeFile {
                id: file_id,
                project_id: project_id.to_string(),
                path: path.clone(),
                content_hash: record.sha.clone(),
                size_bytes: record.size,
                language: language::detect(path),
                parsed: false,
                parse_error: None,
                created_at: now,
                updated_at: now,
            });
        }
        self.files.save_many(&saved_files).await?;

        // Step 5: parse each saved file; non-fatal per file.
        let mut failures = Vec::new();
        let mut all_chunks: Vec<CodeChunk> = Vec::new();
        let mut processed_file_ids = Vec::new();

        for file in &saved_files {
            processed_file_ids.push(file.id.clone());
            let record = record_by_path[file.path.as_str()];
            match parse_file(record, file, now) {
                Ok(chunks) => {
                    all_chunks.extend(chunks);
                    self.files.update_parsed_flag(&file.id, true, None).await?;
                }
                Err(reason) => {
                    warn!(path = %file.path, %reason, "parse failed");
                    self.files
                        .update_parsed_flag(&file.id, false, Some(reason.clone()))
                        .await?;
                    failures.push(FileFailure {
                        path: file.path.clone(),
                        reason,
                    });
                }
            }
        }

        if cancel.is_cancelled() {
            return self.cancel_run(project, "cancelled before persist").await;
        }

        // Step 6: persist chunks in batches.
        for batch in all_chunks.chunks(batch_size.max(1)) {
            self.chunks.save_many(batch).await?;
        }

        // Steps 7-8: embed and persist in batches, bounded concurrency.
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_TASKS));
        let mut join_set = JoinSet::new();
        for batch in all_chunks.chunks(batch_size.max(1)) {
            let batch: Vec<CodeChunk> = batch.to_vec();
            let embedding = Arc::clone(&self.embedding);
            let permit = Arc::clone(&semaphore);
            let backoff = self.backoff;
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let _permit = permit.acquire_owned().await.expect("semaphore closed");
                embed_batch(embedding.as_ref(), batch, backoff, cancel).await
            });
        }

        let mut total_embeddings = 0u32;
        while let Some(joined) = join_set.join_next().await {
            let (embeddings, batch_failures) = joined.map_err(|e| Error::persistence(e.to_string()))?;
            total_embeddings += embeddings.len() as u32;
            if !embeddings.is_empty() {
                self.vector_store.save_many(project_id, &embeddings).await?;
            }
            failures.extend(batch_failures);
        }

        if cancel.is_cancelled() {
            return self.cancel_run(project, "cancelled during embedding").await;
        }

        // Step 9: persist the new root and update the project.
        self.merkle.save_nodes(project_id, &new_tree.nodes().cloned().collect::<Vec<_>>()).await?;
        self.merkle
            .save_root_hash(project_id, new_tree.root_hash())
            .await?;

        let remaining_files = self.files.list_by_project(project_id).await?;
        project.merkle_root_hash = new_tree.root_hash().map(str::to_string);
        project.total_files = new_tree.statistics().leaf_nodes as u32;
        project.indexed_files = remaining_files.iter().filter(|f| f.parsed).count() as u32;
        project.total_chunks = self.chunks.list_by_project(project_id, 0, u64::MAX).await?.total as u32;
        project.indexing_status = IndexingStatus::Completed;
        project.progress = 100;
        project.last_indexed_at = Some(now);
        project.updated_at = now;
        self.repository.update(project).await?;

        info!(
            project_id,
            files = saved_files.len(),
            chunks = all_chunks.len(),
            embeddings = total_embeddings,
            "indexing run completed"
        );

        Ok(IndexingReport {
            total_files: new_tree.statistics().leaf_nodes as u32,
            total_chunks: all_chunks.len() as u32,
            total_embeddings,
            processed_file_ids,
            failures,
        })
    }

    async fn cancel_run(
        &self,
        mut project: crate::domain::types::Project,
        reason: &str,
    ) -> Result<IndexingReport> {
        project.indexing_status = IndexingStatus::Failed;
        self.repository.update(project).await?;
        warn!(reason, "indexing run cancelled");
        Err(Error::Cancelled)
    }
}

fn parse_file(record: &IngestRecord, file: &CodeFile, now: i64) -> std::result::Result<Vec<CodeChunk>, String> {
    let text = String::from_utf8(record.content.clone()).map_err(|_| "invalid utf-8".to_string())?;
    let Some(language) = file.language else {
        return Ok(Vec::new());
    };

    let parsed = chunking::parse(&text, language);
    let chunks: Vec<CodeChunk> = parsed
        .into_iter()
        .map(|chunk| {
            let content_hash = hash_hex(chunk.content.as_bytes());
            CodeChunk {
                id: uuid::Uuid::new_v4().to_string(),
                project_id: file.project_id.clone(),
                file_id: file.id.clone(),
                path: file.path.clone(),
                start_line: chunk.start_line,
                end_line: chunk.end_line,
                content: chunk.content,
                content_hash,
                chunk_type: chunk.chunk_type,
                language,
                symbols: chunk.symbol_name.into_iter().collect(),
                imports: chunk.imports,
                token_count: chunk.token_count,
                created_at: now,
            }
        })
        .collect();
    for chunk in &chunks {
        chunk.validate().map_err(|e| e.to_string())?;
    }
    Ok(chunks)
}

async fn embed_batch(
    embedding: &dyn EmbeddingPort,
    chunks: Vec<CodeChunk>,
    backoff: BackoffPolicy,
    cancel: CancellationToken,
) -> (Vec<CodeEmbedding>, Vec<FileFailure>) {
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let now = now_timestamp();

    let mut attempt = 0u32;
    let mut delay = backoff.initial_delay;
    loop {
        if cancel.is_cancelled() {
            return (Vec::new(), Vec::new());
        }
        match embedding.embed_many(&texts).await {
            Ok(vectors) => {
                let embeddings = chunks
                    .iter()
                    .zip(vectors)
                    .map(|(chunk, vector)| CodeEmbedding {
                        id: uuid::Uuid::new_v4().to_string(),
                        chunk_id: chunk.id.clone(),
                        project_id: chunk.project_id.clone(),
                        vector,
                        model: embedding.model_name().to_string(),
                        schema_version: EMBEDDING_SCHEMA_VERSION,
                        created_at: now,
                    })
                    .collect();
                return (embeddings, Vec::new());
            }
            Err(e) if e.is_rate_limited() && attempt + 1 < backoff.max_attempts => {
                attempt += 1;
                let jitter = Duration::from_millis(rand::random::<u64>() % 250);
                tokio::time::sleep(delay + jitter).await;
                delay = (delay * 2).min(backoff.max_delay);
            }
            Err(e) if e.is_rate_limited() => {
                return (Vec::new(), failures_for(&chunks, &e));
            }
            Err(first_err) => {
                // Non-rate-limit batch failures get a single immediate retry.
                match embedding.embed_many(&texts).await {
                    Ok(vectors) => {
                        let embeddings = chunks
                            .iter()
                            .zip(vectors)
                            .map(|(chunk, vector)| CodeEmbedding {
                                id: uuid::Uuid::new_v4().to_string(),
                                chunk_id: chunk.id.clone(),
                                project_id: chunk.project_id.clone(),
                                vector,
                                model: embedding.model_name().to_string(),
                                schema_version: EMBEDDING_SCHEMA_VERSION,
                                created_at: now,
                            })
                            .collect();
                        return (embeddings, Vec::new());
                    }
                    Err(_) => return (Vec::new(), failures_for(&chunks, &first_err)),
                }
            }
        }
    }
}

fn failures_for(chunks: &[CodeChunk], error: &Error) -> Vec<FileFailure> {
    chunks
        .iter()
        .map(|c| FileFailure {
            path: c.path.clone(),
            reason: error.to_string(),
        })
        .collect()
}

fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embedding::LocalEmbeddingProvider;
    use crate::adapters::repository::InMemoryProjectRepository;
    use crate::adapters::vector_store::InMemoryVectorStore;
    use crate::domain::types::{IndexingStatus, Project, SourceSystem};
    use std::collections::HashMap;

    fn orchestrator() -> (IndexingOrchestrator, Arc<InMemoryProjectRepository>) {
        let repo = Arc::new(InMemoryProjectRepository::new());
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let mut table = HashMap::new();
        table.insert("def".to_string(), vec![1.0; 8]);
        table.insert("return".to_string(), vec![0.5; 8]);
        let embedding = Arc::new(LocalEmbeddingProvider::new(table, 8, "test-local"));
        let orchestrator = IndexingOrchestrator::new(
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            vector_store,
            embedding,
            BackoffPolicy::default(),
        );
        (orchestrator, repo)
    }

    fn blank_project(id: &str) -> Project {
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
            detected_languages: HashMap::new(),
            detected_frameworks: Vec::new(),
            architecture_patterns: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn cold_index_produces_chunks_and_skips_markdown() {
        let (orchestrator, repo) = orchestrator();
        repo.create(blank_project("p1")).await.unwrap();

        let records = vec![
            IngestRecord {
                path: "a.py".to_string(),
                content: b"def f(): return 1\n".to_vec(),
                sha: "sha-a".to_string(),
                size: 18,
            },
            IngestRecord {
                path: "b.py".to_string(),
                content: b"def g(): return 2\n".to_vec(),
                sha: "sha-b".to_string(),
                size: 18,
            },
            IngestRecord {
                path: "c.md".to_string(),
                content: b"# hi\n".to_vec(),
                sha: "sha-c".to_string(),
                size: 5,
            },
        ];

        let report = orchestrator
            .run("p1", records, 50, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.total_chunks, 2);
        assert_eq!(report.total_embeddings, 2);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn concurrent_run_is_rejected() {
        let (orchestrator, repo) = orchestrator();
        repo.create(blank_project("p1")).await.unwrap();
        orchestrator.in_progress.insert("p1".to_string(), ());
        let err = orchestrator
            .run("p1", Vec::new(), 50, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyIndexing));
    }

    #[tokio::test]
    async fn path_traversal_record_rejects_the_whole_run() {
        let (orchestrator, repo) = orchestrator();
        repo.create(blank_project("p1")).await.unwrap();

        let records = vec![IngestRecord {
            path: "../secrets.env".to_string(),
            content: b"SECRET=1\n".to_vec(),
            sha: "sha-a".to_string(),
            size: 9,
        }];

        let err = orchestrator
            .run("p1", records, 50, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn invalid_utf8_file_is_isolated_as_a_failure() {
        let (orchestrator, repo) = orchestrator();
        repo.create(blank_project("p1")).await.unwrap();

        let mut records: Vec<IngestRecord> = (0..9)
            .map(|i| IngestRecord {
                path: format!("f{i}.py"),
                content: format!("def f{i}(): return {i}\n").into_bytes(),
                sha: format!("sha-{i}"),
                size: 10,
            })
            .collect();
        records.push(IngestRecord {
            path: "bad.py".to_string(),
            content: vec![0xff, 0xfe, 0xfd],
            sha: "sha-bad".to_string(),
            size: 3,
        });

        let report = orchestrator
            .run("p1", records, 50, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "bad.py");
        assert_eq!(report.total_chunks, 9);
    }
}
