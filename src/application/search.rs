//! Query-to-result retrieval (C9): embed a query, run vector search, and
//! hydrate results for PRD enrichment or file-level ranking.
//!
//! Grounded in the teacher's `application::search::SearchService`: a thin
//! service delegating to an injected search capability, restyled without
//! `shaku` (out of scope here, the engine wires its dependencies by value
//! at construction, per spec.md §5's "no global mutable state" rule).

use crate::domain::error::Result;
use crate::domain::ports::{ChunkStore, EmbeddingPort, FileStore, ProjectStore, VectorStorePort};
use crate::domain::types::{CodeFile, EnrichmentResult, SearchResult, TechStackSummary};
use std::collections::HashMap;
use std::sync::Arc;

const EMBEDDING_SCHEMA_VERSION: i32 = 1;
/// How many chunk-level hits to fetch before collapsing to file granularity.
const FILE_SEARCH_FANOUT: usize = 200;

pub struct SearchService {
    embedding: Arc<dyn EmbeddingPort>,
    vector_store: Arc<dyn VectorStorePort>,
    files: Arc<dyn FileStore>,
    chunks: Arc<dyn ChunkStore>,
    repository: Arc<dyn ProjectStore>,
    inline_chunk_limit: usize,
}

impl SearchService {
    pub fn new(
        embedding: Arc<dyn EmbeddingPort>,
        vector_store: Arc<dyn VectorStorePort>,
        files: Arc<dyn FileStore>,
        chunks: Arc<dyn ChunkStore>,
        repository: Arc<dyn ProjectStore>,
        inline_chunk_limit: usize,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            files,
            chunks,
            repository,
            inline_chunk_limit,
        }
    }

    /// File-granularity search: ranks files by their single best-matching
    /// chunk, descending by that chunk's similarity.
    pub async fn search_files(
        &self,
        project_id: &str,
        query_text: &str,
        k: usize,
        threshold: f32,
    ) -> Result<Vec<(CodeFile, f32)>> {
        let query_vector = self.embedding.embed_one(query_text).await?;
        let hits = self
            .vector_store
            .search(
                project_id,
                &query_vector,
                FILE_SEARCH_FANOUT,
                threshold,
                EMBEDDING_SCHEMA_VERSION,
            )
            .await?;
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_page = self.chunks.list_by_project(project_id, 0, u64::MAX).await?;
        let chunk_by_id: HashMap<&str, _> = chunk_page
            .items
            .iter()
            .map(|chunk| (chunk.id.as_str(), chunk))
            .collect();

        let mut best_per_path: HashMap<String, f32> = HashMap::new();
        for hit in &hits {
            let Some(chunk) = chunk_by_id.get(hit.chunk_id.as_str()) else {
                continue;
            };
            best_per_path
                .entry(chunk.path.clone())
                .and_modify(|best| {
                    if hit.similarity > *best {
                        *best = hit.similarity;
                    }
                })
                .or_insert(hit.similarity);
        }

        let mut ranked: Vec<(String, f32)> = best_per_path.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(k);

        let mut results = Vec::with_capacity(ranked.len());
        for (path, similarity) in ranked {
            if let Some(file) = self.files.find_by_path(project_id, &path).await? {
                results.push((file, similarity));
            }
        }
        Ok(results)
    }

    /// Embeds `prd_description` and returns up to `max_chunks` hydrated
    /// chunks plus a tech-stack summary, for downstream PRD enrichment.
    pub async fn enrich(
        &self,
        prd_description: &str,
        project_id: &str,
        max_chunks: usize,
        threshold: f32,
    ) -> Result<EnrichmentResult> {
        let query_vector = self.embedding.embed_one(prd_description).await?;
        let hits = self
            .vector_store
            .search(
                project_id,
                &query_vector,
                max_chunks,
                threshold,
                EMBEDDING_SCHEMA_VERSION,
            )
            .await?;

        let chunk_page = self.chunks.list_by_project(project_id, 0, u64::MAX).await?;
        let chunk_by_id: HashMap<&str, _> = chunk_page
            .items
            .iter()
            .map(|chunk| (chunk.id.as_str(), chunk))
            .collect();

        let results: Vec<SearchResult> = hits
            .iter()
            .filter_map(|hit| {
                let chunk = chunk_by_id.get(hit.chunk_id.as_str())?;
                Some(SearchResult {
                    chunk_id: chunk.id.clone(),
                    path: chunk.path.clone(),
                    content: chunk.content.clone(),
                    chunk_type: chunk.chunk_type,
                    language: chunk.language,
                    symbols: chunk.symbols.clone(),
                    start_line: chunk.start_line,
                    end_line: chunk.end_line,
                    similarity: hit.similarity,
                })
            })
            .collect();

        let project = self
            .repository
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| crate::domain::error::Error::not_found("project", project_id))?;

        let tech_stack = TechStackSummary {
            primary_language: project.primary_language().map(str::to_string),
            frameworks: project.detected_frameworks.clone(),
            architecture_patterns: project
                .architecture_patterns
                .iter()
                .map(|p| p.name.clone())
                .collect(),
        };

        let context_markdown = render_context_markdown(&results, self.inline_chunk_limit);

        Ok(EnrichmentResult {
            chunks: results,
            tech_stack,
            context_markdown,
        })
    }
}

/// Renders the first `inline_limit` chunks in full; remaining chunks are
/// summarized only by count, deterministically.
fn render_context_markdown(results: &[SearchResult], inline_limit: usize) -> String {
    let mut markdown = String::new();
    for result in results.iter().take(inline_limit) {
        markdown.push_str(&format!(
            "## {} ({}:{}-{})\n\n```{}\n{}\n```\n\n",
            result.path,
            result.path,
            result.start_line,
            result.end_line,
            result.language,
            result.content
        ));
    }
    if results.len() > inline_limit {
        markdown.push_str(&format!(
            "_{} additional relevant chunk(s) omitted._\n",
            results.len() - inline_limit
        ));
    }
    markdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embedding::LocalEmbeddingProvider;
    use crate::adapters::repository::InMemoryProjectRepository;
    use crate::adapters::vector_store::InMemoryVectorStore;
    use crate::domain::ports::{ChunkStore, FileStore, ProjectStore};
    use crate::domain::types::{
        ChunkType, CodeChunk, CodeEmbedding, IndexingStatus, Language, Project, SourceSystem,
    };
    use std::collections::HashMap;

    fn service() -> (SearchService, Arc<InMemoryProjectRepository>, Arc<InMemoryVectorStore>, Arc<LocalEmbeddingProvider>) {
        let repo = Arc::new(InMemoryProjectRepository::new());
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let mut table = HashMap::new();
        table.insert("authenticate".to_string(), vec![1.0, 0.0]);
        table.insert("user".to_string(), vec![1.0, 0.0]);
        table.insert("render".to_string(), vec![0.0, 1.0]);
        table.insert("chart".to_string(), vec![0.0, 1.0]);
        let embedding = Arc::new(LocalEmbeddingProvider::new(table, 2, "test-local"));
        let service = SearchService::new(
            embedding.clone(),
            vector_store.clone(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            10,
        );
        (service, repo, vector_store, embedding)
    }

    #[tokio::test]
    async fn enrich_ranks_the_closer_chunk_first() {
        let (service, repo, vector_store, embedding) = service();
        repo.create(Project {
            id: "p1".to_string(),
            repository_url: "https://example.test/repo".to_string(),
            branch: "main".to_string(),
            source_system: SourceSystem::HostedGitA,
            merkle_root_hash: None,
            total_files: 0,
            indexed_files: 0,
            total_chunks: 0,
            indexing_status: IndexingStatus::Completed,
            progress: 100,
            last_indexed_at: None,
            detected_languages: HashMap::new(),
            detected_frameworks: vec!["axum".to_string()],
            architecture_patterns: Vec::new(),
            created_at: 0,
            updated_at: 0,
        })
        .await
        .unwrap();

        let login_chunk = CodeChunk {
            id: "c-login".to_string(),
            project_id: "p1".to_string(),
            file_id: "f1".to_string(),
            path: "auth.py".to_string(),
            start_line: 1,
            end_line: 1,
            content: "def login(user, password): ...".to_string(),
            content_hash: "h1".to_string(),
            chunk_type: ChunkType::Function,
            language: Language::Python,
            symbols: vec!["login".to_string()],
            imports: Vec::new(),
            token_count: 8,
            created_at: 0,
        };
        let chart_chunk = CodeChunk {
            id: "c-chart".to_string(),
            project_id: "p1".to_string(),
            file_id: "f2".to_string(),
            path: "chart.py".to_string(),
            start_line: 1,
            end_line: 1,
            content: "def render_chart(data): ...".to_string(),
            content_hash: "h2".to_string(),
            chunk_type: ChunkType::Function,
            language: Language::Python,
            symbols: vec!["render_chart".to_string()],
            imports: Vec::new(),
            token_count: 5,
            created_at: 0,
        };
        ChunkStore::save_many(&*repo, &[login_chunk.clone(), chart_chunk.clone()])
            .await
            .unwrap();

        let login_vector = embedding.embed_one(&login_chunk.content).await.unwrap();
        let chart_vector = embedding.embed_one(&chart_chunk.content).await.unwrap();
        vector_store
            .save_many(
                "p1",
                &[
                    CodeEmbedding {
                        id: "e1".to_string(),
                        chunk_id: "c-login".to_string(),
                        project_id: "p1".to_string(),
                        vector: login_vector,
                        model: "test-local".to_string(),
                        schema_version: 1,
                        created_at: 0,
                    },
                    CodeEmbedding {
                        id: "e2".to_string(),
                        chunk_id: "c-chart".to_string(),
                        project_id: "p1".to_string(),
                        vector: chart_vector,
                        model: "test-local".to_string(),
                        schema_version: 1,
                        created_at: 0,
                    },
                ],
            )
            .await
            .unwrap();

        let result = service
            .enrich("authenticate user", "p1", 2, 0.3)
            .await
            .unwrap();
        assert_eq!(result.chunks[0].chunk_id, "c-login");
        assert!(result.chunks[0].similarity > result.chunks[1].similarity);
        assert_eq!(result.tech_stack.frameworks, vec!["axum".to_string()]);
        assert!(result.context_markdown.contains("auth.py"));
    }
}
