//! Core domain entities.
//!
//! # Example: a chunk, its embedding, and a search result
//!
//! ```rust
//! use code_index_engine::domain::types::{ChunkType, CodeChunk, Language};
//!
//! let chunk = CodeChunk {
//!     id: "chunk-1".to_string(),
//!     project_id: "proj-1".to_string(),
//!     file_id: "file-1".to_string(),
//!     path: "src/auth.rs".to_string(),
//!     start_line: 10,
//!     end_line: 12,
//!     content: "fn authenticate(user: &str) -> bool { true }".to_string(),
//!     content_hash: "abc123".to_string(),
//!     chunk_type: ChunkType::Function,
//!     language: Language::Rust,
//!     symbols: vec!["authenticate".to_string()],
//!     imports: vec![],
//!     token_count: 12,
//!     created_at: 0,
//! };
//! assert_eq!(chunk.chunk_type, ChunkType::Function);
//! ```

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Supported programming/markup/data language tags.
///
/// The chunkable code languages are everything except the markup/data
/// tags (`Html`, `Css`, `Markdown`, `Json`, `Yaml`, `Xml`), which are
/// detected for Merkle/metadata purposes but never handed to a chunk
/// parser.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Language {
    /// Swift.
    Swift,
    /// Kotlin.
    Kotlin,
    /// Java.
    Java,
    /// TypeScript.
    TypeScript,
    /// JavaScript.
    JavaScript,
    /// Python.
    Python,
    /// Go.
    Go,
    /// Rust.
    Rust,
    /// C++.
    Cpp,
    /// C.
    C,
    /// Objective-C.
    ObjC,
    /// Ruby.
    Ruby,
    /// PHP.
    Php,
    /// C#.
    CSharp,
    /// HTML, detected but never chunked.
    Html,
    /// CSS, detected but never chunked.
    Css,
    /// Markdown, detected but never chunked.
    Markdown,
    /// JSON, detected but never chunked.
    Json,
    /// YAML, detected but never chunked.
    Yaml,
    /// XML, detected but never chunked.
    Xml,
}

impl Language {
    /// Markup/data languages detect but never chunk.
    pub fn is_chunkable(&self) -> bool {
        !matches!(
            self,
            Language::Html
                | Language::Css
                | Language::Markdown
                | Language::Json
                | Language::Yaml
                | Language::Xml
        )
    }

    /// Stable lowercase tag, used in persistence and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Java => "java",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::ObjC => "objc",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::CSharp => "csharp",
            Language::Html => "html",
            Language::Css => "css",
            Language::Markdown => "markdown",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Xml => "xml",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of declaration a [`CodeChunk`] represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChunkType {
    /// A function or method.
    Function,
    /// A class.
    Class,
    /// A struct.
    Struct,
    /// An enum.
    Enum,
    /// An interface, protocol, or trait.
    Interface,
    /// A whole-file chunk with no detected declarations.
    Module,
    /// A standalone comment block.
    Comment,
    /// Any other recognized declaration, e.g. an `impl` or `mod` block.
    Declaration,
    /// Unclassified content.
    Other,
}

/// Source-hosting system a project was ingested from.
///
/// Deliberately opaque tags: the engine never branches on which hosted
/// system supplied the listing, only on the structural data it carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceSystem {
    /// The first supported hosted-git system.
    HostedGitA,
    /// The second supported hosted-git system.
    HostedGitB,
    /// The third supported hosted-git system.
    HostedGitC,
}

/// Lifecycle state of a project's indexing run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IndexingStatus {
    /// Not yet started.
    Pending,
    /// Currently running.
    Indexing,
    /// Finished successfully.
    Completed,
    /// Finished with an unrecoverable error.
    Failed,
}

/// A detected architectural pattern, with supporting evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchitecturePattern {
    /// Pattern name, e.g. `"layered"` or `"mvc"`.
    pub name: String,
    /// Detection confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Paths that contributed evidence for this pattern.
    pub evidence_paths: Vec<String>,
}

/// The indexing unit: a repository at a branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Unique project id.
    pub id: String,
    /// Source repository URL.
    pub repository_url: String,
    /// Branch this project tracks.
    pub branch: String,
    /// The hosted-git system the repository was ingested from.
    pub source_system: SourceSystem,
    /// Root hash of the project's current Merkle tree, once indexed.
    pub merkle_root_hash: Option<String>,
    /// Total files discovered in the last listing.
    pub total_files: u32,
    /// Files successfully parsed and chunked so far.
    pub indexed_files: u32,
    /// Total chunks produced across all indexed files.
    pub total_chunks: u32,
    /// Current lifecycle state of the indexing run.
    pub indexing_status: IndexingStatus,
    /// Percent complete, `0..=100`.
    pub progress: u8,
    /// Timestamp of the last completed indexing run, if any.
    pub last_indexed_at: Option<i64>,
    /// Byte count per detected language, keyed by language tag.
    pub detected_languages: std::collections::HashMap<String, u64>,
    /// Frameworks detected from file listing and content heuristics.
    pub detected_frameworks: Vec<String>,
    /// Architectural patterns detected with supporting evidence.
    pub architecture_patterns: Vec<ArchitecturePattern>,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

impl Project {
    /// The language with the highest total byte count, if any files have
    /// been indexed yet.
    pub fn primary_language(&self) -> Option<&str> {
        self.detected_languages
            .iter()
            .max_by_key(|(_, bytes)| **bytes)
            .map(|(lang, _)| lang.as_str())
    }
}

/// A source file tracked within a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeFile {
    /// Unique file id.
    pub id: String,
    /// Owning project id.
    pub project_id: String,
    /// Repository-relative path.
    pub path: String,
    /// Content-addressed hash of the file's current contents.
    pub content_hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected language, `None` if unrecognized.
    pub language: Option<Language>,
    /// Whether this file has been successfully chunked.
    pub parsed: bool,
    /// The last parse failure reason, if parsing failed.
    pub parse_error: Option<String>,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// A semantically meaningful region of a source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct CodeChunk {
    /// Unique chunk id.
    #[validate(length(min = 1, message = "chunk id cannot be empty"))]
    pub id: String,
    /// Owning project id.
    pub project_id: String,
    /// Owning file id.
    pub file_id: String,
    /// Repository-relative path of the source file.
    pub path: String,
    /// 1-based first line, inclusive.
    #[validate(range(min = 1, message = "start line must be positive"))]
    pub start_line: u32,
    /// 1-based last line, inclusive.
    #[validate(range(min = 1, message = "end line must be positive"))]
    pub end_line: u32,
    /// The chunk's source text.
    #[validate(length(min = 1, message = "chunk content cannot be empty"))]
    pub content: String,
    /// Content-addressed hash of `content`.
    pub content_hash: String,
    /// The kind of declaration this chunk represents.
    pub chunk_type: ChunkType,
    /// Source language of the owning file.
    pub language: Language,
    /// Declared identifiers found in this chunk.
    pub symbols: Vec<String>,
    /// Module-level import/use lines from the owning file.
    pub imports: Vec<String>,
    /// Estimated token count.
    pub token_count: u32,
    /// Creation timestamp.
    pub created_at: i64,
}

/// A fixed-length dense vector representation of a chunk's content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeEmbedding {
    /// Unique embedding id.
    pub id: String,
    /// The chunk this embedding was computed from.
    pub chunk_id: String,
    /// Owning project id.
    pub project_id: String,
    /// The dense vector itself.
    pub vector: Vec<f32>,
    /// Name of the model that produced `vector`.
    pub model: String,
    /// Schema version of `vector`'s encoding, used to isolate searches
    /// across incompatible embedding generations.
    pub schema_version: i32,
    /// Creation timestamp.
    pub created_at: i64,
}

/// A node in a Merkle tree built over per-file content hashes.
///
/// Internal nodes carry only child hashes, no parent back-pointer, so the
/// tree is reconstructable from a flat node set with no cyclic ownership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MerkleNode {
    /// This node's own hash; for a leaf, the file's content hash.
    pub hash: String,
    /// For a leaf, the file path; for an internal node, the joined paths
    /// of its two children.
    pub path: String,
    /// Whether this node is a leaf (per-file) or an internal node.
    pub is_leaf: bool,
    /// The file this leaf represents, `None` for internal nodes.
    pub file_id: Option<String>,
    /// Hash of the left child, `None` for leaves.
    pub left_hash: Option<String>,
    /// Hash of the right child, `None` for leaves.
    pub right_hash: Option<String>,
}

/// A single blob entry from a hosted-git file listing, as consumed by the
/// Merkle builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubFileNode {
    /// Repository-relative path.
    pub path: String,
    /// Git file mode, e.g. `"100644"`.
    pub mode: String,
    /// Whether this entry is a file or a directory.
    pub node_type: BlobOrTree,
    /// Git blob SHA for this version of the entry.
    pub sha: String,
    /// File size in bytes, if reported by the listing.
    pub size: Option<u64>,
    /// URL to fetch this entry's raw content.
    pub url: String,
}

/// Whether a [`GitHubFileNode`] is a file (`blob`) or directory (`tree`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BlobOrTree {
    /// A file entry.
    Blob,
    /// A directory entry.
    Tree,
}

/// A single per-file record supplied to the orchestrator for ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct IngestRecord {
    /// Repository-relative path. Must be non-empty and must not contain a
    /// `..` segment (spec.md §6).
    #[validate(length(min = 1, message = "path cannot be empty"))]
    #[validate(custom(function = "no_parent_segments"))]
    pub path: String,
    /// Raw file bytes, expected to be valid UTF-8 for chunkable languages.
    pub content: Vec<u8>,
    /// Content-addressed identifier for this version of the file.
    #[validate(length(min = 1, message = "sha cannot be empty"))]
    pub sha: String,
    /// File size in bytes, as reported by the source listing.
    pub size: u64,
}

/// Rejects any path containing a literal `..` path segment.
fn no_parent_segments(path: &str) -> std::result::Result<(), validator::ValidationError> {
    if path.split('/').any(|segment| segment == "..") {
        return Err(validator::ValidationError::new("path_traversal"));
    }
    Ok(())
}

/// Why a single file failed during an indexing run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileFailure {
    /// The path that failed.
    pub path: String,
    /// Why it failed, e.g. `"invalid utf-8"`.
    pub reason: String,
}

/// Summary report returned by the indexing orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IndexingReport {
    /// Files considered in this run.
    pub total_files: u32,
    /// Chunks produced across all successfully parsed files.
    pub total_chunks: u32,
    /// Embeddings computed and stored in this run.
    pub total_embeddings: u32,
    /// Ids of the files that completed successfully.
    pub processed_file_ids: Vec<String>,
    /// Files that failed, with their reasons.
    pub failures: Vec<FileFailure>,
}

/// A single hydrated result from a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The matched chunk's id.
    pub chunk_id: String,
    /// Repository-relative path of the owning file.
    pub path: String,
    /// The chunk's source text.
    pub content: String,
    /// The kind of declaration this chunk represents.
    pub chunk_type: ChunkType,
    /// Source language of the owning file.
    pub language: Language,
    /// Declared identifiers found in this chunk.
    pub symbols: Vec<String>,
    /// 1-based first line, inclusive.
    pub start_line: u32,
    /// 1-based last line, inclusive.
    pub end_line: u32,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub similarity: f32,
}

/// Technology-stack summary attached to a PRD-enrichment response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TechStackSummary {
    /// The project's dominant language, if any files are indexed.
    pub primary_language: Option<String>,
    /// Frameworks detected across the project.
    pub frameworks: Vec<String>,
    /// Architectural pattern names detected across the project.
    pub architecture_patterns: Vec<String>,
}

/// Result of [`crate::application::search::SearchService::enrich`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentResult {
    /// The matching chunks, ranked by similarity.
    pub chunks: Vec<SearchResult>,
    /// Technology-stack summary for the searched project.
    pub tech_stack: TechStackSummary,
    /// Rendered markdown combining `chunks` and `tech_stack` for PRD context.
    pub context_markdown: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> IngestRecord {
        IngestRecord {
            path: path.to_string(),
            content: b"x".to_vec(),
            sha: "sha".to_string(),
            size: 1,
        }
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(record("").validate().is_err());
    }

    #[test]
    fn parent_segment_is_rejected() {
        assert!(record("../etc/passwd").validate().is_err());
        assert!(record("src/../secrets.env").validate().is_err());
    }

    #[test]
    fn ordinary_path_is_accepted() {
        assert!(record("src/auth.py").validate().is_ok());
    }
}
