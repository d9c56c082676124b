//! Narrow capability interfaces separating the engine from provider-specific
//! implementations (C5–C7).

mod embedding;
mod repository;
mod vector_store;

pub use embedding::EmbeddingPort;
pub use repository::{ChunkStore, FileStore, MerkleStore, Page, PrdLinkStore, ProjectRepository, ProjectStore};
pub use vector_store::{cosine_similarity, SimilarityHit, VectorStorePort};
