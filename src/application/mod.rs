//! Use-case orchestration: composes the domain ports into the indexing and
//! search workflows. Nothing below `application` knows about either other.

pub mod indexing;
pub mod search;

pub use indexing::{BackoffPolicy, IndexingOrchestrator};
pub use search::SearchService;
