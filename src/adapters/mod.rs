//! Port implementations: concrete embedding providers, vector stores, and
//! repositories. Nothing outside this module talks to the network, the
//! filesystem, or holds shared mutable state directly.

pub mod embedding;
pub mod repository;
pub mod vector_store;
