//! Codebase indexing and semantic retrieval engine.
//!
//! Ingests a supplied file listing, chunks source by language, diffs a
//! Merkle tree for incremental re-indexing, generates embeddings through a
//! pluggable provider, and serves similarity search over the result.
//!
//! The crate is organized the way the wider tool it powers organizes its
//! implementation-analysis subsystem: a `domain` layer of types, ports and
//! pure algorithms, `adapters` implementing those ports, and an
//! `application` layer composing them into the indexing and search use
//! cases.

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::error::{Error, Result};
