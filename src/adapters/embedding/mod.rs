//! `EmbeddingPort` implementations (C5).

mod hybrid;
mod local;
mod remote;

pub use hybrid::HybridEmbeddingProvider;
pub use local::LocalEmbeddingProvider;
pub use remote::RemoteEmbeddingProvider;
