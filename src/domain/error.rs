//! Error taxonomy for the indexing and retrieval engine.
//!
//! Every kind is a stable, tagged variant. Callers match on variants, never
//! on message text.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error taxonomy for the engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed arguments: empty text, empty batch, non-UTF-8 content.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what was invalid.
        message: String,
    },

    /// A batch exceeded the provider-declared maximum.
    #[error("batch too large: max is {max}")]
    BatchTooLarge {
        /// The provider's declared maximum batch size.
        max: usize,
    },

    /// Upstream throttling; retryable with backoff.
    #[error("rate limited")]
    RateLimited,

    /// Non-2xx response from a remote provider.
    #[error("api error ({status}): {message}")]
    ApiError {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Human-readable detail from the provider.
        message: String,
    },

    /// The local embedding provider could not embed any token of the input.
    #[error("model not available")]
    ModelNotAvailable,

    /// Per-file parse failure. Non-fatal; recorded on the file.
    #[error("parse failed: {reason}")]
    ParseFailed {
        /// Why parsing failed.
        reason: String,
    },

    /// A project/file/chunk lookup missed.
    #[error("not found: {kind} {id}")]
    NotFound {
        /// The kind of resource that was looked up (e.g. "project").
        kind: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A concurrent indexing run was rejected.
    #[error("already indexing")]
    AlreadyIndexing,

    /// The operation was cooperatively cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Storage-layer failure. Fatal to the run that triggered it.
    #[error("persistence error: {detail}")]
    PersistenceError {
        /// Description of the underlying storage failure.
        detail: String,
    },

    /// I/O error, e.g. loading a configuration file or a snapshot.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Configuration could not be built, deserialized, or validated.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration failure.
        message: String,
    },
}

impl Error {
    /// Construct an [`Error::InvalidInput`].
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Construct an [`Error::BatchTooLarge`].
    pub fn batch_too_large(max: usize) -> Self {
        Self::BatchTooLarge { max }
    }

    /// Construct an [`Error::ApiError`].
    pub fn api_error<S: Into<String>>(status: u16, message: S) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Construct an [`Error::ParseFailed`].
    pub fn parse_failed<S: Into<String>>(reason: S) -> Self {
        Self::ParseFailed {
            reason: reason.into(),
        }
    }

    /// Construct an [`Error::NotFound`].
    pub fn not_found<K: Into<String>, I: Into<String>>(kind: K, id: I) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Construct an [`Error::PersistenceError`].
    pub fn persistence<S: Into<String>>(detail: S) -> Self {
        Self::PersistenceError {
            detail: detail.into(),
        }
    }

    /// Construct an [`Error::Config`].
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True if this error is retryable via the rate-limit backoff policy.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}
