//! Local-first, remote-fallback embedding provider (C5, hybrid provider).

use crate::domain::error::Result;
use crate::domain::ports::EmbeddingPort;
use async_trait::async_trait;

/// Tries the local provider first; on any error, falls back to the remote
/// provider if one is configured, otherwise re-raises the local error.
///
/// `dimension` and `model_name` reflect the remote provider whenever one is
/// configured, even for requests the local provider actually served,
/// matching spec.md's "remote-preferred if present" rule.
pub struct HybridEmbeddingProvider<L: EmbeddingPort, R: EmbeddingPort> {
    local: L,
    remote: Option<R>,
}

impl<L: EmbeddingPort, R: EmbeddingPort> HybridEmbeddingProvider<L, R> {
    pub fn new(local: L, remote: Option<R>) -> Self {
        Self { local, remote }
    }
}

#[async_trait]
impl<L: EmbeddingPort, R: EmbeddingPort> EmbeddingPort for HybridEmbeddingProvider<L, R> {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        match self.local.embed_one(text).await {
            Ok(vector) => Ok(vector),
            Err(local_err) => match &self.remote {
                Some(remote) => remote.embed_one(text).await,
                None => Err(local_err),
            },
        }
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self.local.embed_many(texts).await {
            Ok(vectors) => Ok(vectors),
            Err(local_err) => match &self.remote {
                Some(remote) => remote.embed_many(texts).await,
                None => Err(local_err),
            },
        }
    }

    fn dimension(&self) -> usize {
        self.remote
            .as_ref()
            .map(|r| r.dimension())
            .unwrap_or_else(|| self.local.dimension())
    }

    fn model_name(&self) -> &str {
        self.remote
            .as_ref()
            .map(|r| r.model_name())
            .unwrap_or_else(|| self.local.model_name())
    }

    fn max_batch_size(&self) -> usize {
        self.remote
            .as_ref()
            .map(|r| r.max_batch_size())
            .unwrap_or_else(|| self.local.max_batch_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::Error;
    use async_trait::async_trait;

    struct AlwaysFails;

    #[async_trait]
    impl EmbeddingPort for AlwaysFails {
        async fn embed_one(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::ModelNotAvailable)
        }
        async fn embed_many(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(Error::ModelNotAvailable)
        }
        fn dimension(&self) -> usize {
            768
        }
        fn model_name(&self) -> &str {
            "local"
        }
    }

    struct AlwaysSucceeds;

    #[async_trait]
    impl EmbeddingPort for AlwaysSucceeds {
        async fn embed_one(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0; 1536])
        }
        async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0; 1536]).collect())
        }
        fn dimension(&self) -> usize {
            1536
        }
        fn model_name(&self) -> &str {
            "remote"
        }
    }

    #[tokio::test]
    async fn falls_back_to_remote_on_local_failure() {
        let hybrid = HybridEmbeddingProvider::new(AlwaysFails, Some(AlwaysSucceeds));
        let vector = hybrid.embed_one("hello").await.unwrap();
        assert_eq!(vector.len(), 1536);
        assert_eq!(hybrid.dimension(), 1536);
        assert_eq!(hybrid.model_name(), "remote");
    }

    #[tokio::test]
    async fn reraises_local_error_without_remote() {
        let hybrid = HybridEmbeddingProvider::<_, AlwaysSucceeds>::new(AlwaysFails, None);
        assert!(matches!(
            hybrid.embed_one("hello").await.unwrap_err(),
            Error::ModelNotAvailable
        ));
        assert_eq!(hybrid.dimension(), 768);
    }
}
