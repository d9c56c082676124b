//! HTTPS batch embedding provider (C5, remote provider).
//!
//! Grounded in the teacher's `OpenAIEmbeddingProvider` (bearer-token
//! `reqwest` client posting to an embeddings endpoint), generalized to the
//! wire contract spec.md §6 fixes: `{input, model, encoding_format}` in,
//! `{data: [{embedding, index}], model, usage}` out, sorted by `index`.

use crate::domain::error::{Error, Result};
use crate::domain::ports::EmbeddingPort;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
    model: &'a str,
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
    #[allow(dead_code)]
    model: String,
    #[allow(dead_code)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[allow(dead_code)]
    prompt_tokens: u64,
    #[allow(dead_code)]
    total_tokens: u64,
}

/// Batch POSTs text to a remote embeddings endpoint over HTTPS.
pub struct RemoteEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    max_batch_size: usize,
}

impl RemoteEmbeddingProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimension,
            max_batch_size: 50,
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let body = EmbeddingsRequest {
            input: texts,
            model: &self.model,
            encoding_format: "float",
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::api_error(0, e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::api_error(status.as_u16(), message));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::api_error(status.as_u16(), e.to_string()))?;

        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingPort for RemoteEmbeddingProvider {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(Error::invalid_input("text cannot be empty"));
        }
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| Error::api_error(0, "empty response"))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(Error::invalid_input("batch cannot be empty"));
        }
        if texts.len() > self.max_batch_size {
            return Err(Error::batch_too_large(self.max_batch_size));
        }
        self.request(texts).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}
