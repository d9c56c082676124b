//! On-device embedding via averaged word vectors (C5, local provider).
//!
//! Grounded in the teacher's `FastEmbedProvider`/`NullEmbeddingProvider`
//! shape (a provider struct wrapping a model resource, exposing the same
//! `EmbeddingPort` surface), but without an on-disk model: tokenization and
//! averaging over a supplied word-vector table, per spec.md §4.5.

use crate::domain::error::{Error, Result};
use crate::domain::ports::EmbeddingPort;
use async_trait::async_trait;
use std::collections::HashMap;

/// Averages a text's token vectors from a fixed word-vector table, then
/// pads with zeros or truncates to `dimension`.
pub struct LocalEmbeddingProvider {
    table: HashMap<String, Vec<f32>>,
    dimension: usize,
    model_name: String,
}

impl LocalEmbeddingProvider {
    /// `table` maps lowercase tokens to vectors of any fixed length; the
    /// provider reshapes the averaged vector to `dimension` regardless of
    /// the table's native width.
    pub fn new(table: HashMap<String, Vec<f32>>, dimension: usize, model_name: impl Into<String>) -> Self {
        Self {
            table,
            dimension,
            model_name: model_name.into(),
        }
    }

    fn average(&self, text: &str) -> Option<Vec<f32>> {
        let mut sum = vec![0.0f32; self.dimension];
        let mut count = 0usize;
        for token in text.split_whitespace() {
            if let Some(vector) = self.table.get(&token.to_lowercase()) {
                for (i, slot) in sum.iter_mut().enumerate() {
                    *slot += vector.get(i).copied().unwrap_or(0.0);
                }
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }
        for slot in &mut sum {
            *slot /= count as f32;
        }
        Some(reshape(sum, self.dimension))
    }
}

fn reshape(mut vector: Vec<f32>, dimension: usize) -> Vec<f32> {
    vector.resize(dimension, 0.0);
    vector
}

#[async_trait]
impl EmbeddingPort for LocalEmbeddingProvider {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(Error::invalid_input("text cannot be empty"));
        }
        self.average(text).ok_or(Error::ModelNotAvailable)
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(Error::invalid_input("batch cannot be empty"));
        }
        if texts.len() > self.max_batch_size() {
            return Err(Error::batch_too_large(self.max_batch_size()));
        }
        // All-or-nothing: one un-embeddable item fails the whole batch.
        texts
            .iter()
            .map(|text| self.average(text).ok_or(Error::ModelNotAvailable))
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
