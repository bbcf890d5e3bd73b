//! Cross-module test scenarios and shared test support.


use crate::semantic::{Embedder, EmbeddingError};

/// Deterministic offline embedder: vectors derived from a hash of the
/// input text. Same text always maps to the same vector, so exact-match
/// queries score 1.0 without downloading a model.
pub struct HashEmbedder {
    pub dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        use sha2::{Digest, Sha256};

        let digest = Sha256::digest(text.as_bytes());
        let h = u64::from_le_bytes(digest[..8].try_into().expect("8 bytes"));

        (0..self.dimensions)
            .map(|i| ((h >> (i % 32)) as f32 * 0.0001).sin())
            .collect()
    }
}

impl Embedder for HashEmbedder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash-embedder"
    }
}

/// Embedder whose encode always fails, for failure-propagation tests.
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::EmbeddingFailed("model unreachable".to_string()))
    }

    fn dimensions(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "failing-embedder"
    }
}
