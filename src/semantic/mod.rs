//! Semantic representation and retrieval.
//!
//! This module provides local embedding generation using fastembed-rs and
//! cosine-similarity ranking over in-memory embedded record sets.
//!
//! # Architecture
//!
//! - `embeddings`: The `Embedder` trait and the fastembed-backed model
//! - `search`: Cosine-similarity ranking over an embedded corpus

pub mod embeddings;
pub mod search;

pub use embeddings::{Embedder, EmbeddingError, EmbeddingModel};
pub use search::{cosine_similarity, search, SearchResult};

/// Default embedding model name (multilingual, the corpus is Spanish)
pub const DEFAULT_MODEL: &str = "multilingual-e5-small";
