//! Cosine-similarity ranking over an embedded corpus.

use serde::{Deserialize, Serialize};

use crate::records::EmbeddedRecord;

/// A ranked hit. A value derived from the corpus record; holds no
/// reference back into it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub subject: String,
    pub body: Option<String>,
    /// Cosine similarity in [-1, 1].
    pub similarity: f32,
}

/// Rank `corpus` against a query embedding, best first.
///
/// Returns at most `top_k` results. Ties keep original corpus order so
/// rankings are deterministic; records whose embedding dimension differs
/// from the query's are skipped with a warning. The corpus is read-only.
pub fn search(query: &[f32], corpus: &[EmbeddedRecord], top_k: usize) -> Vec<SearchResult> {
    if top_k == 0 || corpus.is_empty() {
        return vec![];
    }

    let mut results: Vec<SearchResult> = corpus
        .iter()
        .filter_map(|record| {
            if record.embedding.len() != query.len() {
                log::warn!(
                    "skipping record {}: embedding dimension {} does not match query dimension {}",
                    record.id(),
                    record.embedding.len(),
                    query.len()
                );
                return None;
            }
            Some(SearchResult {
                subject: record.subject().to_string(),
                body: record.body().map(|b| b.to_string()),
                similarity: cosine_similarity(query, &record.embedding),
            })
        })
        .collect();

    // Stable sort: equal similarities keep corpus order.
    results.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);

    results
}

/// Cosine similarity between two equal-length vectors.
/// Either vector having zero norm yields 0.0 rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
