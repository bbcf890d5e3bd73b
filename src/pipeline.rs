//! Pipeline orchestration.
//!
//! Wires the stages together over in-memory record sequences:
//! normalize/filter → embed in batches → detect questions → cluster →
//! extract the Q/A catalogue. Also answers nearest-neighbor queries
//! against an embedded record set.
//!
//! With the same keyword sets, model, and seed, a run is a pure function
//! of its input records: re-running over unchanged inputs reproduces the
//! same artifacts.

use std::sync::Arc;

use indicatif::ProgressBar;

use crate::catalogue::{self, QaEntry};
use crate::cluster::{Assignment, IncrementalClusterer};
use crate::config::PipelineConfig;
use crate::normalize::TextNormalizer;
use crate::questions::QuestionDetector;
use crate::records::{EmbeddedRecord, NormalizedRecord, Record};
use crate::semantic::{search, Embedder, EmbeddingError, SearchResult};

/// Errors that can abort a pipeline run.
///
/// Configuration problems surface at construction, before any record is
/// processed. Embedder failures abort the run; a batch is never silently
/// treated as empty.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Immutable per-run snapshots, one per stage output. A collaborator may
/// persist each under a caller-chosen key.
pub struct RunArtifacts {
    /// Domain-relevant records after normalization.
    pub filtered: Vec<NormalizedRecord>,
    /// Filtered records with embeddings attached.
    pub embedded: Vec<EmbeddedRecord>,
    /// The question subset of the embedded records.
    pub questions: Vec<EmbeddedRecord>,
    /// Final cluster membership, aligned with `questions`.
    pub assignment: Vec<Assignment>,
    /// One representative Q/A per non-empty cluster.
    pub catalogue: Vec<QaEntry>,
}

/// The semantic dedup & retrieval pipeline.
///
/// Holds one long-lived `Embedder` injected at construction; stages
/// share it instead of re-instantiating the model per call.
pub struct Pipeline {
    normalizer: TextNormalizer,
    detector: QuestionDetector,
    clusterer: IncrementalClusterer,
    embedder: Arc<dyn Embedder>,
    embedding_batch_size: usize,
    top_k: usize,
}

impl Pipeline {
    /// Build a pipeline, validating configuration up front.
    pub fn new(config: &PipelineConfig, embedder: Arc<dyn Embedder>) -> Result<Self, PipelineError> {
        if config.embedding_batch_size == 0 {
            return Err(PipelineError::Config(
                "embedding_batch_size must be greater than 0".to_string(),
            ));
        }

        let normalizer = TextNormalizer::new(&config.domain_keywords)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let detector = QuestionDetector::new(&config.question_patterns)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let clusterer =
            IncrementalClusterer::new(config.num_clusters, config.cluster_batch_size, config.seed)
                .map_err(|e| PipelineError::Config(e.to_string()))?;

        Ok(Self {
            normalizer,
            detector,
            clusterer,
            embedder,
            embedding_batch_size: config.embedding_batch_size,
            top_k: config.top_k,
        })
    }

    /// Run all stages over a record sequence.
    pub fn run(&self, records: Vec<Record>) -> Result<RunArtifacts, PipelineError> {
        let total = records.len();

        let filtered: Vec<NormalizedRecord> = records
            .into_iter()
            .map(|record| self.normalizer.normalize(record))
            .filter(|normalized| normalized.is_domain_relevant)
            .collect();
        log::info!("{} of {} records are domain-relevant", filtered.len(), total);

        let embedded = self.embed(&filtered)?;

        // Question detection runs over the raw body: scrubbing strips the
        // literal '?' the detector needs to see.
        let questions: Vec<EmbeddedRecord> = embedded
            .iter()
            .filter(|record| self.detector.is_question(record.body().unwrap_or("")))
            .cloned()
            .collect();
        log::info!("{} questions identified", questions.len());

        let vectors: Vec<Vec<f32>> = questions.iter().map(|q| q.embedding.clone()).collect();
        let centroids = self.clusterer.fit(&vectors);
        let labels = IncrementalClusterer::assign(&vectors, &centroids);
        log::info!(
            "{} questions clustered into {} clusters",
            questions.len(),
            centroids.len()
        );

        let assignment: Vec<Assignment> = questions
            .iter()
            .zip(&labels)
            .map(|(question, &cluster)| Assignment {
                record_id: question.id(),
                cluster,
            })
            .collect();

        let catalogue = catalogue::extract(&questions, &labels);

        Ok(RunArtifacts {
            filtered,
            embedded,
            questions,
            assignment,
            catalogue,
        })
    }

    /// Encode a query and rank `corpus` against it.
    pub fn query(
        &self,
        text: &str,
        corpus: &[EmbeddedRecord],
        top_k: Option<usize>,
    ) -> Result<Vec<SearchResult>, PipelineError> {
        let vectors = self.embedder.encode(&[text.to_string()])?;
        let query_embedding = vectors.into_iter().next().ok_or_else(|| {
            PipelineError::Embedding(EmbeddingError::EmbeddingFailed(
                "No embedding returned".to_string(),
            ))
        })?;

        Ok(search::search(
            &query_embedding,
            corpus,
            top_k.unwrap_or(self.top_k),
        ))
    }

    /// Embed the filtered set in bounded-size batches.
    ///
    /// A record whose returned embedding does not match the model
    /// dimension is excluded with a warning; the run continues. An
    /// encode failure aborts the whole run.
    fn embed(&self, filtered: &[NormalizedRecord]) -> Result<Vec<EmbeddedRecord>, PipelineError> {
        let dimensions = self.embedder.dimensions();
        let bar = ProgressBar::new(filtered.len() as u64);
        let mut embedded = Vec::with_capacity(filtered.len());

        for chunk in filtered.chunks(self.embedding_batch_size) {
            let texts: Vec<String> = chunk
                .iter()
                .map(|normalized| normalized.processed_text.clone())
                .collect();
            let vectors = self.embedder.encode(&texts)?;

            for (normalized, embedding) in chunk.iter().zip(vectors) {
                if embedding.len() != dimensions {
                    log::warn!(
                        "excluding record {}: embedding dimension {} does not match model dimension {}",
                        normalized.record.id,
                        embedding.len(),
                        dimensions
                    );
                    continue;
                }
                embedded.push(EmbeddedRecord {
                    normalized: normalized.clone(),
                    embedding,
                });
            }
            bar.inc(chunk.len() as u64);
        }

        bar.finish_and_clear();
        log::info!("{} records embedded", embedded.len());
        Ok(embedded)
    }
}
