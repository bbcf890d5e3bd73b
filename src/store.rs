//! Run snapshot persistence.
//!
//! Each pipeline run is stored under `<base>/<key>/` as immutable
//! snapshots: JSON for the text-bearing artifacts, and the embedded set
//! in a binary `embedded.bin` file:
//!
//! Header (47 bytes):
//! - version: u8 (1)
//! - model_id: [u8; 32] (SHA256 hash of model name)
//! - dimensions: u16 (little-endian)
//! - entry_count: u64 (little-endian)
//! - checksum: u32 (CRC32 of header fields before checksum)
//!
//! Entries (repeated):
//! - record_id: u64 (little-endian)
//! - content_hash: u64 (little-endian, hash of the processed text)
//! - embedding: [f32; dimensions] (little-endian)
//!
//! Loading joins `embedded.bin` back against `filtered.json` by record id
//! and verifies each entry's content hash, so a drifted pair of snapshot
//! files is detected instead of silently recombined.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::catalogue::QaEntry;
use crate::pipeline::RunArtifacts;
use crate::records::{EmbeddedRecord, NormalizedRecord};
use crate::runid::RunId;

/// Current file format version
const FORMAT_VERSION: u8 = 1;

/// Header size in bytes: version(1) + model_id(32) + dimensions(2) + entry_count(8) + checksum(4)
const HEADER_SIZE: usize = 47;

/// Errors that can occur during snapshot operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No stored run named '{0}'")]
    UnknownRun(String),

    #[error("Version mismatch: file version {0}, supported version {1}")]
    VersionMismatch(u8, u8),

    #[error("Model mismatch: run was embedded with a different model")]
    ModelMismatch,

    #[error("Checksum mismatch: file may be corrupted")]
    ChecksumMismatch,

    #[error("Dimension mismatch: expected {expected}, file has {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Entry {id} has no matching record in filtered.json")]
    MissingRecord { id: u64 },

    #[error("Entry {id} does not match the stored record text")]
    ContentMismatch { id: u64 },
}

/// Snapshot store for pipeline runs, one subdirectory per run key.
pub struct RunStore {
    base_dir: PathBuf,
}

impl RunStore {
    pub fn new(base_dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Persist every artifact of a run under the given key.
    /// Overwrites any previous run stored under the same key.
    ///
    /// `dimensions` is the run's fixed embedding dimension; it is stored
    /// even when the embedded set is empty so a later load validates
    /// against the right model.
    pub fn save_run(
        &self,
        key: &str,
        artifacts: &RunArtifacts,
        model_id: &[u8; 32],
        dimensions: usize,
    ) -> Result<(), StoreError> {
        let dir = self.base_dir.join(key);
        std::fs::create_dir_all(&dir)?;

        self.write_json(&dir.join("filtered.json"), &artifacts.filtered)?;
        let question_ids: Vec<u64> = artifacts.questions.iter().map(|q| q.id()).collect();
        self.write_json(&dir.join("questions.json"), &question_ids)?;
        self.write_json(&dir.join("assignment.json"), &artifacts.assignment)?;
        self.write_json(&dir.join("catalogue.json"), &artifacts.catalogue)?;
        self.write_vectors(&dir.join("embedded.bin"), &artifacts.embedded, model_id, dimensions)?;

        log::info!("run '{key}' saved to {}", dir.display());
        Ok(())
    }

    /// Load the embedded record set of a stored run.
    pub fn load_embedded(
        &self,
        key: &str,
        expected_model_id: &[u8; 32],
        expected_dimensions: usize,
    ) -> Result<Vec<EmbeddedRecord>, StoreError> {
        let dir = self.run_dir(key)?;

        let filtered: Vec<NormalizedRecord> = self.read_json(&dir.join("filtered.json"))?;
        let by_id: HashMap<u64, NormalizedRecord> = filtered
            .into_iter()
            .map(|normalized| (normalized.record.id, normalized))
            .collect();

        let entries =
            self.read_vectors(&dir.join("embedded.bin"), expected_model_id, expected_dimensions)?;

        let mut embedded = Vec::with_capacity(entries.len());
        for (id, content_hash, embedding) in entries {
            let normalized = by_id
                .get(&id)
                .ok_or(StoreError::MissingRecord { id })?
                .clone();
            if text_hash(&normalized.processed_text) != content_hash {
                return Err(StoreError::ContentMismatch { id });
            }
            embedded.push(EmbeddedRecord {
                normalized,
                embedding,
            });
        }

        Ok(embedded)
    }

    /// Load the Q/A catalogue of a stored run.
    pub fn load_catalogue(&self, key: &str) -> Result<Vec<QaEntry>, StoreError> {
        let dir = self.run_dir(key)?;
        self.read_json(&dir.join("catalogue.json"))
    }

    fn run_dir(&self, key: &str) -> Result<PathBuf, StoreError> {
        let dir = self.base_dir.join(key);
        if !dir.is_dir() {
            return Err(StoreError::UnknownRun(key.to_string()));
        }
        Ok(dir)
    }

    /// Atomic JSON write: temp file then rename.
    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let temp_path = path.with_file_name(format!(
            "{}-{}",
            RunId::new(),
            path.file_name().and_then(|n| n.to_str()).unwrap_or("snapshot")
        ));

        std::fs::write(&temp_path, serde_json::to_vec_pretty(value)?)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, StoreError> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Write the embedded set to a binary file.
    ///
    /// Uses atomic write: temp file -> fsync -> rename
    fn write_vectors(
        &self,
        path: &Path,
        embedded: &[EmbeddedRecord],
        model_id: &[u8; 32],
        dimensions: usize,
    ) -> Result<(), StoreError> {
        let temp_path = path.with_extension("tmp");

        let result = self.write_vectors_to(&temp_path, embedded, model_id, dimensions);
        if result.is_err() {
            let _ = std::fs::remove_file(&temp_path);
            return result;
        }

        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    fn write_vectors_to(
        &self,
        path: &Path,
        embedded: &[EmbeddedRecord],
        model_id: &[u8; 32],
        dimensions: usize,
    ) -> Result<(), StoreError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut header_bytes = [0u8; HEADER_SIZE];
        header_bytes[0] = FORMAT_VERSION;
        header_bytes[1..33].copy_from_slice(model_id);
        header_bytes[33..35].copy_from_slice(&(dimensions as u16).to_le_bytes());
        header_bytes[35..43].copy_from_slice(&(embedded.len() as u64).to_le_bytes());
        let checksum = crc32fast::hash(&header_bytes[0..43]);
        header_bytes[43..47].copy_from_slice(&checksum.to_le_bytes());
        writer.write_all(&header_bytes)?;

        for record in embedded {
            writer.write_all(&record.id().to_le_bytes())?;
            writer.write_all(&text_hash(&record.normalized.processed_text).to_le_bytes())?;
            for &value in &record.embedding {
                writer.write_all(&value.to_le_bytes())?;
            }
        }

        writer.flush()?;
        let file = writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        file.sync_all()?;

        Ok(())
    }

    /// Read and validate the binary embedded set.
    fn read_vectors(
        &self,
        path: &Path,
        expected_model_id: &[u8; 32],
        expected_dimensions: usize,
    ) -> Result<Vec<(u64, u64, Vec<f32>)>, StoreError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut header_bytes = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header_bytes)?;

        let version = header_bytes[0];
        if version > FORMAT_VERSION {
            return Err(StoreError::VersionMismatch(version, FORMAT_VERSION));
        }

        let stored_checksum = u32::from_le_bytes([
            header_bytes[43],
            header_bytes[44],
            header_bytes[45],
            header_bytes[46],
        ]);
        if stored_checksum != crc32fast::hash(&header_bytes[0..43]) {
            return Err(StoreError::ChecksumMismatch);
        }

        if header_bytes[1..33] != *expected_model_id {
            return Err(StoreError::ModelMismatch);
        }

        let dimensions = u16::from_le_bytes([header_bytes[33], header_bytes[34]]) as usize;
        if dimensions != expected_dimensions {
            return Err(StoreError::DimensionMismatch {
                expected: expected_dimensions,
                got: dimensions,
            });
        }

        let entry_count = u64::from_le_bytes(header_bytes[35..43].try_into().expect("8 bytes"));

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let mut id_bytes = [0u8; 8];
            reader.read_exact(&mut id_bytes)?;
            let id = u64::from_le_bytes(id_bytes);

            let mut hash_bytes = [0u8; 8];
            reader.read_exact(&mut hash_bytes)?;
            let content_hash = u64::from_le_bytes(hash_bytes);

            let mut embedding = Vec::with_capacity(dimensions);
            for _ in 0..dimensions {
                let mut float_bytes = [0u8; 4];
                reader.read_exact(&mut float_bytes)?;
                embedding.push(f32::from_le_bytes(float_bytes));
            }

            entries.push((id, content_hash, embedding));
        }

        Ok(entries)
    }
}

/// Hash of the processed text, stored per entry for drift detection.
fn text_hash(text: &str) -> u64 {
    use std::hash::{Hash, Hasher};

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}
