use serde::{Deserialize, Serialize};

use crate::semantic::DEFAULT_MODEL;

/// Default model download timeout in seconds
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Default maximum number of clusters
const DEFAULT_NUM_CLUSTERS: usize = 20;
/// Default mini-batch size for streaming k-means
const DEFAULT_CLUSTER_BATCH_SIZE: usize = 1000;
/// Default seed for centroid initialization
const DEFAULT_SEED: u64 = 42;
/// Default batch size for embedding generation
const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 32;
/// Default number of query results
const DEFAULT_TOP_K: usize = 5;

/// Question pattern sets: interrogative pronouns matched as whole words,
/// action keywords matched as substrings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionPatterns {
    #[serde(default = "default_pronouns")]
    pub pronouns: Vec<String>,

    #[serde(default = "default_action_keywords")]
    pub action_keywords: Vec<String>,
}

impl Default for QuestionPatterns {
    fn default() -> Self {
        Self {
            pronouns: default_pronouns(),
            action_keywords: default_action_keywords(),
        }
    }
}

fn default_pronouns() -> Vec<String> {
    ["qué", "cómo", "cuándo", "dónde", "por qué", "cuál", "quién", "cuánto"]
        .map(String::from)
        .to_vec()
}

fn default_action_keywords() -> Vec<String> {
    ["precio", "ganar", "invertir", "analizar", "abrir cuenta", "evitar estafa"]
        .map(String::from)
        .to_vec()
}

fn default_domain_keywords() -> Vec<String> {
    [
        "invertir",
        "acciones",
        "opciones",
        "stock options",
        "call",
        "put",
        "forex",
        "divisas",
        "futuros",
        "materias primas",
        "swing trading",
        "broker",
        "estafa",
        "asesoría",
        "precio",
        "servicio",
    ]
    .map(String::from)
    .to_vec()
}

/// Configuration for the dedup & retrieval pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Records whose scrubbed body contains none of these keywords are
    /// dropped before embedding
    #[serde(default = "default_domain_keywords")]
    pub domain_keywords: Vec<String>,

    #[serde(default)]
    pub question_patterns: QuestionPatterns,

    /// Maximum number of clusters (clamped to the question count)
    #[serde(default = "default_num_clusters")]
    pub num_clusters: usize,

    /// Mini-batch size for streaming k-means
    #[serde(default = "default_cluster_batch_size")]
    pub cluster_batch_size: usize,

    /// Seed for centroid initialization
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Batch size for embedding generation
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,

    /// Default number of query results
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            domain_keywords: default_domain_keywords(),
            question_patterns: QuestionPatterns::default(),
            num_clusters: DEFAULT_NUM_CLUSTERS,
            cluster_batch_size: DEFAULT_CLUSTER_BATCH_SIZE,
            seed: DEFAULT_SEED,
            embedding_batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            top_k: DEFAULT_TOP_K,
        }
    }
}

fn default_num_clusters() -> usize {
    DEFAULT_NUM_CLUSTERS
}

fn default_cluster_batch_size() -> usize {
    DEFAULT_CLUSTER_BATCH_SIZE
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_embedding_batch_size() -> usize {
    DEFAULT_EMBEDDING_BATCH_SIZE
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Configuration for embedding generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name for embeddings (e.g., "multilingual-e5-small")
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Timeout for model download in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

fn default_embedding_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Config {
    fn validate(&self) {
        if self.embedding.model.trim().is_empty() {
            panic!("embedding.model must not be empty");
        }

        if self.embedding.download_timeout_secs == 0 {
            panic!("embedding.download_timeout_secs must be greater than 0");
        }
    }

    pub fn load_with(base_path: &str) -> anyhow::Result<Self> {
        std::fs::create_dir_all(base_path)?;
        let config_path = std::path::Path::new(base_path).join("config.yaml");

        // create new if does not exist
        if !config_path.exists() {
            std::fs::write(&config_path, serde_yml::to_string(&Self::default())?)?;
        }

        let config_str = std::fs::read_to_string(&config_path)?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path.to_string();

        config.validate();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = std::path::Path::new(&self.base_path).join("config.yaml");
        std::fs::write(&config_path, serde_yml::to_string(&self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_creates_default_config() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().to_str().unwrap();

        let config = Config::load_with(base).unwrap();

        assert!(tmp.path().join("config.yaml").exists());
        assert_eq!(config.pipeline.num_clusters, 20);
        assert_eq!(config.embedding.model, DEFAULT_MODEL);
        assert!(config
            .pipeline
            .domain_keywords
            .contains(&"invertir".to_string()));
    }

    #[test]
    fn test_partial_config_gets_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().to_str().unwrap();
        std::fs::write(
            tmp.path().join("config.yaml"),
            "pipeline:\n  num_clusters: 7\n",
        )
        .unwrap();

        let config = Config::load_with(base).unwrap();

        assert_eq!(config.pipeline.num_clusters, 7);
        assert_eq!(config.pipeline.seed, 42);
        assert_eq!(config.pipeline.embedding_batch_size, 32);
    }

    #[test]
    fn test_roundtrip_save_load() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().to_str().unwrap();

        let mut config = Config::load_with(base).unwrap();
        config.pipeline.top_k = 11;
        config.save().unwrap();

        let reloaded = Config::load_with(base).unwrap();
        assert_eq!(reloaded.pipeline.top_k, 11);
    }
}
