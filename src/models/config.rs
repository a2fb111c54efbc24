use serde::{Deserialize, Serialize};

use super::answer::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_GENERATION_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_COLLECTION: &str = "siteqa";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("siteqa").join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.overlap_size >= self.chunking.max_chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "chunking.overlap_size ({}) must be smaller than chunking.max_chunk_size ({})",
                self.chunking.overlap_size, self.chunking.max_chunk_size
            )));
        }
        if self.query.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "query.top_k must be at least 1".to_string(),
            ));
        }
        if self.crawl.concurrency == 0 || self.query.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "concurrency bounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Maximum link depth from a seed URL.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Upper bound on in-flight page fetches.
    #[serde(default = "default_crawl_concurrency")]
    pub concurrency: usize,

    /// Pacing delay before each fetch dispatch, in milliseconds.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Path sections that links must fall under to be enqueued.
    #[serde(default = "default_page_types")]
    pub page_types: Vec<String>,
}

fn default_max_depth() -> u32 {
    3
}

fn default_crawl_concurrency() -> usize {
    8
}

fn default_request_delay_ms() -> u64 {
    100
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_page_types() -> Vec<String> {
    vec!["products".to_string(), "solutions".to_string()]
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            concurrency: default_crawl_concurrency(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_fetch_timeout(),
            page_types: default_page_types(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window width in tokens.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Tokens shared between consecutive windows.
    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,
}

fn default_max_chunk_size() -> usize {
    400
}

fn default_overlap_size() -> usize {
    80
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            overlap_size: default_overlap_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: u32,

    /// Vector width produced by the embedding server.
    #[serde(default = "default_embedding_dimension")]
    pub dimension: u64,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_timeout() -> u64 {
    120
}

fn default_embedding_batch_size() -> u32 {
    32
}

fn default_embedding_dimension() -> u64 {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            timeout_secs: default_embedding_timeout(),
            batch_size: default_embedding_batch_size(),
            dimension: default_embedding_dimension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection: default_collection(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Read from `SITEQA_API_KEY` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// USD per 1K input tokens; overrides the built-in pricing table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_cost_per_1k: Option<f64>,

    /// USD per 1K output tokens; overrides the built-in pricing table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_cost_per_1k: Option<f64>,
}

fn default_generation_url() -> String {
    DEFAULT_GENERATION_URL.to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_generation_timeout() -> u64 {
    60
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: default_generation_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_generation_timeout(),
            input_cost_per_1k: None,
            output_cost_per_1k: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Highest-similarity chunks retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: u64,

    /// Upper bound on in-flight questions in concurrent batch mode.
    #[serde(default = "default_query_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_top_k() -> u64 {
    10
}

fn default_query_concurrency() -> usize {
    4
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            concurrency: default_query_concurrency(),
            default_format: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Per-attempt delivery timeout.
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,

    /// Additional attempts after the first.
    #[serde(default = "default_webhook_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts.
    #[serde(default = "default_webhook_retry_delay")]
    pub retry_delay_secs: u64,
}

fn default_webhook_timeout() -> u64 {
    30
}

fn default_webhook_max_retries() -> u32 {
    3
}

fn default_webhook_retry_delay() -> u64 {
    5
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_webhook_timeout(),
            max_retries: default_webhook_max_retries(),
            retry_delay_secs: default_webhook_retry_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.embedding.url, DEFAULT_EMBEDDING_URL);
        assert_eq!(config.vector_store.url, DEFAULT_QDRANT_URL);
        assert_eq!(config.vector_store.collection, DEFAULT_COLLECTION);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_chunking_defaults_match_window_invariant() {
        let config = ChunkingConfig::default();
        assert_eq!(config.max_chunk_size, 400);
        assert_eq!(config.overlap_size, 80);
        assert!(config.overlap_size < config.max_chunk_size);
    }

    #[test]
    fn test_validate_rejects_overlap_at_least_window() {
        let mut config = Config::default();
        config.chunking.max_chunk_size = 100;
        config.chunking.overlap_size = 100;
        assert!(config.validate().is_err());

        config.chunking.overlap_size = 150;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let mut config = Config::default();
        config.query.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.crawl.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_webhook_defaults() {
        let config = WebhookConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_secs, 5);
    }
}
