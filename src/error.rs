//! Error types for the siteqa pipeline and query engine.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors raised while fetching a single page during a crawl.
///
/// Always recoverable at the crawl level: the failure is recorded and the
/// traversal moves on to the next frontier entry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("fetch timeout for {0}")]
    Timeout(String),
}

/// Errors raised while extracting plain text from fetched HTML.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("empty document")]
    EmptyDocument,

    #[error("no textual content extracted")]
    NoContent,
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("vector store client error: {0}")]
    ClientError(String),
}

/// Errors raised by the generative model.
///
/// Generation failures are never retried automatically; they fail the
/// individual question they belong to.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("model returned HTTP {0}: {1}")]
    ApiError(u16, String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("generation timeout")]
    Timeout,
}

/// Errors fatal to an ingestion run.
///
/// A run that fails to embed or index does not report partial success; the
/// error propagates to the caller as a run failure.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("chunking error: {0}")]
    ChunkError(String),

    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("no pages scraped from the given seeds")]
    NoPagesScraped,
}

/// Errors raised while answering a question.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("generation error: {0}")]
    GenerationError(#[from] GenerationError),

    #[error("invalid question: {0}")]
    InvalidQuestion(String),
}

/// Errors raised while delivering a completion webhook.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("connection failed: {0}")]
    ConnectionError(String),

    #[error("callback returned HTTP {0}")]
    HttpStatus(u16),

    #[error("delivery timeout")]
    Timeout,
}

impl Retryable for DeliveryError {
    fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::ConnectionError(_) | DeliveryError::Timeout => true,
            // 4xx means the callback rejected the payload; retrying the same
            // request cannot succeed. 5xx may be transient.
            DeliveryError::HttpStatus(status) => *status >= 500,
        }
    }
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_retry_classification() {
        assert!(DeliveryError::Timeout.is_retryable());
        assert!(DeliveryError::ConnectionError("refused".into()).is_retryable());
        assert!(DeliveryError::HttpStatus(500).is_retryable());
        assert!(DeliveryError::HttpStatus(503).is_retryable());
        assert!(!DeliveryError::HttpStatus(400).is_retryable());
        assert!(!DeliveryError::HttpStatus(404).is_retryable());
        assert!(!DeliveryError::HttpStatus(422).is_retryable());
    }
}
