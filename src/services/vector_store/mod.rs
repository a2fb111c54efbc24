//! Vector store abstraction layer.
//!
//! The pipeline and query engine talk to a [`VectorStore`] trait object so
//! tests can substitute an in-memory fake for the Qdrant backend.

mod qdrant;

pub use qdrant::QdrantBackend;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{Chunk, RetrievedMatch, VectorStoreConfig};

/// Collection information.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
}

/// Abstract trait for vector store operations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the vector store is healthy and accessible.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Get information about the current collection.
    /// Returns None if the collection doesn't exist.
    async fn collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError>;

    /// Create the collection if it doesn't exist.
    async fn create_collection(&self) -> Result<(), VectorStoreError>;

    /// Insert or update embedded chunks. Chunk ids are stable per source
    /// URL and index, so re-ingesting a page overwrites its prior chunks.
    async fn upsert_chunks(&self, chunks: Vec<Chunk>) -> Result<(), VectorStoreError>;

    /// Retrieve up to `limit` chunks by descending cosine similarity.
    async fn search(
        &self,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<RetrievedMatch>, VectorStoreError>;

    /// Get the collection name.
    fn collection(&self) -> &str;
}

/// Create the vector store backend from configuration.
///
/// Returns a shared handle: the store is constructed once at process start
/// and reused by the ingestion pipeline and the query engine.
pub fn create_backend(
    config: &VectorStoreConfig,
    embedding_dim: u64,
) -> Result<Arc<dyn VectorStore>, VectorStoreError> {
    let backend = QdrantBackend::new(config, embedding_dim)?;
    Ok(Arc::new(backend))
}
