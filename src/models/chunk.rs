//! The chunk model: the unit of embedding, indexing, and retrieval.

use serde::{Deserialize, Serialize};

use super::page::CleanedDocument;

/// A bounded-size slice of a document's token stream.
///
/// Carries enough source metadata to reconstruct a citation without
/// re-reading the source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub url: String,
    pub title: String,
    pub page_type: String,
    pub chunk_index: u32,
    pub text: String,
    pub token_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Stable document identifier derived from the source URL.
    ///
    /// Re-ingesting the same page yields the same document id, so its chunk
    /// ids collide with the previous run's and upserts overwrite instead of
    /// duplicating.
    pub fn document_id(url: &str) -> String {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(url.as_bytes());
        hex::encode(&hash[..16])
    }

    /// Deterministic chunk identifier: UUIDv5 of `document_id:chunk_index`.
    pub fn generate_id(document_id: &str, chunk_index: u32) -> String {
        use uuid::Uuid;
        let name = format!("{}:{}", document_id, chunk_index);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    /// Build a chunk from a window of a cleaned document.
    pub fn from_document(
        document: &CleanedDocument,
        text: String,
        chunk_index: u32,
        token_count: usize,
    ) -> Self {
        let document_id = Self::document_id(&document.url);
        let id = Self::generate_id(&document_id, chunk_index);
        Self {
            id,
            document_id,
            url: document.url.clone(),
            title: document.title.clone(),
            page_type: document.page_type.clone(),
            chunk_index,
            text,
            token_count,
            embedding: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_stable() {
        let a = Chunk::document_id("https://e.com/products/a");
        let b = Chunk::document_id("https://e.com/products/a");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, Chunk::document_id("https://e.com/products/b"));
    }

    #[test]
    fn test_chunk_id_deterministic_per_index() {
        let id = Chunk::generate_id("abc123", 5);
        assert_eq!(id.len(), 36);
        assert_eq!(id, Chunk::generate_id("abc123", 5));
        assert_ne!(id, Chunk::generate_id("abc123", 6));
    }

    #[test]
    fn test_from_document_carries_citation_metadata() {
        let doc = CleanedDocument {
            url: "https://e.com/products/a".into(),
            title: "Product A".into(),
            page_type: "products".into(),
            text: "irrelevant".into(),
        };
        let chunk = Chunk::from_document(&doc, "window text".into(), 2, 2);
        assert_eq!(chunk.url, doc.url);
        assert_eq!(chunk.title, "Product A");
        assert_eq!(chunk.page_type, "products");
        assert_eq!(chunk.chunk_index, 2);
        assert!(chunk.embedding.is_empty());
    }
}
