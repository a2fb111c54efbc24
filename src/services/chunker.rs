//! Token-window chunking with overlap.

use crate::models::{ChunkingConfig, CleanedDocument, Chunk};

/// Splits cleaned documents into overlapping fixed-size token windows.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chunk_size: usize,
    overlap_size: usize,
}

impl TextChunker {
    /// Create a chunker from configuration. Callers validate
    /// `overlap_size < max_chunk_size` at config load.
    pub fn new(config: &ChunkingConfig) -> Self {
        Self {
            max_chunk_size: config.max_chunk_size,
            overlap_size: config.overlap_size,
        }
    }

    /// Create a chunker with default settings.
    pub fn with_defaults() -> Self {
        Self::new(&ChunkingConfig::default())
    }

    /// Chunk a document into overlapping token windows.
    ///
    /// Consecutive chunks from the same document share exactly
    /// `overlap_size` tokens; the final window may be shorter than
    /// `max_chunk_size`. Deterministic for identical input.
    pub fn chunk(&self, document: &CleanedDocument) -> Vec<Chunk> {
        let tokens: Vec<&str> = document.text.split_whitespace().collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        // Config validation guarantees overlap < window; guard anyway so a
        // hand-built chunker can never loop in place.
        let step = if self.max_chunk_size > self.overlap_size {
            self.max_chunk_size - self.overlap_size
        } else {
            self.max_chunk_size.max(1)
        };

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < tokens.len() {
            let end = (start + self.max_chunk_size).min(tokens.len());
            let window = &tokens[start..end];
            chunks.push(Chunk::from_document(
                document,
                window.join(" "),
                chunks.len() as u32,
                window.len(),
            ));

            if end >= tokens.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Estimate the number of tokens in a text.
/// Uses a simple heuristic: ~4 characters per token on average.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() / 4) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_of_tokens(n: usize) -> CleanedDocument {
        let text = (0..n).map(|i| format!("t{}", i)).collect::<Vec<_>>().join(" ");
        CleanedDocument {
            url: "https://e.com/products/a".into(),
            title: "A".into(),
            page_type: "products".into(),
            text,
        }
    }

    fn chunker(max: usize, overlap: usize) -> TextChunker {
        TextChunker::new(&ChunkingConfig {
            max_chunk_size: max,
            overlap_size: overlap,
        })
    }

    #[test]
    fn test_small_document_single_chunk() {
        let chunks = chunker(400, 80).chunk(&doc_of_tokens(10));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].token_count, 10);
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn test_empty_document() {
        let doc = CleanedDocument {
            url: "https://e.com".into(),
            title: String::new(),
            page_type: String::new(),
            text: "   ".into(),
        };
        assert!(TextChunker::with_defaults().chunk(&doc).is_empty());
    }

    #[test]
    fn test_no_chunk_exceeds_window() {
        let chunks = chunker(50, 10).chunk(&doc_of_tokens(1000));
        for chunk in &chunks {
            assert!(chunk.token_count <= 50);
        }
    }

    #[test]
    fn test_consecutive_chunks_share_exact_overlap() {
        let chunks = chunker(50, 10).chunk(&doc_of_tokens(200));
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].text.split_whitespace().collect();
            let next: Vec<&str> = pair[1].text.split_whitespace().collect();
            let tail = &prev[prev.len() - 10..];
            let head = &next[..10];
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_window_count_matches_stride() {
        // 200 tokens, window 50, step 40: starts at 0,40,80,120,160.
        let chunks = chunker(50, 10).chunk(&doc_of_tokens(200));
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[4].token_count, 40);

        let indices: Vec<u32> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_exact_window_fit_is_one_chunk() {
        let chunks = chunker(400, 80).chunk(&doc_of_tokens(400));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].token_count, 400);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let doc = doc_of_tokens(400);
        let chunker = chunker(400, 80);
        let first = chunker.chunk(&doc);
        let second = chunker.chunk(&doc);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.text, b.text);
            assert_eq!(a.token_count, b.token_count);
        }
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens("1234"), 1);
        assert_eq!(estimate_tokens("12345678"), 2);
        assert_eq!(estimate_tokens(""), 0);
    }
}
