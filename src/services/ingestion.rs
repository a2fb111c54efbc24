//! The ingestion pipeline: scrape, normalize, chunk, embed, index.
//!
//! Per-page failures (fetch, extraction) are recorded in the run metrics
//! and never abort the run. Embedding and indexing failures do abort it: a
//! corpus that only partially indexed is reported as a failed run, not a
//! partial success.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::chunker::TextChunker;
use super::crawler::Crawler;
use super::extractor::ContentExtractor;
use super::embedding::EmbeddingProvider;
use super::vector_store::VectorStore;
use crate::error::{EmbeddingError, IngestError};
use crate::models::{Chunk, CleanedDocument, IngestionMetrics, PageRecord, Stage};

/// Orchestrates one ingestion run over shared collaborator handles.
pub struct IngestionPipeline {
    crawler: Crawler,
    extractor: Arc<dyn ContentExtractor>,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl IngestionPipeline {
    pub fn new(
        crawler: Crawler,
        extractor: Arc<dyn ContentExtractor>,
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            crawler,
            extractor,
            chunker,
            embedder,
            store,
        }
    }

    /// Run the full pipeline and return the finalized metrics.
    pub async fn run(
        &self,
        seed_urls: &[String],
        page_types: &[String],
        max_depth: u32,
    ) -> Result<IngestionMetrics, IngestError> {
        let run_start = Instant::now();
        let mut metrics = IngestionMetrics::default();

        // Stage 1: scrape. Page failures are partial, never fatal.
        let stage_start = Instant::now();
        let outcome = self.crawler.crawl(seed_urls, page_types, max_depth).await;
        metrics.pages_scraped = outcome.pages.len() as u64;
        metrics.pages_failed = outcome.failures.len() as u64;
        for failure in &outcome.failures {
            metrics
                .errors
                .push(format!("{}: {}", failure.url, failure.error));
        }
        metrics.record_stage(Stage::Scrape, stage_start.elapsed());
        info!(
            pages = outcome.pages.len(),
            failures = outcome.failures.len(),
            "scrape stage finished"
        );

        if outcome.pages.is_empty() {
            return Err(IngestError::NoPagesScraped);
        }

        // Stage 2: normalize. Extraction failures skip the page and count
        // toward pages_failed.
        let stage_start = Instant::now();
        let mut documents = Vec::with_capacity(outcome.pages.len());
        for page in &outcome.pages {
            match self.normalize(page) {
                Ok(document) => documents.push(document),
                Err(e) => {
                    warn!(url = %page.url, error = %e, "extraction failed, page skipped");
                    metrics.pages_failed += 1;
                    metrics.errors.push(format!("{}: {}", page.url, e));
                }
            }
        }
        metrics.record_stage(Stage::Normalize, stage_start.elapsed());
        info!(documents = documents.len(), "normalize stage finished");

        // Stage 3: chunk and embed. Any failure here is fatal to the run.
        let stage_start = Instant::now();
        let mut chunks: Vec<Chunk> = Vec::new();
        for document in &documents {
            chunks.extend(self.chunker.chunk(document));
        }
        metrics.total_chunks_created = chunks.len() as u64;
        metrics.total_tokens_processed =
            chunks.iter().map(|c| c.token_count as u64).sum();

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(texts).await?;
        if vectors.len() != chunks.len() {
            return Err(IngestError::EmbeddingError(EmbeddingError::InvalidResponse(
                format!("{} vectors for {} chunks", vectors.len(), chunks.len()),
            )));
        }
        for (chunk, vector) in chunks.iter_mut().zip(vectors) {
            chunk.embedding = vector;
        }
        metrics.record_stage(Stage::ChunkEmbed, stage_start.elapsed());
        info!(
            chunks = metrics.total_chunks_created,
            tokens = metrics.total_tokens_processed,
            "chunk+embed stage finished"
        );

        // Stage 4: index. Chunk ids are stable per url+index, so re-running
        // ingestion on the same pages overwrites instead of duplicating.
        let stage_start = Instant::now();
        self.store.create_collection().await?;
        self.store.upsert_chunks(chunks).await?;
        metrics.record_stage(Stage::Index, stage_start.elapsed());

        metrics.finalize(run_start.elapsed());
        info!(
            total_ms = metrics.total_duration_ms,
            pages = metrics.pages_scraped,
            failed = metrics.pages_failed,
            "ingestion run finished"
        );
        Ok(metrics)
    }

    /// Derive one cleaned document from a page record.
    ///
    /// Fragment texts are concatenated in discovery order; the title is
    /// prepended so it contributes to retrieval.
    fn normalize(&self, page: &PageRecord) -> Result<CleanedDocument, crate::error::ExtractError> {
        let mut parts = Vec::with_capacity(page.html_fragments.len() + 1);
        if !page.title.is_empty() {
            parts.push(page.title.clone());
        }
        for fragment in &page.html_fragments {
            parts.push(self.extractor.extract(&fragment.html)?);
        }
        Ok(CleanedDocument {
            url: page.url.clone(),
            title: page.title.clone(),
            page_type: page.page_type.clone(),
            text: parts.join("\n\n"),
        })
    }
}
