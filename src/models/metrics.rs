//! Ingestion run metrics, accumulated across pipeline stages.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The ordered stages of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scrape,
    Normalize,
    ChunkEmbed,
    Index,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scrape => "scrape",
            Stage::Normalize => "normalize",
            Stage::ChunkEmbed => "chunk_embed",
            Stage::Index => "index",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics for one ingestion run.
///
/// Counters only grow while the run is in flight; the total duration is set
/// exactly once when the run finalizes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionMetrics {
    pub pages_scraped: u64,
    pub pages_failed: u64,
    pub total_chunks_created: u64,
    pub total_tokens_processed: u64,
    pub stage_durations_ms: BTreeMap<String, u64>,
    pub total_duration_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
}

impl IngestionMetrics {
    /// Record the duration of one completed stage.
    pub fn record_stage(&mut self, stage: Stage, duration: Duration) {
        self.stage_durations_ms
            .insert(stage.as_str().to_string(), duration.as_millis() as u64);
    }

    /// Finalize the run with its wall-clock duration.
    pub fn finalize(&mut self, total: Duration) {
        self.total_duration_ms = total.as_millis() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_are_stable() {
        assert_eq!(Stage::Scrape.as_str(), "scrape");
        assert_eq!(Stage::Normalize.as_str(), "normalize");
        assert_eq!(Stage::ChunkEmbed.as_str(), "chunk_embed");
        assert_eq!(Stage::Index.as_str(), "index");
    }

    #[test]
    fn test_record_and_finalize() {
        let mut metrics = IngestionMetrics::default();
        metrics.record_stage(Stage::Scrape, Duration::from_millis(1200));
        metrics.record_stage(Stage::Index, Duration::from_millis(300));
        metrics.finalize(Duration::from_millis(1550));

        assert_eq!(metrics.stage_durations_ms["scrape"], 1200);
        assert_eq!(metrics.stage_durations_ms["index"], 300);
        assert_eq!(metrics.total_duration_ms, 1550);
    }
}
