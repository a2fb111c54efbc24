//! Query-side models: retrieval matches, answers, citations, and metrics.

use serde::{Deserialize, Serialize};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A chunk returned by the vector store for one question.
///
/// Ephemeral; ordered by non-increasing similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedMatch {
    pub chunk_id: String,
    pub score: f32,
    pub text: String,
    pub url: String,
    pub title: String,
    pub page_type: String,
    pub chunk_index: u32,
}

/// A source attributed to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Timing, token, and cost metrics for one answered question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryMetrics {
    pub total_latency_ms: u64,
    pub retrieval_ms: u64,
    pub llm_ms: u64,
    pub post_processing_ms: u64,
    pub docs_retrieved: usize,
    pub docs_used: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub estimated_cost_usd: f64,
}

/// The answer to one question, immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub metrics: QueryMetrics,
}

/// Aggregate metrics for a batch of questions.
///
/// Latencies, tokens, and cost are summed over the individual questions;
/// `wall_clock_ms` is the span of the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub questions: usize,
    pub answered: usize,
    pub failed: usize,
    pub total_latency_ms: u64,
    pub wall_clock_ms: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub estimated_cost_usd: f64,
}

impl BatchMetrics {
    /// Fold one answered question into the aggregate.
    pub fn accumulate(&mut self, metrics: &QueryMetrics) {
        self.answered += 1;
        self.total_latency_ms += metrics.total_latency_ms;
        self.input_tokens += metrics.input_tokens;
        self.output_tokens += metrics.output_tokens;
        self.estimated_cost_usd += metrics.estimated_cost_usd;
    }
}
