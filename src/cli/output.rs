use std::fmt::Write as FmtWrite;

use crate::models::{AnswerRecord, IngestionMetrics, OutputFormat};
use crate::services::{BatchOutcome, JobLogSummary};

pub trait Formatter {
    fn format_answer(&self, record: &AnswerRecord) -> String;
    fn format_batch(&self, outcome: &BatchOutcome) -> String;
    fn format_ingestion(&self, metrics: &IngestionMetrics) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub embedding_url: String,
    pub embedding_connected: bool,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub vector_store_points: u64,
    pub collection: String,
    pub model: String,
    pub jobs: Option<JobLogSummary>,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_answer(&self, record: &AnswerRecord) -> String {
        let mut output = String::new();
        writeln!(output, "Q: {}", record.question).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "{}", record.answer.trim()).unwrap();

        if !record.citations.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "Sources:").unwrap();
            for (i, citation) in record.citations.iter().enumerate() {
                writeln!(output, "  {}. {} - {}", i + 1, citation.title, citation.url).unwrap();
                if !citation.snippet.is_empty() {
                    writeln!(output, "     {}", citation.snippet).unwrap();
                }
            }
        }

        output
    }

    fn format_batch(&self, outcome: &BatchOutcome) -> String {
        let mut output = String::new();

        for (question, result) in outcome.questions.iter().zip(&outcome.results) {
            match result {
                Ok(record) => output.push_str(&self.format_answer(record)),
                Err(error) => {
                    writeln!(output, "Q: {}", question).unwrap();
                    writeln!(output).unwrap();
                    writeln!(output, "  [failed: {}]", error).unwrap();
                }
            }
            writeln!(output, "{}", "-".repeat(60)).unwrap();
        }

        let m = &outcome.metrics;
        writeln!(
            output,
            "{} questions: {} answered, {} failed in {}ms (wall clock)",
            m.questions, m.answered, m.failed, m.wall_clock_ms
        )
        .unwrap();
        writeln!(
            output,
            "Tokens: {} in / {} out, estimated cost ${:.6}",
            m.input_tokens, m.output_tokens, m.estimated_cost_usd
        )
        .unwrap();

        output
    }

    fn format_ingestion(&self, metrics: &IngestionMetrics) -> String {
        let mut output = String::new();
        writeln!(output, "Ingestion complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Pages scraped:    {}", metrics.pages_scraped).unwrap();
        writeln!(output, "Pages failed:     {}", metrics.pages_failed).unwrap();
        writeln!(output, "Chunks created:   {}", metrics.total_chunks_created).unwrap();
        writeln!(output, "Tokens processed: {}", metrics.total_tokens_processed).unwrap();
        for (stage, ms) in &metrics.stage_durations_ms {
            writeln!(output, "  {:<12} {}ms", format!("{}:", stage), ms).unwrap();
        }
        writeln!(output, "Total:            {}ms", metrics.total_duration_ms).unwrap();

        if !metrics.errors.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "Errors:").unwrap();
            for error in &metrics.errors {
                writeln!(output, "  {}", error).unwrap();
            }
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let embedding = if status.embedding_connected {
            "[CONNECTED]"
        } else {
            "[DOWN]"
        };
        writeln!(output, "Embedding:    {} {}", embedding, status.embedding_url).unwrap();

        let store = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DOWN]"
        };
        writeln!(output, "Vector store: {} {}", store, status.vector_store_url).unwrap();
        writeln!(output, "  Collection: {}", status.collection).unwrap();
        if status.vector_store_connected {
            writeln!(output, "  Points:     {}", status.vector_store_points).unwrap();
        }
        writeln!(output, "Model:        {}", status.model).unwrap();

        if let Some(ref jobs) = status.jobs {
            writeln!(output, "Jobs (7d):    {}", jobs.total_jobs).unwrap();
            if jobs.total_jobs > 0 {
                writeln!(output, "  Avg time:   {}ms", jobs.avg_duration_ms).unwrap();
                if jobs.failure_rate > 0.0 {
                    writeln!(output, "  Failures:   {:.1}%", jobs.failure_rate).unwrap();
                }
            }
        }

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn encode(&self, value: &serde_json::Value) -> String {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        encoded.unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}

impl Formatter for JsonFormatter {
    fn format_answer(&self, record: &AnswerRecord) -> String {
        let value = serde_json::to_value(record).unwrap_or_default();
        format!("{}\n", self.encode(&value))
    }

    fn format_batch(&self, outcome: &BatchOutcome) -> String {
        let value = serde_json::json!({
            "results": outcome.entries(),
            "metrics": outcome.metrics,
        });
        format!("{}\n", self.encode(&value))
    }

    fn format_ingestion(&self, metrics: &IngestionMetrics) -> String {
        let value = serde_json::to_value(metrics).unwrap_or_default();
        format!("{}\n", self.encode(&value))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let value = serde_json::json!({
            "embedding": {
                "url": status.embedding_url,
                "connected": status.embedding_connected,
            },
            "vector_store": {
                "url": status.vector_store_url,
                "connected": status.vector_store_connected,
                "collection": status.collection,
                "points": status.vector_store_points,
            },
            "model": status.model,
            "jobs": status.jobs,
        });
        format!("{}\n", self.encode(&value))
    }

    fn format_message(&self, message: &str) -> String {
        let value = serde_json::json!({"message": message});
        format!("{}\n", self.encode(&value))
    }

    fn format_error(&self, error: &str) -> String {
        let value = serde_json::json!({"error": error});
        format!("{}\n", self.encode(&value))
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_answer(&self, record: &AnswerRecord) -> String {
        let mut output = String::new();
        writeln!(output, "## {}", record.question).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "{}", record.answer.trim()).unwrap();

        if !record.citations.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "### Sources").unwrap();
            writeln!(output).unwrap();
            for citation in &record.citations {
                writeln!(output, "- [{}]({})", citation.title, citation.url).unwrap();
            }
        }

        output
    }

    fn format_batch(&self, outcome: &BatchOutcome) -> String {
        let mut output = String::new();
        writeln!(output, "# Batch results").unwrap();
        writeln!(output).unwrap();

        for (question, result) in outcome.questions.iter().zip(&outcome.results) {
            match result {
                Ok(record) => output.push_str(&self.format_answer(record)),
                Err(error) => {
                    writeln!(output, "## {}", question).unwrap();
                    writeln!(output).unwrap();
                    writeln!(output, "*failed: {}*", error).unwrap();
                }
            }
            writeln!(output).unwrap();
        }

        let m = &outcome.metrics;
        writeln!(
            output,
            "**{} questions, {} answered, {} failed, {}ms wall clock**",
            m.questions, m.answered, m.failed, m.wall_clock_ms
        )
        .unwrap();

        output
    }

    fn format_ingestion(&self, metrics: &IngestionMetrics) -> String {
        let mut output = String::new();
        writeln!(output, "# Ingestion complete").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Pages scraped | {} |", metrics.pages_scraped).unwrap();
        writeln!(output, "| Pages failed | {} |", metrics.pages_failed).unwrap();
        writeln!(output, "| Chunks created | {} |", metrics.total_chunks_created).unwrap();
        writeln!(
            output,
            "| Tokens processed | {} |",
            metrics.total_tokens_processed
        )
        .unwrap();
        writeln!(output, "| Total duration | {}ms |", metrics.total_duration_ms).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "# Status").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "- Embedding: {} ({})",
            if status.embedding_connected { "connected" } else { "down" },
            status.embedding_url
        )
        .unwrap();
        writeln!(
            output,
            "- Vector store: {} ({}, collection `{}`, {} points)",
            if status.vector_store_connected { "connected" } else { "down" },
            status.vector_store_url,
            status.collection,
            status.vector_store_points
        )
        .unwrap();
        writeln!(output, "- Model: {}", status.model).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("**Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Citation, QueryMetrics};

    fn record() -> AnswerRecord {
        AnswerRecord {
            question: "What is product A?".into(),
            answer: "Product A is a widget.".into(),
            citations: vec![Citation {
                url: "https://e.com/products/a".into(),
                title: "Product A".into(),
                snippet: "A widget for widgeting.".into(),
            }],
            metrics: QueryMetrics::default(),
        }
    }

    #[test]
    fn test_text_answer_lists_sources() {
        let out = TextFormatter.format_answer(&record());
        assert!(out.contains("Product A is a widget."));
        assert!(out.contains("1. Product A - https://e.com/products/a"));
    }

    #[test]
    fn test_json_answer_round_trips() {
        let out = JsonFormatter::new(false).format_answer(&record());
        let parsed: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(parsed["question"], "What is product A?");
        assert_eq!(parsed["citations"][0]["url"], "https://e.com/products/a");
    }

    #[test]
    fn test_markdown_answer_links_sources() {
        let out = MarkdownFormatter.format_answer(&record());
        assert!(out.contains("## What is product A?"));
        assert!(out.contains("[Product A](https://e.com/products/a)"));
    }
}
