//! Query command implementation.

use std::time::Instant;

use anyhow::Result;
use clap::Args;

use super::{build_engine, record_job};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// The question to answer
    #[arg(required = true)]
    pub question: String,

    /// Number of chunks to retrieve
    #[arg(long, short = 'k')]
    pub top_k: Option<u64>,
}

pub async fn handle_query(args: QueryArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let question = args.question.trim();
    if question.is_empty() {
        anyhow::bail!("question cannot be empty");
    }

    let mut config = Config::load()?;
    if let Some(top_k) = args.top_k {
        if top_k == 0 {
            anyhow::bail!("top-k must be at least 1");
        }
        config.query.top_k = top_k;
    }

    let formatter = get_formatter(format);
    let engine = build_engine(&config)?;

    let start = Instant::now();
    let result = engine.query(question).await;
    record_job("query", start.elapsed().as_millis() as u64, result.is_ok());

    let record = result?;

    if verbose {
        let m = &record.metrics;
        eprintln!("Timing:");
        eprintln!("  Retrieval:  {}ms", m.retrieval_ms);
        eprintln!("  Generation: {}ms", m.llm_ms);
        eprintln!("  Post:       {}ms", m.post_processing_ms);
        eprintln!("  Total:      {}ms", m.total_latency_ms);
        eprintln!(
            "Tokens: {} in / {} out, estimated cost ${:.6}",
            m.input_tokens, m.output_tokens, m.estimated_cost_usd
        );
        eprintln!(
            "Retrieved {} chunks, cited {} sources",
            m.docs_retrieved, m.docs_used
        );
        eprintln!();
    }

    print!("{}", formatter.format_answer(&record));

    Ok(())
}
