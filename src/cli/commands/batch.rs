//! Batch query command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use uuid::Uuid;

use super::{build_engine, deliver_webhook, record_job};
use crate::cli::output::get_formatter;
use crate::models::{Config, JobPayload, OutputFormat};

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// File with one question per line
    #[arg(required = true)]
    pub file: PathBuf,

    /// Dispatch all questions concurrently instead of one at a time
    #[arg(long, short = 'c')]
    pub concurrent: bool,

    /// Callback URL for the completion webhook
    #[arg(long)]
    pub callback_url: Option<String>,
}

pub async fn handle_batch(args: BatchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let job_id = Uuid::new_v4().to_string();

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let questions: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect();

    if questions.is_empty() {
        anyhow::bail!("no questions found in {}", args.file.display());
    }

    if verbose {
        eprintln!("Job: {}", job_id);
        eprintln!(
            "  {} questions, {} mode",
            questions.len(),
            if args.concurrent { "concurrent" } else { "sequential" }
        );
    }

    let engine = build_engine(&config)?;
    let outcome = engine.batch_query(&questions, args.concurrent).await;

    record_job(
        "batch_query",
        outcome.metrics.wall_clock_ms,
        outcome.metrics.failed == 0,
    );

    if let Some(ref callback_url) = args.callback_url {
        let payload = JobPayload::batch_query(&job_id, outcome.entries(), outcome.metrics.clone());
        deliver_webhook(&config.webhook, callback_url, &payload).await;
    }

    // Failed questions keep their slots in the printed results; a partial
    // failure is not a command failure.
    print!("{}", formatter.format_batch(&outcome));

    Ok(())
}
