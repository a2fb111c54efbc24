//! Ingest command implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use super::{build_store, deliver_webhook, record_job};
use crate::cli::output::get_formatter;
use crate::models::{Config, JobPayload, OutputFormat};
use crate::services::{
    Crawler, HtmlTextExtractor, HttpEmbeddingClient, IngestionPipeline, TextChunker,
};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Seed URLs to crawl
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Page-type path sections to follow, comma-separated (e.g. 'products,solutions')
    #[arg(long, short = 'p')]
    pub page_types: Option<String>,

    /// Maximum crawl depth from a seed
    #[arg(long, short = 'd')]
    pub max_depth: Option<u32>,

    /// Callback URL for the completion webhook
    #[arg(long)]
    pub callback_url: Option<String>,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let job_id = Uuid::new_v4().to_string();

    let page_types: Vec<String> = match args.page_types {
        Some(ref s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        None => config.crawl.page_types.clone(),
    };
    let max_depth = args.max_depth.unwrap_or(config.crawl.max_depth);

    if verbose {
        eprintln!("Job: {}", job_id);
        eprintln!("  Seeds: {}", args.urls.join(", "));
        eprintln!("  Page types: {}", page_types.join(", "));
        eprintln!("  Max depth: {}", max_depth);
    }

    let crawler = Crawler::new(&config.crawl).context("failed to create crawler")?;
    let embedder = Arc::new(
        HttpEmbeddingClient::new(&config.embedding)
            .context("failed to create embedding client")?,
    );
    let store = build_store(&config)?;
    let pipeline = IngestionPipeline::new(
        crawler,
        Arc::new(HtmlTextExtractor::new()),
        TextChunker::new(&config.chunking),
        embedder,
        store,
    );

    let spinner = if format == OutputFormat::Text {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}").expect("valid progress template"),
        );
        pb.set_message("Crawling and indexing...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let result = pipeline.run(&args.urls, &page_types, max_depth).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    record_job("ingestion", start.elapsed().as_millis() as u64, result.is_ok());

    match result {
        Ok(metrics) => {
            if let Some(ref callback_url) = args.callback_url {
                let payload =
                    JobPayload::ingestion_success(&job_id, args.urls.clone(), metrics.clone());
                deliver_webhook(&config.webhook, callback_url, &payload).await;
            }

            print!("{}", formatter.format_ingestion(&metrics));
            Ok(())
        }
        Err(e) => {
            // The run already failed on its own terms; the failure webhook
            // is informational and cannot change that.
            if let Some(ref callback_url) = args.callback_url {
                let payload = JobPayload::ingestion_failure(&job_id, args.urls.clone(), &e);
                deliver_webhook(&config.webhook, callback_url, &payload).await;
            }

            eprint!("{}", formatter.format_error(&e.to_string()));
            Err(e.into())
        }
    }
}
