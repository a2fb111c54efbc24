mod batch;
mod config;
mod ingest;
mod query;
mod status;

pub use batch::BatchArgs;
pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use query::QueryArgs;

pub use batch::handle_batch;
pub use config::handle_config;
pub use ingest::handle_ingest;
pub use query::handle_query;
pub use status::handle_status;

use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;

use crate::models::{Config, JobPayload, WebhookConfig};
use crate::services::{
    DeliveryNotifier, HttpEmbeddingClient, JobLog, OpenAiGenerativeClient, QueryEngine,
    VectorStore, create_backend,
};

/// Construct the shared vector store handle from configuration.
pub(crate) fn build_store(config: &Config) -> Result<Arc<dyn VectorStore>> {
    create_backend(&config.vector_store, config.embedding.dimension)
        .context("failed to connect to vector store")
}

/// Construct the query engine with its collaborator handles.
pub(crate) fn build_engine(config: &Config) -> Result<QueryEngine> {
    let embedder = Arc::new(
        HttpEmbeddingClient::new(&config.embedding)
            .context("failed to create embedding client")?,
    );
    let store = build_store(config)?;
    let model = Arc::new(
        OpenAiGenerativeClient::new(&config.generation)
            .context("failed to create generation client")?,
    );
    Ok(QueryEngine::new(embedder, store, model, &config.query))
}

/// Deliver a job-completion webhook, best effort.
///
/// Delivery problems are reported on stderr and never fail the command:
/// the job itself already succeeded or failed on its own terms.
pub(crate) async fn deliver_webhook(
    webhook: &WebhookConfig,
    callback_url: &str,
    payload: &JobPayload,
) {
    match DeliveryNotifier::new(webhook) {
        Ok(notifier) => {
            let outcome = notifier.notify(callback_url, payload).await;
            if !outcome.is_delivered() {
                eprintln!(
                    "{}",
                    style(format!(
                        "Warning: webhook delivery to {} abandoned after {} attempts",
                        callback_url,
                        outcome.attempts().len()
                    ))
                    .yellow()
                );
            }
        }
        Err(e) => {
            eprintln!(
                "{}",
                style(format!("Warning: could not create webhook client: {}", e)).yellow()
            );
        }
    }
}

/// Append a row to the local job log, best effort.
pub(crate) fn record_job(kind: &str, duration_ms: u64, success: bool) {
    let Some(path) = JobLog::default_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(log) = JobLog::open(&path) {
        log.record(kind, duration_ms, success);
    }
}
