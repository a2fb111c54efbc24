//! Status command implementation.

use anyhow::Result;
use console::style;

use super::build_store;
use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::{HttpEmbeddingClient, JobLog};

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let embedding_connected = match HttpEmbeddingClient::new(&config.embedding) {
        Ok(client) => client.health_check().await.unwrap_or(false),
        Err(_) => false,
    };

    let (vector_store_connected, vector_store_points) = match build_store(&config) {
        Ok(store) => {
            let connected = store.health_check().await.unwrap_or(false);
            let points = if connected {
                store
                    .collection_info()
                    .await
                    .ok()
                    .flatten()
                    .map_or(0, |info| info.points_count)
            } else {
                0
            };
            (connected, points)
        }
        Err(_) => (false, 0),
    };

    let jobs = JobLog::default_path()
        .and_then(|path| JobLog::open(&path).ok())
        .map(|log| log.summary(7));

    let status = StatusInfo {
        embedding_url: config.embedding.url.clone(),
        embedding_connected,
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected,
        vector_store_points,
        collection: config.vector_store.collection.clone(),
        model: config.generation.model.clone(),
        jobs,
    };

    print!("{}", formatter.format_status(&status));

    if !embedding_connected || !vector_store_connected {
        eprintln!();
        if !embedding_connected {
            eprintln!(
                "{}",
                style(format!(
                    "Warning: embedding server not reachable at {}",
                    config.embedding.url
                ))
                .yellow()
            );
        }
        if !vector_store_connected {
            eprintln!(
                "{}",
                style(format!(
                    "Warning: Qdrant not reachable at {}. Start with: docker compose up -d qdrant",
                    config.vector_store.url
                ))
                .yellow()
            );
        }
    }

    Ok(())
}
