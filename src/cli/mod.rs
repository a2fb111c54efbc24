//! CLI module for siteqa.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Question answering over crawled websites.
#[derive(Debug, Parser)]
#[command(name = "siteqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Crawl a website and index its content for question answering
    Ingest(commands::IngestArgs),

    /// Answer a single question against the indexed corpus
    Query(commands::QueryArgs),

    /// Answer a batch of questions from a file
    Batch(commands::BatchArgs),

    /// Check infrastructure status (embedding server, vector store)
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
