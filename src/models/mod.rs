pub mod answer;
pub mod chunk;
pub mod config;
pub mod metrics;
pub mod page;
pub mod payload;

pub use answer::{
    AnswerRecord, BatchMetrics, Citation, OutputFormat, QueryMetrics, RetrievedMatch,
};
pub use chunk::Chunk;
pub use config::{
    ChunkingConfig, Config, CrawlConfig, EmbeddingConfig, GenerationConfig, QueryConfig,
    VectorStoreConfig, WebhookConfig,
};
pub use metrics::{IngestionMetrics, Stage};
pub use page::{CleanedDocument, FetchFailure, HtmlFragment, PageRecord};
pub use payload::{BatchResultEntry, JobPayload, JobStatus};
