mod chunker;
mod crawler;
mod embedding;
mod extractor;
mod generation;
mod ingestion;
mod joblog;
mod notifier;
mod query;
mod vector_store;

pub use chunker::{TextChunker, estimate_tokens};
pub use crawler::{CrawlOutcome, Crawler};
pub use embedding::{EmbeddingProvider, HttpEmbeddingClient};
pub use extractor::{ContentExtractor, HtmlTextExtractor};
pub use generation::{Completion, GenerativeModel, OpenAiGenerativeClient};
pub use ingestion::IngestionPipeline;
pub use joblog::{JobLog, JobLogSummary};
pub use notifier::{DeliveryNotifier, DeliveryOutcome, WebhookDeliveryAttempt};
pub use query::{BatchOutcome, QueryEngine};
pub use vector_store::{CollectionInfo, QdrantBackend, VectorStore, create_backend};
