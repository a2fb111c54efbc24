//! The query engine: embed, retrieve, prompt, generate, cite.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::embedding::EmbeddingProvider;
use super::generation::GenerativeModel;
use super::vector_store::VectorStore;
use crate::error::{GenerationError, QueryError};
use crate::models::{
    AnswerRecord, BatchMetrics, BatchResultEntry, Citation, QueryConfig, QueryMetrics,
    RetrievedMatch,
};
use crate::utils::text::truncate_snippet;

const SYSTEM_PROMPT: &str = "You provide concise, accurate answers with citations.";

/// Returned when the vector store holds nothing to ground an answer in.
const EMPTY_CORPUS_ANSWER: &str = "I don't know. No information is available in the \
    knowledge base. Please ensure data has been ingested.";

/// Results of one batch, in input order regardless of completion order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub questions: Vec<String>,
    pub results: Vec<Result<AnswerRecord, QueryError>>,
    pub metrics: BatchMetrics,
}

impl BatchOutcome {
    /// Flatten into webhook payload entries.
    pub fn entries(&self) -> Vec<BatchResultEntry> {
        self.questions
            .iter()
            .zip(&self.results)
            .map(|(question, result)| BatchResultEntry::from_result(question, result))
            .collect()
    }
}

/// Stateless per-question orchestration over shared collaborator handles.
#[derive(Clone)]
pub struct QueryEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    model: Arc<dyn GenerativeModel>,
    top_k: u64,
    concurrency: usize,
}

impl QueryEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        model: Arc<dyn GenerativeModel>,
        config: &QueryConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            model,
            top_k: config.top_k,
            concurrency: config.concurrency,
        }
    }

    /// Answer a single question against the indexed corpus.
    pub async fn query(&self, question: &str) -> Result<AnswerRecord, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::InvalidQuestion("question is empty".into()));
        }

        let retrieval_start = Instant::now();
        let vector = self.embedder.embed_query(question).await?;
        let matches = self.store.search(vector, self.top_k).await?;
        let retrieval_ms = retrieval_start.elapsed().as_millis() as u64;

        info!(
            question = %question,
            retrieved = matches.len(),
            retrieval_ms,
            "retrieval finished"
        );

        if matches.is_empty() {
            warn!("no documents retrieved, the vector store may be empty");
            return Ok(AnswerRecord {
                question: question.to_string(),
                answer: EMPTY_CORPUS_ANSWER.to_string(),
                citations: Vec::new(),
                metrics: QueryMetrics {
                    total_latency_ms: retrieval_ms,
                    retrieval_ms,
                    ..Default::default()
                },
            });
        }

        let prompt = build_prompt(question, &matches);

        let llm_start = Instant::now();
        let completion = self.model.generate(SYSTEM_PROMPT, &prompt).await?;
        let llm_ms = llm_start.elapsed().as_millis() as u64;

        let post_start = Instant::now();
        let citations = select_citations(&matches);
        let post_processing_ms = post_start.elapsed().as_millis() as u64;

        let metrics = QueryMetrics {
            total_latency_ms: retrieval_ms + llm_ms + post_processing_ms,
            retrieval_ms,
            llm_ms,
            post_processing_ms,
            docs_retrieved: matches.len(),
            docs_used: citations.len(),
            input_tokens: completion.input_tokens,
            output_tokens: completion.output_tokens,
            estimated_cost_usd: self
                .model
                .estimate_cost(completion.input_tokens, completion.output_tokens),
        };

        Ok(AnswerRecord {
            question: question.to_string(),
            answer: completion.text,
            citations,
            metrics,
        })
    }

    /// Answer a batch of questions.
    ///
    /// Results always come back in input order. In concurrent mode all
    /// questions are dispatched at once with in-flight count bounded by the
    /// configured semaphore; a generation failure fails only its own slot.
    pub async fn batch_query(&self, questions: &[String], concurrent: bool) -> BatchOutcome {
        let questions: Vec<String> = questions
            .iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();

        let batch_start = Instant::now();
        let mut results = Vec::with_capacity(questions.len());

        if concurrent {
            let semaphore = Arc::new(Semaphore::new(self.concurrency));
            let mut handles = Vec::with_capacity(questions.len());
            for question in &questions {
                let engine = self.clone();
                let sem = semaphore.clone();
                let question = question.clone();
                handles.push(tokio::spawn(async move {
                    let _permit = sem.acquire().await.expect("semaphore closed");
                    engine.query(&question).await
                }));
            }

            // Awaiting the handles in spawn order reassembles input order
            // no matter how completions interleave.
            for handle in handles {
                match handle.await {
                    Ok(result) => results.push(result),
                    Err(e) => results.push(Err(QueryError::GenerationError(
                        GenerationError::MalformedResponse(format!("query task failed: {e}")),
                    ))),
                }
            }
        } else {
            for question in &questions {
                results.push(self.query(question).await);
            }
        }

        let mut metrics = BatchMetrics {
            questions: questions.len(),
            ..Default::default()
        };
        for result in &results {
            match result {
                Ok(record) => metrics.accumulate(&record.metrics),
                Err(_) => metrics.failed += 1,
            }
        }
        metrics.wall_clock_ms = batch_start.elapsed().as_millis() as u64;

        BatchOutcome {
            questions,
            results,
            metrics,
        }
    }
}

/// Assemble the grounding prompt, tagging each chunk with a source index.
fn build_prompt(question: &str, matches: &[RetrievedMatch]) -> String {
    let context_blocks: Vec<String> = matches
        .iter()
        .enumerate()
        .map(|(idx, m)| format!("[Source {}] {} - {}\n{}", idx + 1, m.title, m.url, m.text))
        .collect();

    format!(
        "You are a knowledgeable assistant. Answer the user's question based on the \
         provided sources. Use the information from the sources to construct a helpful \
         and informative answer.\n\n\
         Instructions:\n\
         - Synthesize information from the sources to answer the question thoroughly\n\
         - If sources contain partial information, provide what's available and explain \
         the topic based on that context\n\
         - Do not include citation markers like [1] or [Source 1] in your answer\n\
         - Write in a clear, natural, and confident tone\n\n\
         Sources:\n{}\n\nQuestion: {}\n",
        context_blocks.join("\n\n"),
        question
    )
}

/// Citations are the distinct source URLs among the retrieved chunks,
/// deduplicated by URL in retrieval-rank order. Deterministic in the
/// retrieved set.
fn select_citations(matches: &[RetrievedMatch]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    matches
        .iter()
        .filter(|m| seen.insert(m.url.clone()))
        .map(|m| Citation {
            url: m.url.clone(),
            title: m.title.clone(),
            snippet: truncate_snippet(&m.text),
        })
        .collect()
}
