//! Job-completion payloads posted to the delivery callback.

use serde::{Deserialize, Serialize};

use super::answer::{AnswerRecord, BatchMetrics, Citation, QueryMetrics};
use super::metrics::IngestionMetrics;
use crate::error::QueryError;

/// Terminal status of an asynchronous job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Failed,
}

/// One entry in a batch-query completion payload.
///
/// A question that failed generation keeps its slot, carrying the error
/// instead of an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResultEntry {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub sources: Vec<Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<QueryMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResultEntry {
    pub fn from_result(question: &str, result: &Result<AnswerRecord, QueryError>) -> Self {
        match result {
            Ok(record) => Self {
                question: record.question.clone(),
                answer: Some(record.answer.clone()),
                sources: record.citations.clone(),
                metrics: Some(record.metrics.clone()),
                error: None,
            },
            Err(error) => Self {
                question: question.to_string(),
                answer: None,
                sources: Vec::new(),
                metrics: None,
                error: Some(error.to_string()),
            },
        }
    }
}

/// A job-completion payload, tagged by job type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    Ingestion {
        status: JobStatus,
        job_id: String,
        urls: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        metrics: Option<IngestionMetrics>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        timestamp: String,
    },
    BatchQuery {
        status: JobStatus,
        job_id: String,
        results: Vec<BatchResultEntry>,
        metrics: BatchMetrics,
        timestamp: String,
    },
}

impl JobPayload {
    pub fn ingestion_success(
        job_id: impl Into<String>,
        urls: Vec<String>,
        metrics: IngestionMetrics,
    ) -> Self {
        JobPayload::Ingestion {
            status: JobStatus::Success,
            job_id: job_id.into(),
            urls,
            metrics: Some(metrics),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn ingestion_failure(
        job_id: impl Into<String>,
        urls: Vec<String>,
        error: impl ToString,
    ) -> Self {
        JobPayload::Ingestion {
            status: JobStatus::Failed,
            job_id: job_id.into(),
            urls,
            metrics: None,
            error: Some(error.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn batch_query(
        job_id: impl Into<String>,
        results: Vec<BatchResultEntry>,
        metrics: BatchMetrics,
    ) -> Self {
        let status = if results.iter().any(|r| r.error.is_some()) {
            JobStatus::Failed
        } else {
            JobStatus::Success
        };
        JobPayload::BatchQuery {
            status,
            job_id: job_id.into(),
            results,
            metrics,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingestion_payload_shape() {
        let payload = JobPayload::ingestion_success(
            "job-1",
            vec!["https://e.com".into()],
            IngestionMetrics::default(),
        );
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "ingestion");
        assert_eq!(json["status"], "success");
        assert_eq!(json["job_id"], "job-1");
        assert!(json["metrics"].is_object());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_ingestion_failure_carries_error() {
        let payload =
            JobPayload::ingestion_failure("job-2", vec![], "embedding error: server down");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "embedding error: server down");
        assert!(json.get("metrics").is_none());
    }

    #[test]
    fn test_batch_payload_status_reflects_failures() {
        let ok = BatchResultEntry {
            question: "q1".into(),
            answer: Some("a1".into()),
            sources: vec![],
            metrics: Some(QueryMetrics::default()),
            error: None,
        };
        let failed = BatchResultEntry {
            question: "q2".into(),
            answer: None,
            sources: vec![],
            metrics: None,
            error: Some("generation timeout".into()),
        };

        let payload = JobPayload::batch_query("job-3", vec![ok.clone()], BatchMetrics::default());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "batch_query");
        assert_eq!(json["status"], "success");

        let payload = JobPayload::batch_query("job-3", vec![ok, failed], BatchMetrics::default());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "failed");
    }
}
