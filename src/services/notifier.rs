//! Best-effort delivery of job-completion webhooks.
//!
//! Delivery is decoupled from job success: a job that already completed
//! reports its outcome here, and an undeliverable webhook is logged and
//! abandoned, never raised back to the caller.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::DeliveryError;
use crate::models::{JobPayload, WebhookConfig};
use crate::utils::retry::{RetryConfig, RetryResult, with_retry};

/// One delivery attempt, recorded for observability.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookDeliveryAttempt {
    pub attempt_number: u32,
    pub outcome: String,
    pub timestamp: String,
}

/// Terminal state of one webhook delivery.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Delivered {
        attempts: Vec<WebhookDeliveryAttempt>,
    },
    Abandoned {
        attempts: Vec<WebhookDeliveryAttempt>,
        last_error: DeliveryError,
    },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn attempts(&self) -> &[WebhookDeliveryAttempt] {
        match self {
            DeliveryOutcome::Delivered { attempts }
            | DeliveryOutcome::Abandoned { attempts, .. } => attempts,
        }
    }
}

/// Posts job-completion payloads to a caller-supplied callback URL.
pub struct DeliveryNotifier {
    client: Client,
    retry: RetryConfig,
}

impl DeliveryNotifier {
    /// Create a notifier. Each attempt is bounded by the configured
    /// timeout; failed attempts are retried after a fixed delay, up to
    /// `max_retries` additional attempts.
    pub fn new(config: &WebhookConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeliveryError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            retry: RetryConfig::new(config.max_retries)
                .with_delay(Duration::from_secs(config.retry_delay_secs)),
        })
    }

    /// Deliver a payload, making at most `1 + max_retries` attempts.
    ///
    /// Success is any 2xx response within the attempt timeout. 4xx
    /// responses abandon immediately; timeouts, connection errors and 5xx
    /// retry until the attempt budget runs out.
    pub async fn notify(&self, callback_url: &str, payload: &JobPayload) -> DeliveryOutcome {
        let attempts: Arc<Mutex<Vec<WebhookDeliveryAttempt>>> = Arc::new(Mutex::new(Vec::new()));

        let result = with_retry(&self.retry, |attempt_number| {
            let client = self.client.clone();
            let url = callback_url.to_string();
            let attempts = attempts.clone();
            async move {
                info!(url = %url, attempt = attempt_number, "webhook attempt");
                let result = post_once(&client, &url, payload).await;

                let outcome = match &result {
                    Ok(status) => format!("delivered ({})", status),
                    Err(e) => e.to_string(),
                };
                attempts
                    .lock()
                    .expect("attempt log poisoned")
                    .push(WebhookDeliveryAttempt {
                        attempt_number,
                        outcome,
                        timestamp: chrono::Utc::now().to_rfc3339(),
                    });

                result
            }
        })
        .await;

        let attempts = Arc::try_unwrap(attempts)
            .map(|m| m.into_inner().expect("attempt log poisoned"))
            .unwrap_or_default();

        match result {
            RetryResult::Success { value: status, .. } => {
                info!(url = %callback_url, status, "webhook delivered");
                DeliveryOutcome::Delivered { attempts }
            }
            RetryResult::Failed {
                last_error,
                attempts: n,
            } => {
                error!(
                    url = %callback_url,
                    attempts = n,
                    error = %last_error,
                    "webhook abandoned"
                );
                DeliveryOutcome::Abandoned {
                    attempts,
                    last_error,
                }
            }
        }
    }
}

async fn post_once(
    client: &Client,
    url: &str,
    payload: &JobPayload,
) -> Result<u16, DeliveryError> {
    let response = client.post(url).json(payload).send().await.map_err(|e| {
        if e.is_timeout() {
            DeliveryError::Timeout
        } else {
            DeliveryError::ConnectionError(e.to_string())
        }
    })?;

    let status = response.status();
    if status.is_success() {
        Ok(status.as_u16())
    } else {
        warn!(url = %url, status = status.as_u16(), "callback rejected webhook");
        Err(DeliveryError::HttpStatus(status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    use crate::models::IngestionMetrics;

    fn notifier(max_retries: u32) -> DeliveryNotifier {
        DeliveryNotifier::new(&WebhookConfig {
            timeout_secs: 5,
            max_retries,
            retry_delay_secs: 0,
        })
        .unwrap()
    }

    fn payload() -> JobPayload {
        JobPayload::ingestion_success("job-1", vec![], IngestionMetrics::default())
    }

    #[tokio::test]
    async fn test_delivered_on_first_2xx() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/hook").json_body_partial(
                    r#"{"type": "ingestion", "status": "success", "job_id": "job-1"}"#,
                );
                then.status(201);
            })
            .await;

        let outcome = notifier(3).notify(&server.url("/hook"), &payload()).await;

        assert!(outcome.is_delivered());
        assert_eq!(outcome.attempts().len(), 1);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_abandoned_after_exhausting_attempt_budget() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/hook");
                then.status(503);
            })
            .await;

        let outcome = notifier(2).notify(&server.url("/hook"), &payload()).await;

        // 1 + max_retries attempts, each recorded, then abandoned.
        match &outcome {
            DeliveryOutcome::Abandoned {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts.len(), 3);
                assert!(matches!(last_error, DeliveryError::HttpStatus(503)));
                let numbers: Vec<u32> = attempts.iter().map(|a| a.attempt_number).collect();
                assert_eq!(numbers, vec![1, 2, 3]);
            }
            DeliveryOutcome::Delivered { .. } => panic!("expected abandonment"),
        }
        mock.assert_hits_async(3).await;
    }

    #[tokio::test]
    async fn test_4xx_abandons_without_retrying() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/hook");
                then.status(404);
            })
            .await;

        let outcome = notifier(3).notify(&server.url("/hook"), &payload()).await;

        assert!(!outcome.is_delivered());
        assert_eq!(outcome.attempts().len(), 1);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_connection_failure_is_abandoned_not_raised() {
        // Nothing listens on this port; notify must still return an outcome.
        let outcome = notifier(1)
            .notify("http://127.0.0.1:1/hook", &payload())
            .await;

        match outcome {
            DeliveryOutcome::Abandoned { attempts, .. } => assert_eq!(attempts.len(), 2),
            DeliveryOutcome::Delivered { .. } => panic!("expected abandonment"),
        }
    }
}
