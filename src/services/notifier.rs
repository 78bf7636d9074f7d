use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when delivering a match notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Notification endpoint rejected the request with status {0}")]
    Rejected(u16),

    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

/// Delivers "you have a new match" events to workers
#[async_trait]
pub trait MatchNotifier: Send + Sync {
    async fn notify(&self, worker_id: &str, job_id: &str, score: f64) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchCreatedEvent<'a> {
    event: &'static str,
    worker_id: &'a str,
    job_id: &'a str,
    score: f64,
}

/// Posts match events as JSON to a webhook
pub struct WebhookNotifier {
    url: String,
    api_key: Option<String>,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { url, api_key, client })
    }
}

#[async_trait]
impl MatchNotifier for WebhookNotifier {
    async fn notify(&self, worker_id: &str, job_id: &str, score: f64) -> Result<(), NotifyError> {
        let event = MatchCreatedEvent {
            event: "match.created",
            worker_id,
            job_id,
            score,
        };

        let mut request = self.client.post(&self.url).json(&event);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        tracing::debug!("Notified worker {} about job {}", worker_id, job_id);
        Ok(())
    }
}

/// Notifier that only logs; used when no webhook is configured
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl MatchNotifier for LogNotifier {
    async fn notify(&self, worker_id: &str, job_id: &str, score: f64) -> Result<(), NotifyError> {
        tracing::info!("Match for worker {} on job {} ({:.3})", worker_id, job_id, score);
        Ok(())
    }
}
