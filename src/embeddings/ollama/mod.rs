
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::OllamaConfig;
use crate::embeddings::Embedder;
use crate::{DocqaError, Result};

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Embedding client for an Ollama-compatible server.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    base_url: Url,
    model: String,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    model: String,
    #[serde(rename = "input")]
    inputs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .map_err(|e| DocqaError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.embedding_model.clone(),
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Ping the server to check that it is reachable
    #[inline]
    pub fn ping(&self) -> Result<()> {
        let url = self
            .base_url
            .join("/api/tags")
            .map_err(|e| DocqaError::Config(format!("Failed to build ping URL: {}", e)))?;

        debug!("Pinging embedding server at {}", url);

        self.request_with_retry(|| {
            self.agent
                .get(url.as_str())
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        Ok(())
    }

    fn request_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let url = self
            .base_url
            .join("/api/embed")
            .map_err(|e| DocqaError::Config(format!("Failed to build embedding URL: {}", e)))?;

        let request_json = serde_json::to_string(&request).map_err(|e| {
            DocqaError::EmbeddingService(format!("Failed to serialize request: {}", e))
        })?;

        let response_text = self.request_with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let response: EmbedResponse = serde_json::from_str(&response_text).map_err(|e| {
            DocqaError::EmbeddingService(format!("Failed to parse embedding response: {}", e))
        })?;

        if response.embedding.is_empty() {
            return Err(DocqaError::EmbeddingService(
                "Server returned an empty embedding".to_string(),
            ));
        }

        debug!("Received embedding with {} dimensions", response.embedding.len());
        Ok(response.embedding)
    }

    fn request_embedding_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if texts.len() == 1 {
            return Ok(vec![self.request_embedding(&texts[0])?]);
        }

        let request = BatchEmbedRequest {
            model: self.model.clone(),
            inputs: texts.to_vec(),
        };

        let url = self
            .base_url
            .join("/api/embed")
            .map_err(|e| DocqaError::Config(format!("Failed to build embedding URL: {}", e)))?;

        let request_json = serde_json::to_string(&request).map_err(|e| {
            DocqaError::EmbeddingService(format!("Failed to serialize batch request: {}", e))
        })?;

        debug!("Requesting embeddings for {} texts in one batch", texts.len());

        let response_text = self.request_with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let response: BatchEmbedResponse = serde_json::from_str(&response_text).map_err(|e| {
            DocqaError::EmbeddingService(format!("Failed to parse batch response: {}", e))
        })?;

        if response.embeddings.len() != texts.len() {
            return Err(DocqaError::EmbeddingService(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        if response.embeddings.iter().any(Vec::is_empty) {
            return Err(DocqaError::EmbeddingService(
                "Server returned an empty embedding".to_string(),
            ));
        }

        Ok(response.embeddings)
    }

    /// Retry transport and server errors with exponential backoff. Exhausted
    /// retries surface as an embedding-service error so callers can tell
    /// "service down" apart from "no results".
    fn request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> std::result::Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("Embedding request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => return Ok(response_text),
                Err(err) => {
                    let should_retry = match &err {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Embedding server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                return Err(DocqaError::EmbeddingService(format!(
                                    "Client error: HTTP {}",
                                    status
                                )));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Embedding transport error: {}, attempt {}/{}",
                                err, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => false,
                    };

                    if !should_retry {
                        return Err(DocqaError::EmbeddingService(format!(
                            "Non-retryable error: {}",
                            err
                        )));
                    }

                    last_error = Some(err);

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        std::thread::sleep(Duration::from_millis(delay_ms));
                    }
                }
            }
        }

        error!(
            "All embedding retry attempts failed for {}",
            self.base_url
        );

        Err(DocqaError::EmbeddingService(match last_error {
            Some(err) => format!("Request failed after {} attempts: {}", self.retry_attempts, err),
            None => "Request failed after retries".to_string(),
        }))
    }
}

impl Embedder for OllamaEmbedder {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request_embedding(text)
    }

    /// Embed a whole chunk sequence with a single batched request instead of
    /// one round trip per chunk.
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.request_embedding_batch(texts)
    }
}
