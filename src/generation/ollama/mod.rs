#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::OllamaConfig;
use crate::generation::GenerativeModel;
use crate::{DocqaError, Result};

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Generation client for an Ollama-compatible server.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    base_url: Url,
    model: String,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
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
            model: config.generation_model.clone(),
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

    fn request_generation(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                num_predict: max_output_tokens,
            },
        };

        let url = self
            .base_url
            .join("/api/generate")
            .map_err(|e| DocqaError::Config(format!("Failed to build generation URL: {}", e)))?;

        let request_json = serde_json::to_string(&request)
            .map_err(|e| DocqaError::Generation(format!("Failed to serialize request: {}", e)))?;

        debug!(
            "Requesting generation ({} prompt chars, {} max output tokens)",
            prompt.chars().count(),
            max_output_tokens
        );

        let response_text = self.request_with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let response: GenerateResponse = serde_json::from_str(&response_text).map_err(|e| {
            DocqaError::Generation(format!("Failed to parse generation response: {}", e))
        })?;

        if response.response.trim().is_empty() {
            return Err(DocqaError::Generation(
                "Server returned empty content".to_string(),
            ));
        }

        Ok(response.response)
    }

    /// Retry transport and server errors with exponential backoff; timeouts
    /// past the budget are treated as a generation failure.
    fn request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> std::result::Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("Generation request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => return Ok(response_text),
                Err(err) => {
                    let should_retry = match &err {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Generation server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                return Err(DocqaError::Generation(format!(
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
                                "Generation transport error: {}, attempt {}/{}",
                                err, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => false,
                    };

                    if !should_retry {
                        return Err(DocqaError::Generation(format!(
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

        error!("All generation retry attempts failed for {}", self.base_url);

        Err(DocqaError::Generation(match last_error {
            Some(err) => format!("Request failed after {} attempts: {}", self.retry_attempts, err),
            None => "Request failed after retries".to_string(),
        }))
    }
}

impl GenerativeModel for OllamaGenerator {
    #[inline]
    fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        self.request_generation(prompt, max_output_tokens)
    }
}
