//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local LLM API, with an optional
//! separate model for critic (repair) calls.
//!
//! # Features
//!
//! - Async HTTP communication with Ollama API
//! - Configurable endpoint, primary model and critic model
//! - Retry logic with exponential backoff
//! - Timeout handling
//!
//! # Examples
//!
//! ```no_run
//! use pairaudit_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3")
//!     .with_critic_model("qwen2.5");
//! ```

use crate::LlmError;
use pairaudit_domain::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    critic_model: Option<String>,
    client: reqwest::Client,
    max_retries: u32,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new Ollama provider with a custom request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
                reqwest::Client::new()
            });

        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            critic_model: None,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Create a new Ollama provider on the default endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Use a different model for critic calls
    pub fn with_critic_model(mut self, model: impl Into<String>) -> Self {
        self.critic_model = Some(model.into());
        self
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Model used for critic calls
    pub fn critic_model(&self) -> &str {
        self.critic_model.as_deref().unwrap_or(&self.model)
    }

    /// Generate text with the given model
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running
    /// - Model is not available
    /// - Network communication fails
    /// - Response format is invalid
    pub async fn generate_with_model(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let request_body = OllamaGenerateRequest {
            model,
            prompt,
            stream: false,
        };

        // Retry logic with exponential backoff
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(&request_body).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        return match response.json::<OllamaGenerateResponse>().await {
                            Ok(ollama_response) => {
                                debug!(
                                    "Ollama model '{}' returned {} chars",
                                    model,
                                    ollama_response.response.len()
                                );
                                Ok(ollama_response.response)
                            }
                            Err(e) => Err(LlmError::InvalidResponse(format!(
                                "Failed to parse response: {}",
                                e
                            ))),
                        };
                    } else if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(model.to_string()));
                    } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(LlmError::RateLimitExceeded);
                    } else {
                        let status = response.status();
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }

    /// Drive one request to completion from synchronous code
    ///
    /// Inside a runtime context the request runs on a scoped thread with its
    /// own current-thread runtime, so calling from an async task blocks that
    /// task's worker but never panics. Prefer `invoke::call_oracle`, which
    /// moves the call onto the blocking pool.
    fn block_on_model(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.run_on_own_runtime(model, prompt);
        }
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.run_on_own_runtime(model, prompt))
                .join()
                .unwrap_or_else(|_| {
                    Err(LlmError::Other("Oracle request thread panicked".to_string()))
                })
        })
    }

    fn run_on_own_runtime(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;
        runtime.block_on(self.generate_with_model(model, prompt))
    }
}

impl LlmProviderTrait for OllamaProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.block_on_model(&self.model, prompt)
    }

    fn generate_critic(&self, prompt: &str) -> Result<String, Self::Error> {
        self.block_on_model(self.critic_model(), prompt)
    }
}
