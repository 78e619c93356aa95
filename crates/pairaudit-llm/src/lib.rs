//! Pairaudit LLM Provider Layer
//!
//! Pluggable oracle implementations of the `LlmProvider` trait from
//! `pairaudit-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted, deterministic oracle for testing
//! - `OllamaProvider`: Local Ollama API integration with an optional critic model
//!
//! # Examples
//!
//! ```
//! use pairaudit_llm::MockProvider;
//! use pairaudit_domain::LlmProvider;
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt").unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod invoke;
pub mod ollama;

use pairaudit_domain::LlmProvider as LlmProviderTrait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use invoke::{call_oracle, OracleCallError, OracleRole, RetryPolicy};
pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
}

impl MockReply {
    fn into_result(self) -> Result<String, LlmError> {
        match self {
            MockReply::Text(text) => Ok(text),
            MockReply::Error => Err(LlmError::Other("Mock error".to_string())),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock LLM provider for deterministic testing
///
/// Responses are resolved in this order: the next scripted reply, an exact
/// prompt match, the first registered substring rule, the default response.
/// Critic calls have their own script and fall back to the same lookup.
///
/// # Examples
///
/// ```
/// use pairaudit_llm::MockProvider;
/// use pairaudit_domain::LlmProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// provider.respond_when("fact:", "## 遵守状態\ncompliant");
/// assert_eq!(provider.generate("prompt1").unwrap(), "response1");
/// assert!(provider.generate("check fact: weekly").unwrap().contains("compliant"));
///
/// // Scripted replies are consumed in order
/// let provider = MockProvider::new("[]");
/// provider.push_response("not json");
/// provider.push_critic_response(r#"[{"text": "repaired"}]"#);
/// assert_eq!(provider.generate("x").unwrap(), "not json");
/// assert_eq!(provider.generate("x").unwrap(), "[]");
/// assert_eq!(provider.generate_critic("fix").unwrap(), r#"[{"text": "repaired"}]"#);
/// assert_eq!(provider.call_count(), 2);
/// assert_eq!(provider.critic_call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, MockReply>>>,
    rules: Arc<Mutex<Vec<(String, MockReply)>>>,
    script: Arc<Mutex<VecDeque<MockReply>>>,
    critic_script: Arc<Mutex<VecDeque<MockReply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    critic_prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            rules: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            critic_script: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            critic_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).insert(prompt.into(), MockReply::Text(response.into()));
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        lock(&self.responses).insert(prompt.into(), MockReply::Error);
    }

    /// Respond with `response` to any prompt containing `needle`
    pub fn respond_when(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        lock(&self.rules).push((needle.into(), MockReply::Text(response.into())));
    }

    /// Queue a reply for the next primary call
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.script).push_back(MockReply::Text(response.into()));
    }

    /// Queue a failure for the next primary call
    pub fn push_error(&self) {
        lock(&self.script).push_back(MockReply::Error);
    }

    /// Queue a reply for the next critic call
    pub fn push_critic_response(&self, response: impl Into<String>) {
        lock(&self.critic_script).push_back(MockReply::Text(response.into()));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Get the number of times generate_critic was called
    pub fn critic_call_count(&self) -> usize {
        lock(&self.critic_prompts).len()
    }

    /// Prompts received by generate, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Prompts received by generate_critic, in call order
    pub fn critic_prompts(&self) -> Vec<String> {
        lock(&self.critic_prompts).clone()
    }

    /// Reset the call history
    pub fn reset_call_count(&self) {
        lock(&self.prompts).clear();
        lock(&self.critic_prompts).clear();
    }

    fn lookup(&self, prompt: &str) -> MockReply {
        if let Some(reply) = lock(&self.responses).get(prompt) {
            return reply.clone();
        }
        let rules = lock(&self.rules);
        if let Some((_, reply)) = rules.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
            return reply.clone();
        }
        MockReply::Text(self.default_response.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        lock(&self.prompts).push(prompt.to_string());

        let scripted = lock(&self.script).pop_front();
        scripted.unwrap_or_else(|| self.lookup(prompt)).into_result()
    }

    fn generate_critic(&self, prompt: &str) -> Result<String, Self::Error> {
        lock(&self.critic_prompts).push(prompt.to_string());

        let scripted = lock(&self.critic_script).pop_front();
        scripted.unwrap_or_else(|| self.lookup(prompt)).into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("any prompt");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("hello").unwrap(), "world");
        assert_eq!(provider.generate("foo").unwrap(), "bar");
        assert_eq!(provider.generate("unknown").unwrap(), "Default mock response");
    }

    #[test]
    fn test_mock_provider_substring_rules_in_order() {
        let mut provider = MockProvider::default();
        provider.respond_when("weekly", "first");
        provider.respond_when("report", "second");

        assert_eq!(provider.generate("weekly report").unwrap(), "first");
        assert_eq!(provider.generate("daily report").unwrap(), "second");
    }

    #[test]
    fn test_mock_provider_script_takes_precedence() {
        let mut provider = MockProvider::new("fallback");
        provider.add_response("p", "exact");
        provider.push_response("scripted");

        assert_eq!(provider.generate("p").unwrap(), "scripted");
        assert_eq!(provider.generate("p").unwrap(), "exact");
    }

    #[test]
    fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");

        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1").unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.generate("prompt2").unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["prompt1", "prompt2"]);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.generate("bad prompt");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), LlmError::Other(_)));
    }

    #[test]
    fn test_mock_provider_scripted_error() {
        let provider = MockProvider::new("ok");
        provider.push_error();

        assert!(provider.generate("x").is_err());
        assert_eq!(provider.generate("x").unwrap(), "ok");
    }

    #[test]
    fn test_mock_provider_critic_is_counted_separately() {
        let provider = MockProvider::new("[]");
        provider.push_critic_response("fixed");

        assert_eq!(provider.generate_critic("repair this").unwrap(), "fixed");
        assert_eq!(provider.generate_critic("repair again").unwrap(), "[]");
        assert_eq!(provider.critic_call_count(), 2);
        assert_eq!(provider.call_count(), 0);
        assert_eq!(provider.critic_prompts()[0], "repair this");
    }

    #[test]
    fn test_mock_provider_clone() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test").unwrap();

        // Both should share the same call count due to Arc
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }
}
