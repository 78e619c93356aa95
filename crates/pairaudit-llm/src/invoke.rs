//! Oracle invocation from async code with bounded retry
//!
//! `LlmProvider` is blocking, so each call runs on the blocking pool. Failed
//! calls are retried up to the policy's attempt budget with exponential
//! backoff; the last failure is surfaced as an [`OracleCallError`].

use pairaudit_domain::LlmProvider;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Which oracle capability to invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleRole {
    /// Primary completion
    Primary,
    /// Critic (repair) completion
    Critic,
}

impl fmt::Display for OracleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleRole::Primary => f.write_str("primary"),
            OracleRole::Critic => f.write_str("critic"),
        }
    }
}

/// Attempt budget for oracle calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1)
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each further failure
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Create a policy from an attempt count and a base backoff in milliseconds
    pub fn new(max_attempts: u32, backoff_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Duration::from_millis(backoff_ms),
        }
    }

    /// A single attempt, no retry
    pub fn none() -> Self {
        Self::new(1, 0)
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// The oracle failed on every attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{role} oracle call failed after {attempts} attempt(s): {message}")]
pub struct OracleCallError {
    /// Capability that failed
    pub role: OracleRole,
    /// Attempts made
    pub attempts: u32,
    /// Last failure message
    pub message: String,
}

/// Call the oracle on the blocking pool, retrying per `policy`
pub async fn call_oracle<L>(
    llm: &Arc<L>,
    prompt: &str,
    role: OracleRole,
    policy: RetryPolicy,
) -> Result<String, OracleCallError>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: fmt::Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        let llm = Arc::clone(llm);
        let prompt = prompt.to_string();

        let outcome = tokio::task::spawn_blocking(move || {
            let result = match role {
                OracleRole::Primary => llm.generate(&prompt),
                OracleRole::Critic => llm.generate_critic(&prompt),
            };
            result.map_err(|e| e.to_string())
        })
        .await;

        match outcome {
            Ok(Ok(text)) => return Ok(text),
            Ok(Err(e)) => last_error = e,
            Err(e) => last_error = format!("Task join error: {}", e),
        }

        if attempt < attempts {
            let delay = policy.delay_after(attempt);
            warn!(
                "{} oracle call failed (attempt {}/{}): {}; retrying in {:?}",
                role, attempt, attempts, last_error, delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    Err(OracleCallError {
        role,
        attempts,
        message: last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(4, 100);
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_policy_has_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0, 10).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_single_attempt_surfaces_error() {
        let provider = MockProvider::new("ok");
        provider.push_error();
        let llm = Arc::new(provider.clone());

        let err = call_oracle(&llm, "p", OracleRole::Primary, RetryPolicy::none())
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(err.role, OracleRole::Primary);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let provider = MockProvider::new("recovered");
        provider.push_error();
        let llm = Arc::new(provider.clone());

        let text = call_oracle(&llm, "p", OracleRole::Primary, RetryPolicy::new(3, 1))
            .await
            .unwrap();
        assert_eq!(text, "recovered");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_critic_role_uses_critic_capability() {
        let provider = MockProvider::new("primary");
        provider.push_critic_response("critic");
        let llm = Arc::new(provider.clone());

        let text = call_oracle(&llm, "p", OracleRole::Critic, RetryPolicy::none())
            .await
            .unwrap();
        assert_eq!(text, "critic");
        assert_eq!(provider.call_count(), 0);
        assert_eq!(provider.critic_call_count(), 1);
    }
}
