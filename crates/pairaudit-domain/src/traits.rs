//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

/// Trait for the text-generation oracle
///
/// Implemented by the infrastructure layer (pairaudit-llm). Calls are
/// blocking; async callers move them onto a blocking thread.
pub trait LlmProvider {
    /// Error type for oracle operations
    type Error;

    /// Primary completion: prompt in, response text out
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Critic completion, used to repair a malformed primary response
    ///
    /// Backends without a dedicated critic model answer with the primary one.
    fn generate_critic(&self, prompt: &str) -> Result<String, Self::Error> {
        self.generate(prompt)
    }
}
