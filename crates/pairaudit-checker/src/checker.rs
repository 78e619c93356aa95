//! Pairwise compliance checking

use crate::config::CheckerConfig;
use crate::error::CheckerError;
use crate::response::parse_pair_check_response;
use pairaudit_domain::{Item, LlmProvider, PairCheckResult, PairResult};
use pairaudit_extractor::{PromptGenerator, PromptTemplates};
use pairaudit_llm::{call_oracle, OracleRole};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Judges every condition×fact pair with one oracle call each
///
/// # Examples
///
/// ```no_run
/// use pairaudit_checker::{CheckerConfig, PairChecker};
/// use pairaudit_domain::Item;
/// use pairaudit_llm::MockProvider;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let llm = MockProvider::new("## 遵守状態\ncompliant\n## 信頼度\n0.95\n## 説明\nOK");
/// let checker = PairChecker::new(llm, CheckerConfig::default())?;
///
/// let conditions = vec![Item::condition("Reports must be submitted weekly").with_id(1)];
/// let facts = vec![Item::fact("Weekly report submitted").with_id(1)];
/// let result = checker.check_pairs(&conditions, &facts).await?;
/// println!("{}", result.summary);
/// # Ok(())
/// # }
/// ```
pub struct PairChecker<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    prompts: PromptGenerator,
    config: CheckerConfig,
}

impl<L> PairChecker<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: fmt::Display,
{
    /// Create a new PairChecker with the default prompt templates
    ///
    /// Fails with [`CheckerError::Config`] when `config` does not validate.
    pub fn new(llm_provider: L, config: CheckerConfig) -> Result<Self, CheckerError> {
        Self::with_shared_provider(Arc::new(llm_provider), config)
    }

    /// Create a new PairChecker over a provider shared with other components
    pub fn with_shared_provider(
        llm_provider: Arc<L>,
        config: CheckerConfig,
    ) -> Result<Self, CheckerError> {
        config.validate().map_err(CheckerError::Config)?;
        Ok(Self {
            llm_provider,
            prompts: PromptGenerator::default(),
            config,
        })
    }

    /// Use a custom template set
    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.prompts = PromptGenerator::new(templates);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Judge the full Cartesian product of `conditions` and `facts`
    ///
    /// Results are ordered by condition, then fact, whatever the
    /// concurrency. An oracle failure that outlasts the retry budget aborts
    /// the check; a malformed response only yields an `Unknown` pair.
    pub async fn check_pairs(
        &self,
        conditions: &[Item],
        facts: &[Item],
    ) -> Result<PairCheckResult, CheckerError> {
        let total = conditions.len() * facts.len();
        info!(
            "Checking {} condition(s) x {} fact(s) = {} pair(s)",
            conditions.len(),
            facts.len(),
            total
        );

        // Render every prompt first so template errors surface before any call
        let mut pairs = Vec::with_capacity(total);
        for condition in conditions {
            for fact in facts {
                let prompt = self.prompts.pair_check_prompt(&condition.text, &fact.text)?;
                pairs.push((condition, fact, prompt));
            }
        }

        let responses = if self.config.max_concurrency > 1 && pairs.len() > 1 {
            self.call_concurrently(pairs.iter().map(|(_, _, p)| p.clone()).collect())
                .await?
        } else {
            let mut responses = Vec::with_capacity(pairs.len());
            for (idx, (_, _, prompt)) in pairs.iter().enumerate() {
                debug!("Checking pair {}/{}", idx + 1, total);
                responses.push(self.call(prompt).await?);
            }
            responses
        };

        let pair_results: Vec<PairResult> = pairs
            .into_iter()
            .zip(responses)
            .map(|((condition, fact, _), response)| to_pair_result(condition, fact, &response))
            .collect();

        let result = PairCheckResult::from_pairs(pair_results);
        info!(
            "Pair check complete: overall {}, {} compliant, {} non-compliant, {} unrelated, {} unknown",
            result.overall_status,
            result.compliant_count(),
            result.non_compliant_count(),
            result.unrelated_count(),
            result.unknown_count()
        );
        Ok(result)
    }

    /// Judge a single pair
    pub async fn check_pair(&self, condition: &Item, fact: &Item) -> Result<PairResult, CheckerError> {
        let prompt = self.prompts.pair_check_prompt(&condition.text, &fact.text)?;
        let response = self.call(&prompt).await?;
        Ok(to_pair_result(condition, fact, &response))
    }

    async fn call(&self, prompt: &str) -> Result<String, CheckerError> {
        let response = call_oracle(
            &self.llm_provider,
            prompt,
            OracleRole::Primary,
            self.config.retry_policy(),
        )
        .await?;
        debug!("LLM response length: {} chars", response.len());
        Ok(response)
    }

    /// Call the oracle for every prompt with at most `max_concurrency` in flight
    async fn call_concurrently(&self, prompts: Vec<String>) -> Result<Vec<String>, CheckerError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let policy = self.config.retry_policy();
        let mut join_set = JoinSet::new();

        for (idx, prompt) in prompts.into_iter().enumerate() {
            let llm = Arc::clone(&self.llm_provider);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let response = call_oracle(&llm, &prompt, OracleRole::Primary, policy).await;
                (idx, response)
            });
        }

        let mut responses: Vec<Option<String>> = vec![None; join_set.len()];
        while let Some(joined) = join_set.join_next().await {
            let (idx, response) =
                joined.map_err(|e| CheckerError::Task(e.to_string()))?;
            // Dropping the JoinSet on error aborts the remaining calls
            responses[idx] = Some(response?);
        }

        Ok(responses.into_iter().flatten().collect())
    }
}

fn to_pair_result(condition: &Item, fact: &Item, response: &str) -> PairResult {
    let judgment = parse_pair_check_response(response);
    debug!(
        "Pair '{}' / '{}': {} ({:.2})",
        condition.preview(40),
        fact.preview(40),
        judgment.status,
        judgment.confidence
    );
    PairResult {
        condition: condition.clone(),
        fact: fact.clone(),
        status: judgment.status,
        confidence: judgment.confidence,
        explanation: judgment.explanation,
    }
}
