//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::{ExtractorError, SchemaValidationError};
use crate::parser::{parse_extraction_response, post_process_extracted_items};
use crate::prompt::{PromptGenerator, PromptTemplates};
use crate::structure::StructureAnalyzer;
use crate::types::{ChunkFailure, ExtractedItem, ExtractionMetadata, ExtractionResult};
use pairaudit_domain::{Item, ItemHierarchy, ItemId, ItemKind, LlmProvider};
use pairaudit_llm::{call_oracle, OracleRole};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The Extractor turns documents into condition and fact items
///
/// Each prompt goes through the repair protocol: a primary call, one retry
/// with the same prompt, then a critic repair. A unit whose critic output is
/// still invalid is abandoned and the run continues.
pub struct Extractor<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    analyzer: StructureAnalyzer,
    prompts: PromptGenerator,
    config: ExtractorConfig,
}

/// Terminal state of one extraction unit
enum UnitOutcome {
    Done(Vec<ExtractedItem>),
    Abandoned(SchemaValidationError),
}

/// Mutable state of one extraction run
struct RunState {
    items: Vec<ExtractedItem>,
    next_id: ItemId,
    failures: Vec<ChunkFailure>,
    metadata: ExtractionMetadata,
}

impl<L> Extractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: fmt::Display,
{
    /// Create a new Extractor with the default prompt templates
    ///
    /// Fails with [`ExtractorError::Config`] when `config` does not validate.
    pub fn new(llm_provider: L, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        Self::with_shared_provider(Arc::new(llm_provider), config)
    }

    /// Create a new Extractor over a provider shared with other components
    pub fn with_shared_provider(
        llm_provider: Arc<L>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            llm_provider,
            analyzer: StructureAnalyzer::from_config(&config),
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
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract the conditions stated in `text`
    pub async fn extract_conditions(
        &self,
        text: &str,
        source: Option<&str>,
    ) -> Result<ExtractionResult, ExtractorError> {
        self.run(text, ItemKind::Condition, &[], source).await
    }

    /// Extract the facts stated in `text`
    ///
    /// With conditions, prompts are condition-driven: conditions are split
    /// into batches that fit the token budget and facts carry the ids of the
    /// conditions that motivated them. Without conditions, one unconditioned
    /// prompt is sent per chunk.
    pub async fn extract_facts(
        &self,
        text: &str,
        conditions: &[Item],
        source: Option<&str>,
    ) -> Result<ExtractionResult, ExtractorError> {
        self.run(text, ItemKind::Fact, conditions, source).await
    }

    async fn run(
        &self,
        text: &str,
        kind: ItemKind,
        conditions: &[Item],
        source: Option<&str>,
    ) -> Result<ExtractionResult, ExtractorError> {
        let start_time = Instant::now();

        let chunks = if text.trim().is_empty() {
            warn!("Input text is empty, nothing to extract");
            Vec::new()
        } else if self.analyzer.should_chunk_text(text) {
            info!("Text exceeds chunk size ({} chars), chunking...", text.chars().count());
            self.analyzer.chunk_text(text)
        } else {
            vec![text.to_string()]
        };

        info!(
            "Starting {} extraction over {} chunk(s), {} active condition(s)",
            kind,
            chunks.len(),
            conditions.len()
        );

        let mut state = RunState {
            items: Vec::new(),
            next_id: 1,
            failures: Vec::new(),
            metadata: ExtractionMetadata {
                source: source.map(str::to_string),
                chunk_count: chunks.len(),
                ..ExtractionMetadata::default()
            },
        };

        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let blocks = self.analyzer.analyze(chunk);

            match kind {
                ItemKind::Fact if !conditions.is_empty() => {
                    let batches =
                        batch_conditions(chunk, conditions, self.config.condition_token_budget);
                    info!(
                        "Chunk {}/{}: {} condition batch(es)",
                        chunk_index + 1,
                        chunks.len(),
                        batches.len()
                    );
                    for (batch_index, batch) in batches.iter().enumerate() {
                        let prompt = self.prompts.fact_extraction_prompt(chunk, &blocks, batch)?;
                        self.process_unit(&prompt, chunk_index, Some(batch_index), true, &mut state)
                            .await?;
                    }
                }
                ItemKind::Fact => {
                    let prompt = self.prompts.fact_extraction_prompt(chunk, &blocks, &[])?;
                    self.process_unit(&prompt, chunk_index, None, false, &mut state)
                        .await?;
                }
                _ => {
                    let prompt = self.prompts.condition_extraction_prompt(chunk, &blocks)?;
                    self.process_unit(&prompt, chunk_index, None, false, &mut state)
                        .await?;
                }
            }
        }

        let extracted = post_process_linked(state.items, self.config.min_item_chars);
        let items: Vec<Item> = extracted
            .into_iter()
            .map(|e| Item {
                id: e.id,
                text: e.text,
                kind,
                source: source.map(str::to_string),
                parent_id: e.parent_id,
                condition_ids: e.condition_ids,
            })
            .collect();

        let hierarchy = ItemHierarchy::build(&items);
        if !hierarchy.unresolved().is_empty() {
            debug!(
                "{} item(s) reference a parent outside the result",
                hierarchy.unresolved().len()
            );
        }
        if !hierarchy.rejected().is_empty() {
            warn!(
                "Ignored {} self-referencing or cyclic parent link(s)",
                hierarchy.rejected().len()
            );
        }

        let mut metadata = state.metadata;
        metadata.abandoned_count = state.failures.len();
        metadata.processing_time_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Extraction complete: {} {} item(s), {} abandoned unit(s)",
            items.len(),
            kind,
            metadata.abandoned_count
        );

        Ok(ExtractionResult {
            items,
            hierarchy,
            failures: state.failures,
            metadata,
        })
    }

    /// Run one prompt through the repair protocol and record its outcome
    async fn process_unit(
        &self,
        prompt: &str,
        chunk_index: usize,
        batch_index: Option<usize>,
        keep_condition_ids: bool,
        state: &mut RunState,
    ) -> Result<(), ExtractorError> {
        state.metadata.batch_count += 1;
        debug!("Prompt length: {} chars", prompt.len());

        match self.extract_unit(prompt, &mut state.metadata).await? {
            UnitOutcome::Done(mut items) => {
                debug!("Unit produced {} item(s)", items.len());
                if !keep_condition_ids {
                    for item in &mut items {
                        item.condition_ids = None;
                    }
                }
                state.next_id = renumber(&mut items, state.next_id);
                state.items.extend(items);
            }
            UnitOutcome::Abandoned(error) => {
                warn!(
                    "Abandoning chunk {} (batch {:?}) after critic repair failed: {}",
                    chunk_index, batch_index, error
                );
                state.failures.push(ChunkFailure {
                    chunk_index,
                    batch_index,
                    reason: error.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Primary call, same-prompt retry, critic repair
    async fn extract_unit(
        &self,
        prompt: &str,
        metadata: &mut ExtractionMetadata,
    ) -> Result<UnitOutcome, ExtractorError> {
        let policy = self.config.retry_policy();

        let response = call_oracle(&self.llm_provider, prompt, OracleRole::Primary, policy).await?;
        metadata.oracle_calls += 1;
        debug!("LLM response length: {} chars", response.len());

        let error = match parse_extraction_response(&response) {
            Ok(items) => return Ok(UnitOutcome::Done(items)),
            Err(e) => e,
        };
        warn!("LLM response failed validation: {}. Retrying", error);

        let response = call_oracle(&self.llm_provider, prompt, OracleRole::Primary, policy).await?;
        metadata.oracle_calls += 1;

        let error = match parse_extraction_response(&response) {
            Ok(items) => {
                info!("Retry produced a valid response");
                return Ok(UnitOutcome::Done(items));
            }
            Err(e) => e,
        };
        warn!("Retry failed validation: {}. Calling critic", error);

        let critic_prompt = self
            .prompts
            .critic_prompt(prompt, &response, &error.to_string())?;
        let repaired =
            call_oracle(&self.llm_provider, &critic_prompt, OracleRole::Critic, policy).await?;
        metadata.critic_calls += 1;

        match parse_extraction_response(&repaired) {
            Ok(items) => {
                info!("Critic repaired the response");
                Ok(UnitOutcome::Done(items))
            }
            Err(e) => Ok(UnitOutcome::Abandoned(e)),
        }
    }
}

/// Split conditions into batches whose approximate token count fits `budget`
///
/// Tokens are approximated as characters / 4. Every batch starts from the
/// cost of `text` itself; a condition is never dropped, so a batch may
/// exceed the budget when a single condition does.
pub(crate) fn batch_conditions<'a>(
    text: &str,
    conditions: &'a [Item],
    budget: usize,
) -> Vec<&'a [Item]> {
    let base = text.chars().count() / 4;
    let mut batches = Vec::new();
    let mut start = 0;
    let mut current = base;

    for (idx, condition) in conditions.iter().enumerate() {
        let cost = condition.text.chars().count() / 4;
        if current + cost > budget && idx > start {
            batches.push(&conditions[start..idx]);
            start = idx;
            current = base;
        }
        current += cost;
    }

    if start < conditions.len() {
        batches.push(&conditions[start..]);
    }
    batches
}

/// Assign run-wide ids in output order and remap parent ids
///
/// Parent ids that do not name an item of the same response become `None`.
/// Returns the next free id.
fn renumber(items: &mut [ExtractedItem], mut next_id: ItemId) -> ItemId {
    let mut mapping: HashMap<ItemId, ItemId> = HashMap::new();
    let mut assigned = Vec::with_capacity(items.len());

    for item in items.iter() {
        if let Some(local) = item.id {
            mapping.entry(local).or_insert(next_id);
        }
        assigned.push(next_id);
        next_id += 1;
    }

    for (item, id) in items.iter_mut().zip(assigned) {
        item.id = Some(id);
        item.parent_id = item.parent_id.and_then(|p| mapping.get(&p).copied());
    }

    next_id
}

/// De-duplicate and drop short items without orphaning their children
///
/// A child of a dropped duplicate is re-pointed at the kept copy. A child of
/// a dropped short item is re-pointed at that item's own parent.
fn post_process_linked(items: Vec<ExtractedItem>, min_chars: usize) -> Vec<ExtractedItem> {
    let mut redirects: HashMap<ItemId, Option<ItemId>> = HashMap::new();
    {
        let mut first_by_text: HashMap<&str, Option<ItemId>> = HashMap::new();
        for item in &items {
            match first_by_text.get(item.text.as_str()) {
                Some(&kept) => {
                    if let Some(id) = item.id {
                        redirects.insert(id, kept);
                    }
                }
                None => {
                    first_by_text.insert(item.text.as_str(), item.id);
                    if let Some(id) = item.id {
                        if item.text.chars().count() <= min_chars {
                            redirects.insert(id, item.parent_id);
                        }
                    }
                }
            }
        }
    }

    let mut kept = post_process_extracted_items(items, min_chars);
    if redirects.is_empty() {
        return kept;
    }

    for item in &mut kept {
        let parent = resolve_parent(item.parent_id, &redirects);
        item.parent_id = parent.filter(|p| Some(*p) != item.id);
    }
    kept
}

/// Follow redirects from a dropped parent to the nearest surviving one
fn resolve_parent(
    parent: Option<ItemId>,
    redirects: &HashMap<ItemId, Option<ItemId>>,
) -> Option<ItemId> {
    let mut current = parent?;
    // Bounded so a redirect cycle ends as a root
    for _ in 0..=redirects.len() {
        match redirects.get(&current) {
            Some(Some(next)) => current = *next,
            Some(None) => return None,
            None => return Some(current),
        }
    }
    None
}
