//! Pairaudit Extractor
//!
//! Extracts conditions and facts from free-form documents with an LLM.
//!
//! # Overview
//!
//! Documents are scanned into headings, list items and paragraphs, chunked
//! at block boundaries when long, and sent to the oracle with a prompt
//! rendered from a template. Every response is validated against the item
//! schema; an invalid response is retried once and then handed to the
//! critic for repair. A unit the critic cannot fix is abandoned without
//! aborting the run.
//!
//! # Architecture
//!
//! ```text
//! Text → StructureAnalyzer → PromptGenerator → LLM → ResponseParser → Items
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use pairaudit_extractor::{Extractor, ExtractorConfig};
//! use pairaudit_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"[{"id": 1, "text": "Reports must be submitted weekly"}]"#);
//! let extractor = Extractor::new(llm, ExtractorConfig::default())?;
//!
//! let conditions = extractor
//!     .extract_conditions("Reports must be submitted weekly.", Some("policy.md"))
//!     .await?;
//! let facts = extractor
//!     .extract_facts("We submitted the weekly report.", &conditions.items, None)
//!     .await?;
//!
//! println!("{} conditions, {} facts", conditions.items.len(), facts.items.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
pub mod files;
mod parser;
pub mod prompt;
mod structure;
mod types;


pub use config::ExtractorConfig;
pub use error::{ExtractorError, SchemaValidationError, TemplateError};
pub use extractor::Extractor;
pub use parser::{parse_extraction_response, post_process_extracted_items};
pub use prompt::{PromptGenerator, PromptTemplates};
pub use structure::{Block, BlockKind, Chunk, StructureAnalyzer};
pub use types::{ChunkFailure, ExtractedItem, ExtractionMetadata, ExtractionResult};
