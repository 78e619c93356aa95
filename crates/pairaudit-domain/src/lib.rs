//! Pairaudit Domain Layer
//!
//! This crate contains the core domain model for Pairaudit. It has ZERO
//! external dependencies and defines the value objects and trait interfaces
//! that the extraction and checking layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Item**: a unit of extracted meaning, either a condition or a fact
//! - **Hierarchy**: parent/child links between items, resolved through an arena
//! - **Pair**: one (condition, fact) combination judged for compliance
//! - **Oracle**: the external text-generation capability (`LlmProvider`)
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Pure logic only, no I/O
//! - Oracle adapters live in `pairaudit-llm`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compliance;
pub mod hierarchy;
pub mod item;
pub mod traits;

// Re-exports for convenience
pub use compliance::{
    determine_overall_status, ComplianceStatus, PairCheckResult, PairResult, StatusCounts,
};
pub use hierarchy::ItemHierarchy;
pub use item::{Item, ItemId, ItemKind};
pub use traits::LlmProvider;
