//! Pairaudit Checker
//!
//! Builds the condition×fact compliance matrix.
//!
//! Every pair gets one oracle call and its response is read into a status,
//! a confidence and an explanation. The pair results are then aggregated:
//!
//! - any non-compliant pair makes the run non-compliant
//! - otherwise any compliant pair makes it compliant
//! - a run of only unrelated pairs is unrelated
//! - anything else is unknown
//!
//! Pairs can be checked concurrently (`max_concurrency > 1`); the result
//! order is the same as for a sequential run.

#![warn(missing_docs)]

mod checker;
mod config;
mod error;
mod response;

pub use checker::PairChecker;
pub use config::CheckerConfig;
pub use error::CheckerError;
pub use response::{parse_pair_check_response, PairJudgment};
