//! Compliance judgments for condition×fact pairs and their aggregate

use crate::item::Item;
use std::fmt;

/// Compliance judgment for a single pair or a whole check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplianceStatus {
    /// The fact satisfies the condition
    Compliant,

    /// The fact violates the condition
    NonCompliant,

    /// The fact has nothing to do with the condition
    Unrelated,

    /// No judgment could be made
    Unknown,
}

impl ComplianceStatus {
    /// Get the status token as emitted by the oracle
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::NonCompliant => "non_compliant",
            ComplianceStatus::Unrelated => "unrelated",
            ComplianceStatus::Unknown => "unknown",
        }
    }

    /// Parse a status token (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "compliant" => Some(ComplianceStatus::Compliant),
            "non_compliant" => Some(ComplianceStatus::NonCompliant),
            "unrelated" => Some(ComplianceStatus::Unrelated),
            "unknown" => Some(ComplianceStatus::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Judgment for exactly one condition×fact pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairResult {
    /// The condition side of the pair
    pub condition: Item,

    /// The fact side of the pair
    pub fact: Item,

    /// Oracle judgment
    pub status: ComplianceStatus,

    /// Oracle confidence in [0, 1]
    pub confidence: f64,

    /// Free-text justification, possibly empty
    pub explanation: String,
}

/// Per-status tallies over a set of pair results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Pairs judged compliant
    pub compliant: usize,
    /// Pairs judged non-compliant
    pub non_compliant: usize,
    /// Pairs judged unrelated
    pub unrelated: usize,
    /// Pairs without a usable judgment
    pub unknown: usize,
}

impl StatusCounts {
    /// Tally statuses
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a ComplianceStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                ComplianceStatus::Compliant => counts.compliant += 1,
                ComplianceStatus::NonCompliant => counts.non_compliant += 1,
                ComplianceStatus::Unrelated => counts.unrelated += 1,
                ComplianceStatus::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    /// Total number of pairs
    pub fn total(&self) -> usize {
        self.compliant + self.non_compliant + self.unrelated + self.unknown
    }

    /// Compliant share of all pairs, 0.0 when there are none
    pub fn compliance_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.compliant as f64 / total as f64
        }
    }
}

/// Overall status of a check run
///
/// Precedence: any non-compliant pair wins, then any compliant pair, then
/// all-unrelated, otherwise unknown.
///
/// # Examples
///
/// ```
/// use pairaudit_domain::{determine_overall_status, ComplianceStatus, StatusCounts};
///
/// let counts = StatusCounts { compliant: 3, non_compliant: 1, unrelated: 0, unknown: 2 };
/// assert_eq!(determine_overall_status(&counts), ComplianceStatus::NonCompliant);
/// ```
pub fn determine_overall_status(counts: &StatusCounts) -> ComplianceStatus {
    if counts.non_compliant > 0 {
        return ComplianceStatus::NonCompliant;
    }
    if counts.compliant > 0 {
        return ComplianceStatus::Compliant;
    }
    if counts.unrelated > 0 && counts.unknown == 0 {
        return ComplianceStatus::Unrelated;
    }
    ComplianceStatus::Unknown
}

/// Aggregate over all pair results of one check run
#[derive(Debug, Clone, PartialEq)]
pub struct PairCheckResult {
    /// Overall verdict
    pub overall_status: ComplianceStatus,

    /// Every pair, ordered by condition then fact
    pub pair_results: Vec<PairResult>,

    /// Per-status tallies
    pub counts: StatusCounts,

    /// Number of pairs
    pub total_count: usize,

    /// compliant / total, 0.0 when empty
    pub compliance_rate: f64,

    /// Human-readable summary
    pub summary: String,
}

impl PairCheckResult {
    /// Aggregate pair results into a run result
    pub fn from_pairs(pair_results: Vec<PairResult>) -> Self {
        let counts = StatusCounts::tally(pair_results.iter().map(|r| &r.status));
        let overall_status = determine_overall_status(&counts);
        let summary = summarize(overall_status, &counts);

        Self {
            overall_status,
            total_count: counts.total(),
            compliance_rate: counts.compliance_rate(),
            counts,
            pair_results,
            summary,
        }
    }

    /// Pairs judged compliant
    pub fn compliant_count(&self) -> usize {
        self.counts.compliant
    }

    /// Pairs judged non-compliant
    pub fn non_compliant_count(&self) -> usize {
        self.counts.non_compliant
    }

    /// Pairs judged unrelated
    pub fn unrelated_count(&self) -> usize {
        self.counts.unrelated
    }

    /// Pairs without a usable judgment
    pub fn unknown_count(&self) -> usize {
        self.counts.unknown
    }
}

fn summarize(status: ComplianceStatus, counts: &StatusCounts) -> String {
    let total = counts.total();
    match status {
        ComplianceStatus::Compliant => format!(
            "No violations found: {} of {} pairs are compliant. Compliance rate: {:.1}%",
            counts.compliant,
            total,
            counts.compliance_rate() * 100.0
        ),
        ComplianceStatus::NonCompliant => format!(
            "{} pair(s) are non-compliant. Compliance rate: {:.1}%",
            counts.non_compliant,
            counts.compliance_rate() * 100.0
        ),
        ComplianceStatus::Unrelated => format!("All {} pairs are unrelated.", total),
        ComplianceStatus::Unknown => format!(
            "Some pairs could not be judged. Compliant: {}, non-compliant: {}, unrelated: {}, unknown: {}",
            counts.compliant, counts.non_compliant, counts.unrelated, counts.unknown
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(status: ComplianceStatus) -> PairResult {
        PairResult {
            condition: Item::condition("Reports must be submitted weekly").with_id(1),
            fact: Item::fact("Weekly report submitted").with_id(1),
            status,
            confidence: 0.9,
            explanation: String::new(),
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(ComplianceStatus::parse("COMPLIANT"), Some(ComplianceStatus::Compliant));
        assert_eq!(
            ComplianceStatus::parse("non_compliant"),
            Some(ComplianceStatus::NonCompliant)
        );
        assert_eq!(ComplianceStatus::parse("maybe"), None);
    }

    #[test]
    fn test_empty_run_has_zero_rate() {
        let result = PairCheckResult::from_pairs(Vec::new());
        assert_eq!(result.total_count, 0);
        assert_eq!(result.compliance_rate, 0.0);
        assert_eq!(result.overall_status, ComplianceStatus::Unknown);
    }

    #[test]
    fn test_mixed_run() {
        let result = PairCheckResult::from_pairs(vec![
            pair(ComplianceStatus::Compliant),
            pair(ComplianceStatus::NonCompliant),
        ]);
        assert_eq!(result.overall_status, ComplianceStatus::NonCompliant);
        assert_eq!(result.compliant_count(), 1);
        assert_eq!(result.non_compliant_count(), 1);
        assert_eq!(result.compliance_rate, 0.5);
        assert!(result.summary.contains("1 pair(s) are non-compliant"));
    }

    #[test]
    fn test_all_unrelated() {
        let result = PairCheckResult::from_pairs(vec![
            pair(ComplianceStatus::Unrelated),
            pair(ComplianceStatus::Unrelated),
        ]);
        assert_eq!(result.overall_status, ComplianceStatus::Unrelated);
        assert!(result.summary.contains("All 2 pairs"));
    }

    #[test]
    fn test_unrelated_with_unknown_is_unknown() {
        let result = PairCheckResult::from_pairs(vec![
            pair(ComplianceStatus::Unrelated),
            pair(ComplianceStatus::Unknown),
        ]);
        assert_eq!(result.overall_status, ComplianceStatus::Unknown);
        assert_eq!(result.unknown_count(), 1);
        assert_eq!(result.unrelated_count(), 1);
    }
}
