//! Parse pair-check responses
//!
//! Responses are markdown with three `##` sections: status, confidence and
//! explanation. Japanese and English header names are both accepted. Nothing
//! here fails; missing or unreadable sections fall back to `Unknown`, `0.0`
//! and an empty explanation.

use pairaudit_domain::ComplianceStatus;
use regex::Regex;
use std::sync::LazyLock;

const STATUS_HEADERS: [&str; 4] = ["遵守状態", "適合状態", "compliance status", "status"];
const CONFIDENCE_HEADERS: [&str; 2] = ["信頼度", "confidence"];
const EXPLANATION_HEADERS: [&str; 2] = ["説明", "explanation"];

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*##\s*(.+?)\s*$").expect("header pattern is valid"));

// The status word must open the line; only markup may precede it
static STATUS_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[^\p{L}\p{N}]*(non[_\- ]?compliant|compliant|unrelated)\b")
        .expect("status pattern is valid")
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?[0-9]*\.?[0-9]+").expect("number pattern is valid"));

/// Judgment read from one pair-check response
#[derive(Debug, Clone, PartialEq)]
pub struct PairJudgment {
    /// Parsed status, `Unknown` when absent or unrecognized
    pub status: ComplianceStatus,

    /// Parsed confidence clamped into [0, 1], `0.0` when absent
    pub confidence: f64,

    /// Explanation text, empty when absent
    pub explanation: String,
}

/// Parse an oracle pair-check response
///
/// # Examples
///
/// ```
/// use pairaudit_checker::parse_pair_check_response;
/// use pairaudit_domain::ComplianceStatus;
///
/// let judgment = parse_pair_check_response("## 遵守状態\ncompliant\n## 信頼度\n0.9\n## 説明\nMatches.");
/// assert_eq!(judgment.status, ComplianceStatus::Compliant);
/// assert_eq!(judgment.confidence, 0.9);
/// assert_eq!(judgment.explanation, "Matches.");
/// ```
pub fn parse_pair_check_response(response: &str) -> PairJudgment {
    let status = section(response, &STATUS_HEADERS)
        .and_then(|body| first_line(&body).map(str::to_string))
        .and_then(|line| parse_status(&line))
        .unwrap_or(ComplianceStatus::Unknown);

    let confidence = section(response, &CONFIDENCE_HEADERS)
        .and_then(|body| first_line(&body).and_then(parse_confidence))
        .unwrap_or(0.0);

    let explanation = section(response, &EXPLANATION_HEADERS).unwrap_or_default();

    PairJudgment {
        status,
        confidence,
        explanation,
    }
}

/// Body of the first section whose header is one of `names`
fn section(response: &str, names: &[&str]) -> Option<String> {
    let lines: Vec<&str> = response.lines().collect();

    let start = lines.iter().position(|line| {
        header_name(line).is_some_and(|name| names.iter().any(|n| name == n.to_lowercase()))
    })?;

    let body: Vec<&str> = lines[start + 1..]
        .iter()
        .take_while(|line| header_name(line).is_none())
        .copied()
        .collect();

    Some(body.join("\n").trim().to_string())
}

/// Normalized header name of a `##` line
fn header_name(line: &str) -> Option<String> {
    let caps = HEADER.captures(line)?;
    let name = caps[1].trim_end_matches([':', '：']).trim();
    Some(name.to_lowercase())
}

fn first_line(body: &str) -> Option<&str> {
    body.lines().map(str::trim).find(|line| !line.is_empty())
}

fn parse_status(line: &str) -> Option<ComplianceStatus> {
    let token = STATUS_TOKEN.captures(line)?.get(1)?.as_str().to_lowercase();
    if token.starts_with("non") {
        Some(ComplianceStatus::NonCompliant)
    } else {
        ComplianceStatus::parse(&token)
    }
}

fn parse_confidence(line: &str) -> Option<f64> {
    let mut value: f64 = NUMBER.find(line)?.as_str().parse().ok()?;
    if value > 1.0 && line.contains('%') {
        value /= 100.0;
    }
    Some(value.clamp(0.0, 1.0))
}
