//! Integration tests for the PairChecker

use pairaudit_checker::{CheckerConfig, CheckerError, PairChecker};
use pairaudit_domain::{ComplianceStatus, Item};
use pairaudit_extractor::PromptTemplates;
use pairaudit_llm::MockProvider;

const COMPLIANT: &str = "## 遵守状態\ncompliant\n\n## 信頼度\n0.95\n\n## 説明\nThe report is weekly.";
const NON_COMPLIANT: &str =
    "## 遵守状態\nnon_compliant\n\n## 信頼度\n0.8\n\n## 説明\nThe report is daily, not weekly.";
const UNRELATED: &str = "## 遵守状態\nunrelated\n\n## 信頼度\n0.7\n\n## 説明\nDifferent topic.";

fn weekly_condition() -> Item {
    Item::condition("Reports must be submitted weekly").with_id(1)
}

#[tokio::test]
async fn test_single_compliant_pair() {
    let mut llm = MockProvider::new(NON_COMPLIANT);
    llm.respond_when("Weekly report submitted", COMPLIANT);

    let checker = PairChecker::new(llm.clone(), CheckerConfig::default()).unwrap();
    let result = checker
        .check_pairs(&[weekly_condition()], &[Item::fact("Weekly report submitted").with_id(1)])
        .await
        .unwrap();

    assert_eq!(result.overall_status, ComplianceStatus::Compliant);
    assert_eq!(result.compliant_count(), 1);
    assert_eq!(result.total_count, 1);
    assert_eq!(result.compliance_rate, 1.0);
    assert_eq!(result.pair_results[0].confidence, 0.95);
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_single_non_compliant_pair() {
    let mut llm = MockProvider::new(COMPLIANT);
    llm.respond_when("Daily report submitted", NON_COMPLIANT);

    let checker = PairChecker::new(llm, CheckerConfig::default()).unwrap();
    let result = checker
        .check_pairs(&[weekly_condition()], &[Item::fact("Daily report submitted").with_id(1)])
        .await
        .unwrap();

    assert_eq!(result.overall_status, ComplianceStatus::NonCompliant);
    assert_eq!(result.non_compliant_count(), 1);
    assert_eq!(result.pair_results[0].explanation, "The report is daily, not weekly.");
}

#[tokio::test]
async fn test_non_compliant_takes_precedence() {
    let mut llm = MockProvider::new(UNRELATED);
    llm.respond_when("Weekly report submitted", COMPLIANT);
    llm.respond_when("Daily report submitted", NON_COMPLIANT);

    let facts = vec![
        Item::fact("Weekly report submitted").with_id(1),
        Item::fact("Daily report submitted").with_id(2),
    ];
    let checker = PairChecker::new(llm, CheckerConfig::default()).unwrap();
    let result = checker.check_pairs(&[weekly_condition()], &facts).await.unwrap();

    assert_eq!(result.overall_status, ComplianceStatus::NonCompliant);
    assert_eq!(result.compliant_count(), 1);
    assert_eq!(result.non_compliant_count(), 1);
    assert_eq!(result.compliance_rate, 0.5);
}

#[tokio::test]
async fn test_all_unrelated() {
    let llm = MockProvider::new(UNRELATED);
    let facts = vec![
        Item::fact("The office has a new coffee machine").with_id(1),
        Item::fact("Parking is free on weekends").with_id(2),
    ];

    let checker = PairChecker::new(llm, CheckerConfig::default()).unwrap();
    let result = checker.check_pairs(&[weekly_condition()], &facts).await.unwrap();

    assert_eq!(result.overall_status, ComplianceStatus::Unrelated);
    assert_eq!(result.unrelated_count(), 2);
    assert_eq!(result.compliance_rate, 0.0);
}

#[tokio::test]
async fn test_malformed_response_becomes_unknown() {
    let llm = MockProvider::new("I am not sure what you mean.");

    let checker = PairChecker::new(llm, CheckerConfig::default()).unwrap();
    let result = checker
        .check_pairs(&[weekly_condition()], &[Item::fact("Weekly report submitted").with_id(1)])
        .await
        .unwrap();

    assert_eq!(result.overall_status, ComplianceStatus::Unknown);
    assert_eq!(result.unknown_count(), 1);
    assert_eq!(result.pair_results[0].confidence, 0.0);
    assert_eq!(result.pair_results[0].explanation, "");
}

#[tokio::test]
async fn test_empty_inputs_make_no_calls() {
    let llm = MockProvider::new(COMPLIANT);

    let checker = PairChecker::new(llm.clone(), CheckerConfig::default()).unwrap();
    let result = checker.check_pairs(&[weekly_condition()], &[]).await.unwrap();

    assert_eq!(result.total_count, 0);
    assert_eq!(result.compliance_rate, 0.0);
    assert_eq!(result.overall_status, ComplianceStatus::Unknown);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_full_matrix_order() {
    let mut llm = MockProvider::new(UNRELATED);
    llm.respond_when("Daily report submitted", NON_COMPLIANT);

    let conditions = vec![
        weekly_condition(),
        Item::condition("Reports must be signed by a manager").with_id(2),
    ];
    let facts = vec![
        Item::fact("Weekly report submitted").with_id(1),
        Item::fact("Daily report submitted").with_id(2),
        Item::fact("Report signed by the manager").with_id(3),
    ];

    let checker = PairChecker::new(llm.clone(), CheckerConfig::default()).unwrap();
    let result = checker.check_pairs(&conditions, &facts).await.unwrap();

    assert_eq!(llm.call_count(), 6);
    let order: Vec<(Option<i64>, Option<i64>)> = result
        .pair_results
        .iter()
        .map(|r| (r.condition.id, r.fact.id))
        .collect();
    assert_eq!(
        order,
        vec![
            (Some(1), Some(1)),
            (Some(1), Some(2)),
            (Some(1), Some(3)),
            (Some(2), Some(1)),
            (Some(2), Some(2)),
            (Some(2), Some(3)),
        ]
    );
}

#[tokio::test]
async fn test_concurrent_check_matches_sequential() {
    let mut llm = MockProvider::new(UNRELATED);
    llm.respond_when("Weekly report submitted", COMPLIANT);
    llm.respond_when("Daily report submitted", NON_COMPLIANT);

    let conditions = vec![
        weekly_condition(),
        Item::condition("Reports must be signed by a manager").with_id(2),
    ];
    let facts = vec![
        Item::fact("Weekly report submitted").with_id(1),
        Item::fact("Daily report submitted").with_id(2),
        Item::fact("Report signed by the manager").with_id(3),
    ];

    let sequential = PairChecker::new(llm.clone(), CheckerConfig::default())
        .unwrap()
        .check_pairs(&conditions, &facts)
        .await
        .unwrap();

    let config = CheckerConfig {
        max_concurrency: 4,
        ..CheckerConfig::default()
    };
    let concurrent = PairChecker::new(llm.clone(), config)
        .unwrap()
        .check_pairs(&conditions, &facts)
        .await
        .unwrap();

    assert_eq!(concurrent, sequential);
    assert_eq!(llm.call_count(), 12);
}

#[tokio::test]
async fn test_oracle_failure_aborts_check() {
    let llm = MockProvider::new(COMPLIANT);
    llm.push_error();

    let checker = PairChecker::new(llm, CheckerConfig::default()).unwrap();
    let result = checker
        .check_pairs(&[weekly_condition()], &[Item::fact("Weekly report submitted").with_id(1)])
        .await;

    assert!(matches!(result, Err(CheckerError::Llm(_))));
}

#[tokio::test]
async fn test_oracle_retry_recovers() {
    let llm = MockProvider::new(COMPLIANT);
    llm.push_error();
    let config = CheckerConfig {
        max_oracle_attempts: 2,
        oracle_backoff_ms: 1,
        ..CheckerConfig::default()
    };

    let result = PairChecker::new(llm.clone(), config)
        .unwrap()
        .check_pairs(&[weekly_condition()], &[Item::fact("Weekly report submitted").with_id(1)])
        .await
        .unwrap();

    assert_eq!(result.overall_status, ComplianceStatus::Compliant);
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_custom_template_reaches_oracle() {
    let llm = MockProvider::new(COMPLIANT);
    let templates = PromptTemplates {
        pair_check: "RULE<{condition}> STATEMENT<{fact}>".to_string(),
        ..PromptTemplates::default()
    };

    let checker = PairChecker::new(llm.clone(), CheckerConfig::default())
        .unwrap()
        .with_templates(templates);
    checker
        .check_pair(&weekly_condition(), &Item::fact("Weekly report submitted"))
        .await
        .unwrap();

    assert_eq!(
        llm.prompts(),
        vec!["RULE<Reports must be submitted weekly> STATEMENT<Weekly report submitted>".to_string()]
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = CheckerConfig {
        max_concurrency: 0,
        ..CheckerConfig::default()
    };
    let result = PairChecker::new(MockProvider::new(COMPLIANT), config);
    assert!(matches!(result, Err(CheckerError::Config(_))));

    let config = CheckerConfig {
        max_oracle_attempts: 0,
        ..CheckerConfig::default()
    };
    let result = PairChecker::new(MockProvider::new(COMPLIANT), config);
    assert!(matches!(result, Err(CheckerError::Config(_))));
}

#[tokio::test]
async fn test_negated_and_decorated_status_lines() {
    let facts: Vec<Item> = [
        "Report one was late",
        "Report two was late",
        "Report three was on time",
        "Report four was late",
        "Report five was on time",
    ]
    .iter()
    .enumerate()
    .map(|(i, text)| Item::fact(*text).with_id(i as i64 + 1))
    .collect();

    let mut llm = MockProvider::new(COMPLIANT);
    llm.respond_when(
        "Report one",
        "## 遵守状態\nnot compliant\n## 信頼度\n0.9\n## 説明\nLate.",
    );
    llm.respond_when(
        "Report two",
        "## 遵守状態\nnon compliant\n## 信頼度\n0.9\n## 説明\nLate.",
    );
    llm.respond_when(
        "Report three",
        "## 遵守状態\n**Compliant**\n## 信頼度\n0.9\n## 説明\nOn time.",
    );
    llm.respond_when(
        "Report four",
        "## 遵守状態\n**Not compliant**\n## 信頼度\n-0.5\n## 説明\nLate.",
    );
    llm.respond_when(
        "Report five",
        "## 遵守状態\n- Non-Compliant\n## 信頼度\n0.6\n## 説明\nSigned late.",
    );

    let checker = PairChecker::new(llm, CheckerConfig::default()).unwrap();
    let result = checker.check_pairs(&[weekly_condition()], &facts).await.unwrap();

    let statuses: Vec<_> = result.pair_results.iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        vec![
            ComplianceStatus::Unknown,
            ComplianceStatus::NonCompliant,
            ComplianceStatus::Compliant,
            ComplianceStatus::Unknown,
            ComplianceStatus::NonCompliant,
        ]
    );
    assert_eq!(result.pair_results[3].confidence, 0.0);
    assert_eq!(result.compliant_count(), 1);
    assert_eq!(result.overall_status, ComplianceStatus::NonCompliant);
}
