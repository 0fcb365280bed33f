//! Batch Evaluation Tests
//!
//! # Test Coverage
//!
//! - One result per input, in input order
//! - Invalid and malformed records isolated to their own slot
//! - Batch results identical to individual evaluation
//! - Outcome summary counts

use domain_underwriting::{BatchSummary, DataError, Outcome};
use serde_json::{json, Value};
use test_utils::{ApplicantFixtures, ApplicantRecordBuilder, ConfigFixtures};

#[test]
fn test_invalid_record_does_not_abort_batch() {
    let service = ConfigFixtures::default_service();
    let records: Vec<_> = (0..5)
        .map(|i| {
            let builder = ApplicantRecordBuilder::new().with_id(format!("APP-BATCH-{}", i));
            if i == 2 {
                builder.with_age(130).build()
            } else {
                builder.build()
            }
        })
        .collect();

    let results = service.evaluate_batch(&records);

    assert_eq!(results.len(), 5);
    for (i, result) in results.iter().enumerate() {
        if i == 2 {
            assert_eq!(result.as_ref().unwrap_err().field(), Some("age"));
        } else {
            let decision = result.as_ref().unwrap();
            assert_eq!(decision.outcome, Outcome::Approved);
        }
    }
}

#[test]
fn test_batch_matches_individual_evaluation() {
    let service = ConfigFixtures::default_service();
    let records = vec![
        ApplicantFixtures::clean_auto(),
        ApplicantFixtures::dui_auto(),
        ApplicantFixtures::poor_credit(),
        ApplicantFixtures::fraud_flagged(),
        ApplicantFixtures::sound_home(),
        ApplicantFixtures::risky_home(),
        ApplicantFixtures::smoker_health(),
        ApplicantFixtures::invalid_age(),
    ];

    let batch = service.evaluate_batch(&records);
    let individual: Vec<_> = records.iter().map(|r| service.evaluate(r)).collect();

    assert_eq!(batch, individual);
}

#[test]
fn test_malformed_values_are_isolated() {
    let service = ConfigFixtures::default_service();
    let valid = serde_json::to_value(ApplicantFixtures::clean_auto()).unwrap();
    let values: Vec<Value> = vec![
        valid.clone(),
        json!(42),
        json!({ "applicant_id": "APP-PARTIAL", "name": "Half Record" }),
        valid,
    ];

    let results = service.evaluate_batch_values(&values);

    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(DataError::Malformed(_))));
    assert!(matches!(results[2], Err(DataError::Malformed(_))));
    assert_eq!(results[3], results[0]);
}

#[test]
fn test_empty_batch() {
    let service = ConfigFixtures::default_service();
    assert!(service.evaluate_batch(&[]).is_empty());
    assert!(service.evaluate_batch_values(&[]).is_empty());
}

#[test]
fn test_summary_counts_outcomes() {
    let service = ConfigFixtures::service(ConfigFixtures::without_model());
    let records = vec![
        ApplicantFixtures::clean_auto(),
        ApplicantFixtures::smoker_health(),
        ApplicantFixtures::risky_home(),
        ApplicantFixtures::dui_auto(),
        ApplicantFixtures::fraud_flagged(),
        ApplicantFixtures::invalid_age(),
    ];

    let summary = BatchSummary::from_results(&service.evaluate_batch(&records));

    assert_eq!(
        summary,
        BatchSummary {
            total: 6,
            approved: 1,
            approved_with_conditions: 1,
            referred: 1,
            declined: 2,
            errors: 1,
        }
    );
}
