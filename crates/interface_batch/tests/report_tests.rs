//! Batch Report Tests
//!
//! Runs a mixed input document through the same steps as the `underwrite`
//! binary and checks the shape of the output.

use interface_batch::{build_report, read_applications};
use serde_json::Value;
use test_utils::{ApplicantFixtures, ConfigFixtures};

fn input_document() -> String {
    let values = vec![
        serde_json::to_value(ApplicantFixtures::clean_auto()).unwrap(),
        serde_json::json!("not an application"),
        serde_json::to_value(ApplicantFixtures::dui_auto()).unwrap(),
        serde_json::to_value(ApplicantFixtures::invalid_age()).unwrap(),
    ];
    serde_json::to_string(&values).unwrap()
}

#[test]
fn test_report_has_one_line_per_input() {
    let service = ConfigFixtures::default_service();
    let document = input_document();
    let values = read_applications(document.as_bytes()).unwrap();

    let report = build_report(&values, service.evaluate_batch_values(&values));

    assert_eq!(report.len(), 4);
    let indices: Vec<usize> = report.iter().map(|line| line.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);

    assert!(report[0].decision.is_some());
    assert!(report[1].error.as_deref().unwrap().starts_with("Malformed"));
    assert_eq!(
        report[2].decision.as_ref().unwrap().reasons,
        vec!["dui_or_dwi_history"]
    );
    assert!(report[3].error.as_deref().unwrap().contains("age"));
    assert!(report[3].applicant_ref.is_some());
}

#[test]
fn test_report_output_is_redacted() {
    let service = ConfigFixtures::default_service();
    let document = input_document();
    let values = read_applications(document.as_bytes()).unwrap();
    let report = build_report(&values, service.evaluate_batch_values(&values));

    let output = serde_json::to_string(&report).unwrap();
    for secret in ["APP-2025-001", "APP-2025-002", "APP-2025-008", "John Smith", "Jane Doe"] {
        assert!(!output.contains(secret), "report leaks {}", secret);
    }

    let parsed: Vec<Value> = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed[0]["decision"]["outcome"], "APPROVED");
    assert!(parsed[1].get("decision").is_none());
}
