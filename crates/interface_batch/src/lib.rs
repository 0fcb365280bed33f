//! Batch Runner
//!
//! Reads a JSON array of insurance applications, evaluates them as one batch
//! and writes one result line per application.
//!
//! # Output
//!
//! Each element of the input array produces exactly one element of the
//! output array, in the same position:
//!
//! ```json
//! [
//!   {"index": 0, "applicant_ref": "3f2a9c0d41be", "decision": { ... }},
//!   {"index": 1, "applicant_ref": null, "error": "Malformed applicant record: ..."}
//! ]
//! ```
//!
//! Per-record failures never change the exit status; only configuration and
//! input failures do.

pub mod cli;
pub mod config;
pub mod error;

use std::io::Read;

use domain_underwriting::redaction::applicant_ref;
use domain_underwriting::{DataError, Decision};
use serde::Serialize;
use serde_json::Value;

pub use crate::cli::Cli;
pub use crate::config::AppConfig;
pub use crate::error::InputError;

/// Result for one input record
#[derive(Debug, Clone, Serialize)]
pub struct BatchLine {
    pub index: usize,
    /// Redacted reference of the applicant, when one could be read
    pub applicant_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reads the input document, which must be a JSON array
pub fn read_applications<R: Read>(reader: R) -> Result<Vec<Value>, InputError> {
    match serde_json::from_reader(reader)? {
        Value::Array(values) => Ok(values),
        other => Err(InputError::NotAnArray(json_kind(&other))),
    }
}

/// Pairs every input value with its evaluation result
pub fn build_report(values: &[Value], results: Vec<Result<Decision, DataError>>) -> Vec<BatchLine> {
    values
        .iter()
        .zip(results)
        .enumerate()
        .map(|(index, (value, result))| match result {
            Ok(decision) => BatchLine {
                index,
                applicant_ref: Some(decision.applicant_ref.clone()),
                decision: Some(decision),
                error: None,
            },
            Err(err) => BatchLine {
                index,
                applicant_ref: value
                    .get("applicant_id")
                    .and_then(Value::as_str)
                    .map(applicant_ref),
                decision: None,
                error: Some(err.to_string()),
            },
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_applications_requires_array() {
        assert_eq!(read_applications("[]".as_bytes()).unwrap(), Vec::<Value>::new());
        assert!(matches!(
            read_applications(r#"{"applicant_id": "x"}"#.as_bytes()),
            Err(InputError::NotAnArray("object"))
        ));
        assert!(matches!(
            read_applications("[1, 2".as_bytes()),
            Err(InputError::Json(_))
        ));
    }

    #[test]
    fn test_error_lines_carry_redacted_ref() {
        let values = vec![serde_json::json!({"applicant_id": "APP-9", "age": "old"})];
        let lines = build_report(&values, vec![Err(DataError::Malformed("bad age".into()))]);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].applicant_ref.as_deref(), Some(applicant_ref("APP-9").as_str()));
        assert_ne!(lines[0].applicant_ref.as_deref(), Some("APP-9"));

        let json = serde_json::to_value(&lines[0]).unwrap();
        assert!(json.get("decision").is_none());
        assert_eq!(json["error"], "Malformed applicant record: bad age");
    }
}
