//! Batch evaluation
//!
//! Records are evaluated in parallel on the rayon pool. Results come back in
//! input order, one per record. Failures stay with their record: a validation
//! error, a value that does not deserialize, or even a panic inside one
//! evaluation becomes that record's [`DataError`] and nothing else changes.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use core_kernel::BatchId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::applicant::ApplicantRecord;
use crate::decision::{Decision, Outcome};
use crate::error::DataError;
use crate::services::UnderwritingService;

/// Per-outcome counts for a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub approved: usize,
    pub approved_with_conditions: usize,
    pub referred: usize,
    pub declined: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[Result<Decision, DataError>]) -> Self {
        let mut summary = BatchSummary {
            total: results.len(),
            ..BatchSummary::default()
        };
        for result in results {
            match result {
                Ok(decision) => match decision.outcome {
                    Outcome::Approved => summary.approved += 1,
                    Outcome::ApprovedWithConditions => summary.approved_with_conditions += 1,
                    Outcome::ReferToManualReview => summary.referred += 1,
                    Outcome::Declined => summary.declined += 1,
                },
                Err(_) => summary.errors += 1,
            }
        }
        summary
    }
}

/// Fans a batch out over the rayon pool
#[derive(Debug, Clone, Copy)]
pub struct BatchCoordinator<'a> {
    service: &'a UnderwritingService,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(service: &'a UnderwritingService) -> Self {
        Self { service }
    }

    /// Evaluates typed records
    pub fn run(&self, records: &[ApplicantRecord]) -> Vec<Result<Decision, DataError>> {
        let batch_id = BatchId::new_v7();
        let snapshot = self.service.model_snapshot();

        let results: Vec<Result<Decision, DataError>> = records
            .par_iter()
            .map(|record| isolate(|| self.service.evaluate_with(record, &snapshot)))
            .collect();

        log_summary(batch_id, snapshot.version(), &results);
        results
    }

    /// Evaluates raw JSON values, deserializing each one independently
    pub fn run_values(&self, values: &[Value]) -> Vec<Result<Decision, DataError>> {
        let batch_id = BatchId::new_v7();
        let snapshot = self.service.model_snapshot();

        let results: Vec<Result<Decision, DataError>> = values
            .par_iter()
            .map(|value| {
                isolate(|| {
                    let record = parse_record(value)?;
                    self.service.evaluate_with(&record, &snapshot)
                })
            })
            .collect();

        log_summary(batch_id, snapshot.version(), &results);
        results
    }
}

/// Deserializes one applicant from a JSON value
///
/// # Errors
///
/// Returns [`DataError::Malformed`] when the value does not have the shape of
/// an applicant record
pub fn parse_record(value: &Value) -> Result<ApplicantRecord, DataError> {
    ApplicantRecord::deserialize(value).map_err(|e| DataError::Malformed(e.to_string()))
}

/// Runs one evaluation, turning a panic into that record's error
fn isolate<F>(evaluate: F) -> Result<Decision, DataError>
where
    F: FnOnce() -> Result<Decision, DataError>,
{
    panic::catch_unwind(AssertUnwindSafe(evaluate))
        .unwrap_or_else(|payload| Err(DataError::EvaluationPanicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn log_summary(batch_id: BatchId, model_version: &str, results: &[Result<Decision, DataError>]) {
    let summary = BatchSummary::from_results(results);
    info!(
        batch_id = %batch_id,
        model_version = %model_version,
        total = summary.total,
        approved = summary.approved,
        approved_with_conditions = summary.approved_with_conditions,
        referred = summary.referred,
        declined = summary.declined,
        errors = summary.errors,
        "Batch evaluated"
    );
}
