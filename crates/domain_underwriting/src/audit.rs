//! Audit port
//!
//! Every evaluation can be reported to an [`AuditSink`]. The sink only ever
//! sees the [`RedactedApplicant`] projection, never the raw record, so an
//! adapter cannot leak identity even if it writes everything it receives.
//!
//! Two adapters ship with the crate:
//!
//! - [`TracingAuditSink`] emits one structured `tracing` event per decision
//! - [`InMemoryAuditSink`] keeps entries in memory for tests and tooling
//!
//! # Usage
//!
//! ```rust,ignore
//! let service = UnderwritingService::new(config)?
//!     .with_audit_sink(Arc::new(TracingAuditSink));
//! ```

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::decision::{Decision, Outcome, RiskLevel};
use crate::redaction::RedactedApplicant;

/// Destination for redacted evaluation records
pub trait AuditSink: Send + Sync {
    /// Records one decision
    fn record(&self, applicant: &RedactedApplicant, decision: &Decision);
}

/// Audit entry as retained by [`InMemoryAuditSink`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub applicant: RedactedApplicant,
    pub decision_id: String,
    pub outcome: Outcome,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
    pub model_version: String,
}

impl AuditEntry {
    pub fn new(applicant: &RedactedApplicant, decision: &Decision) -> Self {
        Self {
            applicant: applicant.clone(),
            decision_id: decision.decision_id.to_string(),
            outcome: decision.outcome,
            risk_level: decision.risk_level,
            reasons: decision.reasons.clone(),
            model_version: decision.model_version.clone(),
        }
    }
}

/// Writes audit records as `tracing` events on the `underwriting::audit` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, applicant: &RedactedApplicant, decision: &Decision) {
        info!(
            target: "underwriting::audit",
            decision_id = %decision.decision_id,
            applicant_ref = %applicant.applicant_ref,
            insurance_type = applicant.insurance_type.as_str(),
            age_band = %applicant.age_band,
            outcome = %decision.outcome,
            total_score = ?decision.score_breakdown.map(|b| b.total()),
            ml_degraded = decision.ml_degraded,
            model_version = %decision.model_version,
            reasons = ?decision.reasons,
            "Underwriting decision"
        );
    }
}

/// Collects audit entries in memory
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the entries recorded so far
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, applicant: &RedactedApplicant, decision: &Decision) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AuditEntry::new(applicant, decision));
    }
}
