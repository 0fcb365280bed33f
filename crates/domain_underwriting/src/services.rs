//! Underwriting service
//!
//! [`UnderwritingService`] wires the pipeline together:
//!
//! ```text
//! record -> validate -> redact (audit) -> hard rules --declined--> resolver
//!                                              |
//!                                              +-> soft rules -> scorer <- predictor
//!                                                                  |
//!                                                                  v
//!                                                               resolver -> Decision
//! ```
//!
//! Everything the service holds is immutable after construction except the
//! model registry, which can be reloaded while evaluations are running.

use std::fmt;
use std::sync::Arc;

use core_kernel::{Clock, SystemClock};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::applicant::ApplicantRecord;
use crate::audit::AuditSink;
use crate::batch::BatchCoordinator;
use crate::config::{ModelSource, UnderwritingConfig};
use crate::decision::{Decision, DecisionResolver};
use crate::error::{ConfigurationError, DataError};
use crate::predictor::{ModelRegistry, RiskModelSnapshot};
use crate::redaction::{applicant_ref, redact};
use crate::risk_factors::{NearMissThresholds, RiskFactorEvaluator};
use crate::rules_engine::RuleEngine;
use crate::scoring::RiskScorer;

/// Entry point of the underwriting engine
pub struct UnderwritingService {
    config: UnderwritingConfig,
    rules: RuleEngine,
    risk_factors: RiskFactorEvaluator,
    scorer: RiskScorer,
    resolver: DecisionResolver,
    models: ModelRegistry,
    clock: Arc<dyn Clock>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl fmt::Debug for UnderwritingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnderwritingService")
            .field("rules", &self.rules.rule_names())
            .field("bands", self.resolver.bands())
            .field("model_version", &self.model_version())
            .finish_non_exhaustive()
    }
}

impl UnderwritingService {
    /// Builds a service from configuration
    ///
    /// Validates the configuration, builds the rule set and trains or loads
    /// the risk model.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if any section is invalid
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let service = UnderwritingService::new(UnderwritingConfig::default())?;
    /// let decision = service.evaluate(&record)?;
    /// println!("{} {:?}", decision.outcome, decision.reasons);
    /// ```
    pub fn new(config: UnderwritingConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let rules = RuleEngine::from_config(&config.rules)?;
        let risk_factors =
            RiskFactorEvaluator::new(NearMissThresholds::from(&config.rules), &config.soft_rules);
        let scorer = RiskScorer::new(config.scoring.clone());
        let resolver = DecisionResolver::new(config.bands, config.scoring.weak_ratio);
        let models = ModelRegistry::from_source(&config.model)?;

        info!(
            rules = ?rules.rule_names(),
            low = %config.bands.low,
            medium = %config.bands.medium,
            high = %config.bands.high,
            model_version = %models.snapshot().version(),
            "Underwriting service ready"
        );

        Ok(Self {
            config,
            rules,
            risk_factors,
            scorer,
            resolver,
            models,
            clock: Arc::new(SystemClock),
            audit: None,
        })
    }

    /// Replaces the clock used to stamp decisions
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reports every decision to `sink`
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Configuration the service was built from
    pub fn config(&self) -> &UnderwritingConfig {
        &self.config
    }

    /// Version of the currently installed model
    pub fn model_version(&self) -> String {
        self.models.snapshot().version().to_string()
    }

    /// Currently installed model snapshot
    pub fn model_snapshot(&self) -> Arc<RiskModelSnapshot> {
        self.models.snapshot()
    }

    /// Evaluates one application
    ///
    /// # Errors
    ///
    /// Returns a [`DataError`] if the record violates an invariant. Model
    /// failures are not errors; they produce an ML-degraded decision.
    pub fn evaluate(&self, record: &ApplicantRecord) -> Result<Decision, DataError> {
        let snapshot = self.models.snapshot();
        self.evaluate_with(record, &snapshot)
    }

    /// Evaluates applications independently, in input order
    ///
    /// One result per record; a bad record never affects the others. All
    /// records are evaluated against the same model snapshot.
    pub fn evaluate_batch(&self, records: &[ApplicantRecord]) -> Vec<Result<Decision, DataError>> {
        BatchCoordinator::new(self).run(records)
    }

    /// Like [`evaluate_batch`](Self::evaluate_batch) for records not yet
    /// deserialized; a value that is not an applicant yields
    /// [`DataError::Malformed`] for that position only
    pub fn evaluate_batch_values(&self, values: &[Value]) -> Vec<Result<Decision, DataError>> {
        BatchCoordinator::new(self).run_values(values)
    }

    /// Trains or loads a new model and swaps it in
    ///
    /// Evaluations already running finish on the previous model.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the new model cannot be built; the
    /// current model stays installed
    pub fn reload_model(&self, source: ModelSource) -> Result<(), ConfigurationError> {
        self.models.reload(&source)
    }

    /// Runs the pipeline against a fixed model snapshot
    pub(crate) fn evaluate_with(
        &self,
        record: &ApplicantRecord,
        snapshot: &RiskModelSnapshot,
    ) -> Result<Decision, DataError> {
        if let Err(error) = record.validate() {
            warn!(
                applicant_ref = %applicant_ref(&record.applicant_id),
                error = %error,
                "Applicant record rejected"
            );
            return Err(error);
        }

        let redacted = redact(record);
        let verdict = self.rules.evaluate(record);
        let timestamp = self.clock.now();

        let (resolution, score_breakdown, risk_factors, ml_degraded) = if verdict.declined {
            (self.resolver.resolve_declined(&verdict), None, Vec::new(), false)
        } else {
            let factors = self.risk_factors.evaluate(record);
            let scored = self.scorer.score(record, &factors, snapshot.predict(record));
            let resolution = self.resolver.resolve_scored(&scored, &factors);
            (resolution, Some(scored.breakdown), factors, scored.ml_degraded)
        };

        let decision = Decision {
            decision_id: Decision::derive_id(
                &record.applicant_id,
                timestamp,
                resolution.outcome,
                snapshot.version(),
            ),
            applicant_ref: redacted.applicant_ref.clone(),
            outcome: resolution.outcome,
            reasons: resolution.reasons,
            score_breakdown,
            risk_factors,
            conditions: resolution.conditions,
            exclusions: resolution.exclusions,
            risk_level: resolution.risk_level,
            ml_degraded,
            model_version: snapshot.version().to_string(),
            timestamp,
        };

        debug!(
            applicant_ref = %decision.applicant_ref,
            outcome = %decision.outcome,
            total_score = ?decision.score_breakdown.map(|b| b.total()),
            "Applicant evaluated"
        );

        if let Some(sink) = &self.audit {
            sink.record(&redacted, &decision);
        }
        Ok(decision)
    }
}
