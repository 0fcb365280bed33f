//! Underwriting Decision Engine
//!
//! This crate turns an insurance application into one of four outcomes:
//! approved, approved with conditions, referred to manual review, or
//! declined. It combines hard auto-decline rules, a weighted multi-factor
//! risk score and a trained risk model, and explains every decision with
//! machine-readable reasons.
//!
//! # Architecture
//!
//! The engine is pure and infrastructure-agnostic:
//! - **Rule Engine**: ordered hard rules that decline outright
//! - **Risk Factors**: soft rules that cost score points and add exclusions
//! - **Risk Scorer**: five capped sub-scores summing to a 0-100 score
//! - **Risk Predictor**: decision tree behind a hot-swappable model registry
//! - **Decision Resolver**: score bands, reasons, conditions and risk level
//! - **Batch Coordinator**: parallel evaluation with per-record isolation
//! - **Redaction**: the only view of the applicant that reaches logs
//!
//! # Decision Flow
//!
//! ```text
//! ApplicantRecord -> validate -> hard rules -> DECLINED
//!                                    \-> soft rules + model -> score -> band -> outcome
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_underwriting::{UnderwritingConfig, UnderwritingService, Outcome};
//!
//! let service = UnderwritingService::new(UnderwritingConfig::default())?;
//! let decision = service.evaluate(&application)?;
//! if decision.outcome == Outcome::ApprovedWithConditions {
//!     println!("conditions: {:?}", decision.conditions);
//! }
//! ```

pub mod applicant;
pub mod audit;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod decision;
pub mod error;
pub mod model;
pub mod predictor;
pub mod redaction;
pub mod risk_factors;
pub mod rules_engine;
pub mod scoring;
pub mod services;

#[cfg(test)]
mod test_support;

pub use applicant::{
    ApplicantRecord, ClaimsHistory, ConstructionType, DrivingRecord, EmploymentStatus,
    InsuranceType, PropertyInfo,
};
pub use audit::{AuditEntry, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use batch::{BatchCoordinator, BatchSummary};
pub use config::{
    AgeBand, DecisionBands, HardRuleConfig, ModelSource, ScoringConfig, SoftRuleConfig,
    TrainingParams, UnderwritingConfig,
};
pub use decision::{Decision, DecisionResolver, Outcome, RiskLevel};
pub use error::{ConfigurationError, DataError, ModelError};
pub use model::{DecisionTree, TreeNode, TreeTrainer};
pub use predictor::{ModelRegistry, Prediction, RiskModelSnapshot};
pub use redaction::{redact, RedactedApplicant};
pub use risk_factors::{RiskFactor, SoftRuleKind};
pub use rules_engine::{HardRuleId, RuleEngine, RulePredicate, RuleVerdict};
pub use scoring::{RiskScorer, ScoreBreakdown, ScoreComponent};
pub use services::UnderwritingService;
