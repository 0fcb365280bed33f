//! Decision resolution
//!
//! The resolver turns the rule verdict and the composite score into one of
//! four outcomes:
//!
//! | Hard rule fired? | Composite score      | Outcome                  |
//! |------------------|----------------------|--------------------------|
//! | yes              | not computed         | DECLINED                 |
//! | no               | `>= high`            | APPROVED                 |
//! | no               | `medium ..< high`    | APPROVED_WITH_CONDITIONS |
//! | no               | `low ..< medium`     | REFER_TO_MANUAL_REVIEW   |
//! | no               | `< low`              | DECLINED                 |
//!
//! Reasons are machine-readable names. A hard decline lists exactly the rules
//! that fired; a score decision names its band and, unless approved, the
//! sub-scores that pulled it down.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use core_kernel::DecisionId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::DecisionBands;
use crate::risk_factors::{exclusions_for, RiskFactor};
use crate::rules_engine::RuleVerdict;
use crate::scoring::{ScoreBreakdown, ScoreComponent, ScoredApplicant};

/// Reason added when the risk model could not be consulted
pub const ML_UNAVAILABLE_REASON: &str = "ml_model_unavailable";

/// Condition attached to a conditional approval with no weak component
pub const DEFAULT_CONDITION: &str = "Annual policy review required";

/// Final underwriting outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Approved,
    ApprovedWithConditions,
    Declined,
    ReferToManualReview,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Approved => "APPROVED",
            Outcome::ApprovedWithConditions => "APPROVED_WITH_CONDITIONS",
            Outcome::Declined => "DECLINED",
            Outcome::ReferToManualReview => "REFER_TO_MANUAL_REVIEW",
        }
    }

    /// Position on the favourability scale, 0 (declined) to 3 (approved)
    pub fn rank(&self) -> u8 {
        match self {
            Outcome::Declined => 0,
            Outcome::ReferToManualReview => 1,
            Outcome::ApprovedWithConditions => 2,
            Outcome::Approved => 3,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse risk classification reported with each decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Score band a composite score falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Approved,
    Conditional,
    ManualReview,
    BelowMinimum,
}

impl ScoreBand {
    /// Locates `total` within `bands`
    pub fn classify(total: Decimal, bands: &DecisionBands) -> Self {
        if total >= bands.high {
            ScoreBand::Approved
        } else if total >= bands.medium {
            ScoreBand::Conditional
        } else if total >= bands.low {
            ScoreBand::ManualReview
        } else {
            ScoreBand::BelowMinimum
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            ScoreBand::Approved => Outcome::Approved,
            ScoreBand::Conditional => Outcome::ApprovedWithConditions,
            ScoreBand::ManualReview => Outcome::ReferToManualReview,
            ScoreBand::BelowMinimum => Outcome::Declined,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ScoreBand::Approved => "composite_score_approved",
            ScoreBand::Conditional => "composite_score_conditional",
            ScoreBand::ManualReview => "composite_score_manual_review",
            ScoreBand::BelowMinimum => "composite_score_below_minimum",
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            ScoreBand::Approved => RiskLevel::Low,
            ScoreBand::Conditional => RiskLevel::Medium,
            ScoreBand::ManualReview => RiskLevel::High,
            ScoreBand::BelowMinimum => RiskLevel::VeryHigh,
        }
    }
}

/// Outcome and its explanation, before identity and time are attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub reasons: Vec<String>,
    pub conditions: Vec<String>,
    pub exclusions: Vec<String>,
    pub risk_level: RiskLevel,
}

/// Final decision for one applicant
///
/// Created once per evaluation and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: DecisionId,
    /// Redacted applicant reference
    pub applicant_ref: String,
    pub outcome: Outcome,
    pub reasons: Vec<String>,
    /// Absent when a hard rule declined the application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_breakdown: Option<ScoreBreakdown>,
    pub risk_factors: Vec<RiskFactor>,
    pub conditions: Vec<String>,
    pub exclusions: Vec<String>,
    pub risk_level: RiskLevel,
    pub ml_degraded: bool,
    pub model_version: String,
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    /// Reproducible id for a decision
    ///
    /// Derived from the applicant, the decision time, the outcome and the
    /// model version, so replaying an evaluation yields the same id.
    pub fn derive_id(
        applicant_id: &str,
        timestamp: DateTime<Utc>,
        outcome: Outcome,
        model_version: &str,
    ) -> DecisionId {
        let name = format!(
            "{}|{}|{}|{}",
            applicant_id,
            timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            outcome.as_str(),
            model_version
        );
        DecisionId::from_name(name.as_bytes())
    }

    pub fn is_approved(&self) -> bool {
        matches!(
            self.outcome,
            Outcome::Approved | Outcome::ApprovedWithConditions
        )
    }
}

/// Maps rule verdicts and scores to outcomes
#[derive(Debug, Clone)]
pub struct DecisionResolver {
    bands: DecisionBands,
    weak_ratio: Decimal,
}

impl DecisionResolver {
    pub fn new(bands: DecisionBands, weak_ratio: Decimal) -> Self {
        Self { bands, weak_ratio }
    }

    pub fn bands(&self) -> &DecisionBands {
        &self.bands
    }

    /// Decision for an application declined by the hard rules
    pub fn resolve_declined(&self, verdict: &RuleVerdict) -> Resolution {
        Resolution {
            outcome: Outcome::Declined,
            reasons: verdict.triggered_rules.clone(),
            conditions: Vec::new(),
            exclusions: Vec::new(),
            risk_level: RiskLevel::VeryHigh,
        }
    }

    /// Decision for a scored application
    ///
    /// # Arguments
    ///
    /// * `scored` - composite score and degradation flag
    /// * `risk_factors` - fired soft rules, the source of exclusions
    pub fn resolve_scored(&self, scored: &ScoredApplicant, risk_factors: &[RiskFactor]) -> Resolution {
        let breakdown = &scored.breakdown;
        let band = ScoreBand::classify(breakdown.total(), &self.bands);
        let outcome = band.outcome();

        let weak = breakdown.weak_components(self.weak_ratio);
        let mut reasons = vec![band.reason().to_string()];
        if outcome != Outcome::Approved {
            reasons.extend(explain_shortfall(breakdown, &weak).map(|c| c.weak_reason().to_string()));
        }
        if scored.ml_degraded {
            reasons.push(ML_UNAVAILABLE_REASON.to_string());
        }

        let (conditions, exclusions) = if outcome == Outcome::ApprovedWithConditions {
            let conditions = if weak.is_empty() {
                vec![DEFAULT_CONDITION.to_string()]
            } else {
                weak.iter().map(|c| c.condition().to_string()).collect()
            };
            (conditions, exclusions_for(risk_factors))
        } else {
            (Vec::new(), Vec::new())
        };

        Resolution {
            outcome,
            reasons,
            conditions,
            exclusions,
            risk_level: band.risk_level(),
        }
    }
}

/// Weak components, or the single largest shortfall when none is weak
fn explain_shortfall<'a>(
    breakdown: &ScoreBreakdown,
    weak: &'a [ScoreComponent],
) -> impl Iterator<Item = ScoreComponent> + 'a {
    let fallback = if weak.is_empty() {
        breakdown.largest_shortfall()
    } else {
        None
    };
    weak.iter().copied().chain(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk_factors::SoftRuleKind;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn resolver() -> DecisionResolver {
        DecisionResolver::new(DecisionBands::default(), dec!(0.6))
    }

    fn scored(breakdown: ScoreBreakdown, ml_degraded: bool) -> ScoredApplicant {
        ScoredApplicant {
            breakdown,
            high_risk: 0.2,
            ml_degraded,
        }
    }

    #[test]
    fn test_band_edges() {
        let bands = DecisionBands::default();
        assert_eq!(ScoreBand::classify(dec!(75), &bands), ScoreBand::Approved);
        assert_eq!(ScoreBand::classify(dec!(74.99), &bands), ScoreBand::Conditional);
        assert_eq!(ScoreBand::classify(dec!(50), &bands), ScoreBand::Conditional);
        assert_eq!(ScoreBand::classify(dec!(49.99), &bands), ScoreBand::ManualReview);
        assert_eq!(ScoreBand::classify(dec!(30), &bands), ScoreBand::ManualReview);
        assert_eq!(ScoreBand::classify(dec!(29.99), &bands), ScoreBand::BelowMinimum);
    }

    #[test]
    fn test_rule_decline_reasons_are_exactly_the_rules() {
        let verdict = RuleVerdict {
            declined: true,
            triggered_rules: vec!["dui_or_dwi_history".to_string()],
        };
        let resolution = resolver().resolve_declined(&verdict);
        assert_eq!(resolution.outcome, Outcome::Declined);
        assert_eq!(resolution.reasons, vec!["dui_or_dwi_history"]);
        assert_eq!(resolution.risk_level, RiskLevel::VeryHigh);
    }

    #[test]
    fn test_approved_has_only_band_reason() {
        let breakdown = ScoreBreakdown::new(dec!(28), dec!(20), dec!(10), dec!(25), dec!(12));
        let resolution = resolver().resolve_scored(&scored(breakdown, false), &[]);
        assert_eq!(resolution.outcome, Outcome::Approved);
        assert_eq!(resolution.reasons, vec!["composite_score_approved"]);
        assert!(resolution.conditions.is_empty());
        assert_eq!(resolution.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_conditional_lists_weak_components_and_conditions() {
        // 6 + 8 + 10 + 25 + 12 = 61
        let breakdown = ScoreBreakdown::new(dec!(6), dec!(8), dec!(10), dec!(25), dec!(12));
        let factors = vec![RiskFactor {
            kind: SoftRuleKind::FloodZone,
            penalty: dec!(0),
        }];
        let resolution = resolver().resolve_scored(&scored(breakdown, false), &factors);

        assert_eq!(resolution.outcome, Outcome::ApprovedWithConditions);
        assert_eq!(
            resolution.reasons,
            vec!["composite_score_conditional", "weak_credit", "weak_claims"]
        );
        assert_eq!(
            resolution.conditions,
            vec![
                "Premium payment plan restrictions due to credit history",
                "Higher deductible due to claims history",
            ]
        );
        assert_eq!(
            resolution.exclusions,
            vec!["Flood damage excluded (separate flood insurance required)"]
        );
        assert_eq!(resolution.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_conditional_without_weak_component() {
        // 20 + 12 + 10 + 15 + 9 = 66, nothing under 60% of its cap
        let breakdown = ScoreBreakdown::new(dec!(20), dec!(12), dec!(10), dec!(15), dec!(9));
        let resolution = resolver().resolve_scored(&scored(breakdown, false), &[]);
        assert_eq!(resolution.outcome, Outcome::ApprovedWithConditions);
        // credit and rules are both 10 short; the earlier component wins
        assert_eq!(resolution.reasons, vec!["composite_score_conditional", "weak_credit"]);
        assert_eq!(resolution.conditions, vec![DEFAULT_CONDITION]);
    }

    #[test]
    fn test_score_decline_and_degraded_reason() {
        let breakdown = ScoreBreakdown::new(dec!(0), dec!(0), dec!(10), dec!(5), dec!(7.5));
        let resolution = resolver().resolve_scored(&scored(breakdown, true), &[]);
        assert_eq!(resolution.outcome, Outcome::Declined);
        assert_eq!(
            resolution.reasons,
            vec![
                "composite_score_below_minimum",
                "weak_credit",
                "weak_claims",
                "weak_rules",
                "weak_ml",
                "ml_model_unavailable",
            ]
        );
        assert_eq!(resolution.risk_level, RiskLevel::VeryHigh);
        assert!(resolution.conditions.is_empty());
    }

    #[test]
    fn test_review_band() {
        let breakdown = ScoreBreakdown::new(dec!(10), dec!(10), dec!(10), dec!(5), dec!(5));
        let resolution = resolver().resolve_scored(&scored(breakdown, false), &[]);
        assert_eq!(resolution.outcome, Outcome::ReferToManualReview);
        assert_eq!(resolution.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_string(&Outcome::ApprovedWithConditions).unwrap(),
            "\"APPROVED_WITH_CONDITIONS\""
        );
        assert_eq!(serde_json::to_string(&RiskLevel::VeryHigh).unwrap(), "\"very_high\"");
    }

    #[test]
    fn test_derived_id_is_reproducible() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
        let a = Decision::derive_id("APP-1", at, Outcome::Approved, "tree-v1-seed42-n1000");
        let b = Decision::derive_id("APP-1", at, Outcome::Approved, "tree-v1-seed42-n1000");
        let c = Decision::derive_id("APP-1", at, Outcome::Declined, "tree-v1-seed42-n1000");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_outcome_rank_order() {
        assert!(Outcome::Declined.rank() < Outcome::ReferToManualReview.rank());
        assert!(Outcome::ReferToManualReview.rank() < Outcome::ApprovedWithConditions.rank());
        assert!(Outcome::ApprovedWithConditions.rank() < Outcome::Approved.rank());
    }
}
