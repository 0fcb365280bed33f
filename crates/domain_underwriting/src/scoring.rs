//! Composite risk score
//!
//! The score is the sum of five sub-scores, each saturating at its cap:
//!
//! | Component | Cap | Source |
//! |-----------|-----|--------|
//! | credit    | 30  | credit score on a linear scale |
//! | claims    | 20  | recent claims and amount claimed |
//! | age       | 10  | configured age bands |
//! | rules     | 25  | minus the penalties of fired soft rules |
//! | ml        | 15  | risk model, `15 * (1 - p_high)` |
//!
//! Higher is better. Every sub-score is clamped to `[0, cap]` and rounded to
//! two decimal places before the total is taken, so the total is exactly the
//! sum of the published parts.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::applicant::{ApplicantRecord, ClaimsHistory};
use crate::config::ScoringConfig;
use crate::error::ModelError;
use crate::predictor::{Prediction, NEUTRAL_HIGH_RISK};
use crate::risk_factors::RiskFactor;

pub const CREDIT_CAP: Decimal = dec!(30);
pub const CLAIMS_CAP: Decimal = dec!(20);
pub const AGE_CAP: Decimal = dec!(10);
pub const RULES_CAP: Decimal = dec!(25);
pub const ML_CAP: Decimal = dec!(15);
/// Sum of all caps
pub const MAX_TOTAL: Decimal = dec!(100);

const SCORE_DP: u32 = 2;

/// One of the five sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponent {
    Credit,
    Claims,
    Age,
    Rules,
    Ml,
}

impl ScoreComponent {
    pub const ALL: [ScoreComponent; 5] = [
        ScoreComponent::Credit,
        ScoreComponent::Claims,
        ScoreComponent::Age,
        ScoreComponent::Rules,
        ScoreComponent::Ml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreComponent::Credit => "credit",
            ScoreComponent::Claims => "claims",
            ScoreComponent::Age => "age",
            ScoreComponent::Rules => "rules",
            ScoreComponent::Ml => "ml",
        }
    }

    /// Maximum points for the component
    pub fn cap(&self) -> Decimal {
        match self {
            ScoreComponent::Credit => CREDIT_CAP,
            ScoreComponent::Claims => CLAIMS_CAP,
            ScoreComponent::Age => AGE_CAP,
            ScoreComponent::Rules => RULES_CAP,
            ScoreComponent::Ml => ML_CAP,
        }
    }

    /// Reason name used when the component is weak
    pub fn weak_reason(&self) -> &'static str {
        match self {
            ScoreComponent::Credit => "weak_credit",
            ScoreComponent::Claims => "weak_claims",
            ScoreComponent::Age => "weak_age",
            ScoreComponent::Rules => "weak_rules",
            ScoreComponent::Ml => "weak_ml",
        }
    }

    /// Policy condition imposed on a conditional approval when the component is weak
    pub fn condition(&self) -> &'static str {
        match self {
            ScoreComponent::Credit => "Premium payment plan restrictions due to credit history",
            ScoreComponent::Claims => "Higher deductible due to claims history",
            ScoreComponent::Age => "Annual policy review due to applicant age band",
            ScoreComponent::Rules => "Six-month policy review due to identified risk factors",
            ScoreComponent::Ml => "Additional documentation required annually",
        }
    }
}

impl fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-component scores and their total
///
/// Only [`ScoreBreakdown::new`] builds one, so every instance is clamped,
/// rounded and sums to its total. Deserialization rejects documents that
/// break either property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BreakdownParts")]
pub struct ScoreBreakdown {
    credit: Decimal,
    claims: Decimal,
    age: Decimal,
    rules: Decimal,
    ml: Decimal,
    total: Decimal,
}

/// Wire form of a breakdown, checked before it becomes a [`ScoreBreakdown`]
#[derive(Deserialize)]
struct BreakdownParts {
    credit: Decimal,
    claims: Decimal,
    age: Decimal,
    rules: Decimal,
    ml: Decimal,
    total: Decimal,
}

impl TryFrom<BreakdownParts> for ScoreBreakdown {
    type Error = String;

    fn try_from(parts: BreakdownParts) -> Result<Self, Self::Error> {
        let rebuilt = ScoreBreakdown::new(parts.credit, parts.claims, parts.age, parts.rules, parts.ml);
        let as_sent = ScoreBreakdown {
            credit: parts.credit,
            claims: parts.claims,
            age: parts.age,
            rules: parts.rules,
            ml: parts.ml,
            total: parts.total,
        };
        if rebuilt == as_sent {
            Ok(rebuilt)
        } else {
            Err(format!(
                "inconsistent score breakdown (expected total {}, got {})",
                rebuilt.total, parts.total
            ))
        }
    }
}

impl ScoreBreakdown {
    /// Assembles a breakdown, clamping and rounding each part
    pub fn new(credit: Decimal, claims: Decimal, age: Decimal, rules: Decimal, ml: Decimal) -> Self {
        let credit = saturate(credit, CREDIT_CAP);
        let claims = saturate(claims, CLAIMS_CAP);
        let age = saturate(age, AGE_CAP);
        let rules = saturate(rules, RULES_CAP);
        let ml = saturate(ml, ML_CAP);
        Self {
            credit,
            claims,
            age,
            rules,
            ml,
            total: credit + claims + age + rules + ml,
        }
    }

    pub fn credit(&self) -> Decimal {
        self.credit
    }

    pub fn claims(&self) -> Decimal {
        self.claims
    }

    pub fn age(&self) -> Decimal {
        self.age
    }

    pub fn rules(&self) -> Decimal {
        self.rules
    }

    pub fn ml(&self) -> Decimal {
        self.ml
    }

    /// Composite score, the exact sum of the five components
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn component(&self, component: ScoreComponent) -> Decimal {
        match component {
            ScoreComponent::Credit => self.credit,
            ScoreComponent::Claims => self.claims,
            ScoreComponent::Age => self.age,
            ScoreComponent::Rules => self.rules,
            ScoreComponent::Ml => self.ml,
        }
    }

    /// Points missing from the component's cap
    pub fn shortfall(&self, component: ScoreComponent) -> Decimal {
        component.cap() - self.component(component)
    }

    /// Components scoring below `weak_ratio` of their cap, largest shortfall first
    ///
    /// Ties keep component order.
    pub fn weak_components(&self, weak_ratio: Decimal) -> Vec<ScoreComponent> {
        let mut weak: Vec<ScoreComponent> = ScoreComponent::ALL
            .into_iter()
            .filter(|c| self.component(*c) < c.cap() * weak_ratio)
            .collect();
        weak.sort_by(|a, b| self.shortfall(*b).cmp(&self.shortfall(*a)));
        weak
    }

    /// Component with the largest shortfall, if any component is below its cap
    pub fn largest_shortfall(&self) -> Option<ScoreComponent> {
        let mut largest: Option<ScoreComponent> = None;
        for component in ScoreComponent::ALL {
            let shortfall = self.shortfall(component);
            if shortfall > Decimal::ZERO
                && largest.map_or(true, |current| shortfall > self.shortfall(current))
            {
                largest = Some(component);
            }
        }
        largest
    }
}

fn saturate(value: Decimal, cap: Decimal) -> Decimal {
    value
        .max(Decimal::ZERO)
        .min(cap)
        .round_dp_with_strategy(SCORE_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Score for one applicant plus whether the model fallback was used
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredApplicant {
    pub breakdown: ScoreBreakdown,
    /// High-risk probability that went into the ml component
    pub high_risk: f64,
    /// Set when the neutral probability replaced a model prediction
    pub ml_degraded: bool,
}

/// Computes the composite score from configured curves
#[derive(Debug, Clone)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores an applicant that passed the hard rules
    ///
    /// A model error never fails scoring: the neutral probability is used and
    /// the result is flagged as degraded.
    ///
    /// # Arguments
    ///
    /// * `record` - validated applicant
    /// * `risk_factors` - soft rules that fired for the applicant
    /// * `prediction` - risk model output for the applicant
    pub fn score(
        &self,
        record: &ApplicantRecord,
        risk_factors: &[RiskFactor],
        prediction: Result<Prediction, ModelError>,
    ) -> ScoredApplicant {
        let (high_risk, ml_degraded) = match prediction {
            Ok(prediction) => (prediction.high_risk, false),
            Err(error) => {
                warn!(error = %error, "Risk model unavailable, using neutral probability");
                (NEUTRAL_HIGH_RISK, true)
            }
        };

        let breakdown = ScoreBreakdown::new(
            self.credit_points(record.credit_score),
            self.claims_points(&record.claims_history, record.coverage_amount),
            self.age_points(record.age),
            self.rules_points(risk_factors),
            self.ml_points(high_risk),
        );

        ScoredApplicant {
            breakdown,
            high_risk,
            ml_degraded,
        }
    }

    /// Linear in the credit score between the configured floor and ceiling
    pub fn credit_points(&self, credit_score: i32) -> Decimal {
        let floor = Decimal::from(self.config.credit_floor);
        let span = Decimal::from(self.config.credit_ceiling) - floor;
        if span <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let position = ((Decimal::from(credit_score) - floor) / span)
            .max(Decimal::ZERO)
            .min(Decimal::ONE);
        position * CREDIT_CAP
    }

    pub fn claims_points(&self, claims: &ClaimsHistory, coverage_amount: Decimal) -> Decimal {
        let claimed_ratio = if coverage_amount > Decimal::ZERO {
            claims
                .total_claimed_amount
                .checked_div(coverage_amount)
                .map_or(Decimal::ONE, |ratio| ratio.min(Decimal::ONE))
        } else {
            Decimal::ONE
        };
        let recent = self
            .config
            .points_per_recent_claim
            .saturating_mul(Decimal::from(claims.claims_last_3_years));
        let severity = self.config.claimed_amount_weight.saturating_mul(claimed_ratio);
        CLAIMS_CAP
            .saturating_sub(recent)
            .saturating_sub(severity)
            .max(Decimal::ZERO)
    }

    /// Points of the first band whose upper edge is at least `age`
    pub fn age_points(&self, age: i32) -> Decimal {
        self.config
            .age_bands
            .iter()
            .find(|band| age <= band.max_age)
            .or_else(|| self.config.age_bands.last())
            .map(|band| band.points)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn rules_points(&self, risk_factors: &[RiskFactor]) -> Decimal {
        let penalty: Decimal = risk_factors.iter().map(|factor| factor.penalty).sum();
        (RULES_CAP - penalty).max(Decimal::ZERO)
    }

    pub fn ml_points(&self, high_risk: f64) -> Decimal {
        let probability = Decimal::try_from(high_risk.clamp(0.0, 1.0)).unwrap_or(dec!(0.5));
        ML_CAP * (Decimal::ONE - probability)
    }
}
