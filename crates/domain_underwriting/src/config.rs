//! Engine configuration
//!
//! Every threshold the engine uses lives here rather than in the rule or
//! scoring code. The configuration is deserialized once, validated once, and
//! then shared read-only by all evaluations. Each section falls back to the
//! defaults below when omitted, so an empty document is a valid configuration.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::applicant::{MAX_AGE, MAX_CREDIT_SCORE, MIN_AGE, MIN_CREDIT_SCORE};
use crate::error::ConfigurationError;
use crate::model::DecisionTree;
use crate::risk_factors::SoftRuleKind;
use crate::rules_engine::HardRuleId;
use crate::scoring::RULES_CAP;

/// Complete configuration of the underwriting engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderwritingConfig {
    /// Hard auto-decline rules
    pub rules: HardRuleConfig,
    /// Soft rule penalty overrides
    pub soft_rules: SoftRuleConfig,
    /// Sub-score curves
    pub scoring: ScoringConfig,
    /// Score thresholds for each outcome
    pub bands: DecisionBands,
    /// Where the risk model comes from
    pub model: ModelSource,
}

impl UnderwritingConfig {
    /// Validates every section
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] found
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.rules.validate()?;
        self.soft_rules.validate()?;
        self.scoring.validate()?;
        self.bands.validate()?;
        self.model.validate()
    }
}

/// Hard rule selection and thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardRuleConfig {
    /// Rule ids in evaluation order
    pub enabled: Vec<String>,
    /// Credit scores strictly below this are declined
    pub min_credit_score: i32,
    /// More violations than this in three years are declined
    pub max_violations: u32,
    /// More accidents than this in five years are declined
    pub max_accidents: u32,
}

impl Default for HardRuleConfig {
    fn default() -> Self {
        Self {
            enabled: HardRuleId::ALL.iter().map(|id| id.as_str().to_string()).collect(),
            min_credit_score: 500,
            max_violations: 3,
            max_accidents: 3,
        }
    }
}

impl HardRuleConfig {
    /// Resolves the configured ids, preserving their order
    ///
    /// # Errors
    ///
    /// Fails on an unknown or repeated id
    pub fn rule_ids(&self) -> Result<Vec<HardRuleId>, ConfigurationError> {
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(self.enabled.len());
        for name in &self.enabled {
            let id = HardRuleId::parse(name)
                .ok_or_else(|| ConfigurationError::UnknownRule(name.clone()))?;
            if !seen.insert(id) {
                return Err(ConfigurationError::DuplicateRule(name.clone()));
            }
            ids.push(id);
        }
        Ok(ids)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        self.rule_ids()?;
        if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&self.min_credit_score) {
            return Err(ConfigurationError::out_of_range(
                "rules.min_credit_score",
                self.min_credit_score,
                format!("{}..={}", MIN_CREDIT_SCORE, MAX_CREDIT_SCORE),
            ));
        }
        Ok(())
    }
}

/// Per-rule penalty overrides for the soft rules
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftRuleConfig {
    /// Penalty by soft rule name; rules not listed keep their default
    pub penalties: BTreeMap<String, Decimal>,
}

impl SoftRuleConfig {
    /// Penalty for `kind`, honouring any override
    pub fn penalty_for(&self, kind: SoftRuleKind) -> Decimal {
        self.penalties
            .get(kind.as_str())
            .copied()
            .unwrap_or_else(|| kind.default_penalty())
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, penalty) in &self.penalties {
            if SoftRuleKind::parse(name).is_none() {
                return Err(ConfigurationError::UnknownSoftRule(name.clone()));
            }
            if *penalty < Decimal::ZERO || *penalty > RULES_CAP {
                return Err(ConfigurationError::out_of_range(
                    format!("soft_rules.penalties.{}", name),
                    penalty,
                    format!("0..={}", RULES_CAP),
                ));
            }
        }

        // A lower credit band must never cost fewer points than a higher one
        let borderline = self.penalty_for(SoftRuleKind::BorderlineCreditScore);
        let below_average = self.penalty_for(SoftRuleKind::BelowAverageCreditScore);
        if borderline < below_average {
            return Err(ConfigurationError::out_of_range(
                "soft_rules.penalties.borderline_credit_score",
                borderline,
                format!(">= below_average_credit_score penalty ({})", below_average),
            ));
        }
        Ok(())
    }
}

/// Upper edge of one age band and the points it earns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeBand {
    /// Inclusive upper age of the band
    pub max_age: i32,
    /// Age sub-score for applicants in the band
    pub points: Decimal,
}

/// Shape of the sub-score curves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Credit score that earns zero credit points
    pub credit_floor: i32,
    /// Credit score that earns the full credit points
    pub credit_ceiling: i32,
    /// Claims points lost per claim in the last three years
    pub points_per_recent_claim: Decimal,
    /// Claims points lost when the lifetime claimed amount equals the coverage
    pub claimed_amount_weight: Decimal,
    /// Age bands in ascending order; the last must reach the maximum age
    pub age_bands: Vec<AgeBand>,
    /// Sub-scores below this fraction of their cap count as weak
    pub weak_ratio: Decimal,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            credit_floor: MIN_CREDIT_SCORE,
            credit_ceiling: MAX_CREDIT_SCORE,
            points_per_recent_claim: dec!(4),
            claimed_amount_weight: dec!(10),
            age_bands: vec![
                AgeBand { max_age: 20, points: dec!(2) },
                AgeBand { max_age: 24, points: dec!(5) },
                AgeBand { max_age: 29, points: dec!(8) },
                AgeBand { max_age: 65, points: dec!(10) },
                AgeBand { max_age: 70, points: dec!(7) },
                AgeBand { max_age: 75, points: dec!(5) },
                AgeBand { max_age: MAX_AGE, points: dec!(3) },
            ],
            weak_ratio: dec!(0.6),
        }
    }
}

impl ScoringConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.credit_floor < MIN_CREDIT_SCORE
            || self.credit_ceiling > MAX_CREDIT_SCORE
            || self.credit_floor >= self.credit_ceiling
        {
            return Err(ConfigurationError::out_of_range(
                "scoring.credit_floor..credit_ceiling",
                format!("{}..{}", self.credit_floor, self.credit_ceiling),
                format!(
                    "{} <= floor < ceiling <= {}",
                    MIN_CREDIT_SCORE, MAX_CREDIT_SCORE
                ),
            ));
        }
        if self.points_per_recent_claim < Decimal::ZERO {
            return Err(ConfigurationError::out_of_range(
                "scoring.points_per_recent_claim",
                self.points_per_recent_claim,
                ">= 0",
            ));
        }
        if self.claimed_amount_weight < Decimal::ZERO {
            return Err(ConfigurationError::out_of_range(
                "scoring.claimed_amount_weight",
                self.claimed_amount_weight,
                ">= 0",
            ));
        }
        if self.weak_ratio <= Decimal::ZERO || self.weak_ratio > Decimal::ONE {
            return Err(ConfigurationError::out_of_range(
                "scoring.weak_ratio",
                self.weak_ratio,
                "(0, 1]",
            ));
        }

        let mut previous = MIN_AGE - 1;
        for band in &self.age_bands {
            if band.max_age <= previous {
                return Err(ConfigurationError::out_of_range(
                    "scoring.age_bands.max_age",
                    band.max_age,
                    format!("strictly greater than {}", previous),
                ));
            }
            if band.points < Decimal::ZERO || band.points > crate::scoring::AGE_CAP {
                return Err(ConfigurationError::out_of_range(
                    "scoring.age_bands.points",
                    band.points,
                    format!("0..={}", crate::scoring::AGE_CAP),
                ));
            }
            previous = band.max_age;
        }
        if previous < MAX_AGE {
            return Err(ConfigurationError::out_of_range(
                "scoring.age_bands",
                previous,
                format!("last band must reach age {}", MAX_AGE),
            ));
        }
        Ok(())
    }
}

/// Composite score thresholds
///
/// Scores at or above `high` are approved, `medium..high` approved with
/// conditions, `low..medium` referred, and anything below `low` declined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionBands {
    pub low: Decimal,
    pub medium: Decimal,
    pub high: Decimal,
}

impl Default for DecisionBands {
    fn default() -> Self {
        Self {
            low: dec!(30),
            medium: dec!(50),
            high: dec!(75),
        }
    }
}

impl DecisionBands {
    /// Validates that the bands are ordered and lie within the score range
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnorderedBands`] or an out-of-range error
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.low < Decimal::ZERO {
            return Err(ConfigurationError::out_of_range("bands.low", self.low, ">= 0"));
        }
        if self.high > dec!(100) {
            return Err(ConfigurationError::out_of_range("bands.high", self.high, "<= 100"));
        }
        if !(self.low < self.medium && self.medium < self.high) {
            return Err(ConfigurationError::UnorderedBands {
                low: self.low.to_string(),
                medium: self.medium.to_string(),
                high: self.high.to_string(),
            });
        }
        Ok(())
    }
}

/// Synthetic dataset and tree shape used when training at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    pub seed: u64,
    pub samples: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            seed: 42,
            samples: 1000,
            max_depth: 5,
            min_samples_split: 20,
        }
    }
}

impl TrainingParams {
    /// Version string recorded on decisions made with a model trained from these params
    pub fn version(&self) -> String {
        format!("tree-v1-seed{}-n{}", self.seed, self.samples)
    }
}

/// Origin of the risk model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ModelSource {
    /// Train on the synthetic dataset at startup
    Train(TrainingParams),
    /// Use previously trained parameters
    Pretrained { version: String, tree: DecisionTree },
    /// Run without a model; every decision is ML-degraded
    Disabled,
}

impl Default for ModelSource {
    fn default() -> Self {
        ModelSource::Train(TrainingParams::default())
    }
}

impl ModelSource {
    /// Validates the model parameters
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for unusable training parameters or a
    /// malformed pretrained tree
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            ModelSource::Train(params) => {
                if params.samples == 0 {
                    return Err(ConfigurationError::out_of_range("model.samples", 0, ">= 1"));
                }
                if !(1..=16).contains(&params.max_depth) {
                    return Err(ConfigurationError::out_of_range(
                        "model.max_depth",
                        params.max_depth,
                        "1..=16",
                    ));
                }
                if params.min_samples_split < 2 {
                    return Err(ConfigurationError::out_of_range(
                        "model.min_samples_split",
                        params.min_samples_split,
                        ">= 2",
                    ));
                }
                Ok(())
            }
            ModelSource::Pretrained { version, tree } => {
                if version.trim().is_empty() {
                    return Err(ConfigurationError::invalid_model("pretrained model has no version"));
                }
                tree.validate()
            }
            ModelSource::Disabled => Ok(()),
        }
    }
}
