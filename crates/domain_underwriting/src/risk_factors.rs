//! Soft rules (risk factors)
//!
//! Soft rules flag near-miss conditions that do not justify an automatic
//! decline but still make an applicant riskier: a credit score just above the
//! decline threshold, one or two traffic violations, a wooden house in a flood
//! zone. Each fired rule costs points from the rules sub-score and may attach
//! a policy exclusion to a conditional approval.
//!
//! The rules form a function table: every entry pairs a [`SoftRuleKind`] with
//! a plain `fn` predicate, so adding a rule is one enum variant and one row.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::applicant::{ApplicantRecord, ConstructionType};
use crate::config::{HardRuleConfig, SoftRuleConfig};

/// Width of the credit band just above the decline threshold
const BORDERLINE_CREDIT_WIDTH: i32 = 100;
/// Credit scores below this are considered below average
const AVERAGE_CREDIT_SCORE: i32 = 700;

/// Identifier of a soft rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftRuleKind {
    BorderlineCreditScore,
    BelowAverageCreditScore,
    MultipleRecentClaims,
    HighClaimsFrequency,
    YoungApplicant,
    SeniorApplicant,
    RecentTrafficViolations,
    PriorAccidents,
    LimitedDrivingExperience,
    OldProperty,
    WoodConstruction,
    NoSecuritySystem,
    PoorFireProtection,
    FloodZone,
    Smoker,
    PreExistingConditions,
    CoverageHighRelativeToIncome,
    CoverageVeryHighRelativeToIncome,
}

impl SoftRuleKind {
    /// All soft rules in evaluation order
    pub const ALL: [SoftRuleKind; 18] = [
        SoftRuleKind::BorderlineCreditScore,
        SoftRuleKind::BelowAverageCreditScore,
        SoftRuleKind::MultipleRecentClaims,
        SoftRuleKind::HighClaimsFrequency,
        SoftRuleKind::YoungApplicant,
        SoftRuleKind::SeniorApplicant,
        SoftRuleKind::RecentTrafficViolations,
        SoftRuleKind::PriorAccidents,
        SoftRuleKind::LimitedDrivingExperience,
        SoftRuleKind::OldProperty,
        SoftRuleKind::WoodConstruction,
        SoftRuleKind::NoSecuritySystem,
        SoftRuleKind::PoorFireProtection,
        SoftRuleKind::FloodZone,
        SoftRuleKind::Smoker,
        SoftRuleKind::PreExistingConditions,
        SoftRuleKind::CoverageHighRelativeToIncome,
        SoftRuleKind::CoverageVeryHighRelativeToIncome,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoftRuleKind::BorderlineCreditScore => "borderline_credit_score",
            SoftRuleKind::BelowAverageCreditScore => "below_average_credit_score",
            SoftRuleKind::MultipleRecentClaims => "multiple_recent_claims",
            SoftRuleKind::HighClaimsFrequency => "high_claims_frequency",
            SoftRuleKind::YoungApplicant => "young_applicant",
            SoftRuleKind::SeniorApplicant => "senior_applicant",
            SoftRuleKind::RecentTrafficViolations => "recent_traffic_violations",
            SoftRuleKind::PriorAccidents => "prior_accidents",
            SoftRuleKind::LimitedDrivingExperience => "limited_driving_experience",
            SoftRuleKind::OldProperty => "old_property",
            SoftRuleKind::WoodConstruction => "wood_construction",
            SoftRuleKind::NoSecuritySystem => "no_security_system",
            SoftRuleKind::PoorFireProtection => "poor_fire_protection",
            SoftRuleKind::FloodZone => "flood_zone",
            SoftRuleKind::Smoker => "smoker",
            SoftRuleKind::PreExistingConditions => "pre_existing_conditions",
            SoftRuleKind::CoverageHighRelativeToIncome => "coverage_high_relative_to_income",
            SoftRuleKind::CoverageVeryHighRelativeToIncome => {
                "coverage_very_high_relative_to_income"
            }
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }

    /// Points deducted from the rules sub-score when the rule fires
    pub fn default_penalty(&self) -> Decimal {
        match self {
            SoftRuleKind::BorderlineCreditScore => dec!(8),
            SoftRuleKind::BelowAverageCreditScore => dec!(4),
            SoftRuleKind::MultipleRecentClaims => dec!(5),
            SoftRuleKind::HighClaimsFrequency => dec!(10),
            SoftRuleKind::YoungApplicant => dec!(3),
            SoftRuleKind::SeniorApplicant => dec!(3),
            SoftRuleKind::RecentTrafficViolations => dec!(4),
            SoftRuleKind::PriorAccidents => dec!(4),
            SoftRuleKind::LimitedDrivingExperience => dec!(3),
            SoftRuleKind::OldProperty => dec!(3),
            SoftRuleKind::WoodConstruction => dec!(3),
            SoftRuleKind::NoSecuritySystem => dec!(2),
            SoftRuleKind::PoorFireProtection => dec!(5),
            SoftRuleKind::FloodZone => dec!(4),
            SoftRuleKind::Smoker => dec!(5),
            SoftRuleKind::PreExistingConditions => dec!(4),
            SoftRuleKind::CoverageHighRelativeToIncome => dec!(3),
            SoftRuleKind::CoverageVeryHighRelativeToIncome => dec!(6),
        }
    }

    /// Policy exclusion attached to a conditional approval when the rule fires
    pub fn exclusion(&self) -> Option<&'static str> {
        match self {
            SoftRuleKind::BorderlineCreditScore | SoftRuleKind::BelowAverageCreditScore => {
                Some("Premium payment plan restrictions may apply")
            }
            SoftRuleKind::RecentTrafficViolations => {
                Some("Traffic violation surcharge waiver not available")
            }
            SoftRuleKind::PriorAccidents => Some("Accident forgiveness not available"),
            SoftRuleKind::FloodZone => {
                Some("Flood damage excluded (separate flood insurance required)")
            }
            SoftRuleKind::PreExistingConditions => {
                Some("Pre-existing conditions excluded for the first 12 months")
            }
            _ => None,
        }
    }
}

/// Hard rule thresholds the soft rules sit just inside of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearMissThresholds {
    pub min_credit_score: i32,
    pub max_violations: u32,
    pub max_accidents: u32,
}

impl From<&HardRuleConfig> for NearMissThresholds {
    fn from(config: &HardRuleConfig) -> Self {
        Self {
            min_credit_score: config.min_credit_score,
            max_violations: config.max_violations,
            max_accidents: config.max_accidents,
        }
    }
}

type SoftPredicate = fn(&ApplicantRecord, &NearMissThresholds) -> bool;

/// Also covers scores below the minimum, which only reach scoring when the
/// credit hard rule is disabled.
fn borderline_credit_score(r: &ApplicantRecord, t: &NearMissThresholds) -> bool {
    r.credit_score < t.min_credit_score + BORDERLINE_CREDIT_WIDTH
}

fn below_average_credit_score(r: &ApplicantRecord, t: &NearMissThresholds) -> bool {
    (t.min_credit_score + BORDERLINE_CREDIT_WIDTH..AVERAGE_CREDIT_SCORE).contains(&r.credit_score)
}

fn multiple_recent_claims(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    (2..=3).contains(&r.claims_history.claims_last_3_years)
}

fn high_claims_frequency(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.claims_history.claims_last_3_years > 3
}

fn young_applicant(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.age < 21
}

fn senior_applicant(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.age > 75
}

fn recent_traffic_violations(r: &ApplicantRecord, t: &NearMissThresholds) -> bool {
    r.driving_record
        .as_ref()
        .is_some_and(|d| (1..=t.max_violations).contains(&d.violations_last_3_years))
}

fn prior_accidents(r: &ApplicantRecord, t: &NearMissThresholds) -> bool {
    r.driving_record
        .as_ref()
        .is_some_and(|d| (1..=t.max_accidents).contains(&d.accidents_last_5_years))
}

fn limited_driving_experience(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.driving_record.as_ref().is_some_and(|d| d.years_licensed < 2)
}

fn old_property(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.property_info.as_ref().is_some_and(|p| p.property_age > 50)
}

fn wood_construction(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.property_info
        .as_ref()
        .is_some_and(|p| p.construction_type == ConstructionType::Wood)
}

fn no_security_system(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.property_info.as_ref().is_some_and(|p| !p.security_system)
}

fn poor_fire_protection(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.property_info.as_ref().is_some_and(|p| p.fire_protection_class > 7)
}

fn flood_zone(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.property_info.as_ref().is_some_and(|p| p.flood_zone)
}

fn smoker(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.smoker == Some(true)
}

fn pre_existing_conditions(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.pre_existing_conditions == Some(true)
}

fn coverage_high_relative_to_income(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.coverage_to_income_ratio()
        .is_some_and(|ratio| ratio > dec!(5) && ratio <= dec!(10))
}

fn coverage_very_high_relative_to_income(r: &ApplicantRecord, _: &NearMissThresholds) -> bool {
    r.coverage_to_income_ratio().is_some_and(|ratio| ratio > dec!(10))
}

/// Predicate for every soft rule, in evaluation order
static SOFT_RULE_TABLE: [(SoftRuleKind, SoftPredicate); 18] = [
    (SoftRuleKind::BorderlineCreditScore, borderline_credit_score),
    (SoftRuleKind::BelowAverageCreditScore, below_average_credit_score),
    (SoftRuleKind::MultipleRecentClaims, multiple_recent_claims),
    (SoftRuleKind::HighClaimsFrequency, high_claims_frequency),
    (SoftRuleKind::YoungApplicant, young_applicant),
    (SoftRuleKind::SeniorApplicant, senior_applicant),
    (SoftRuleKind::RecentTrafficViolations, recent_traffic_violations),
    (SoftRuleKind::PriorAccidents, prior_accidents),
    (SoftRuleKind::LimitedDrivingExperience, limited_driving_experience),
    (SoftRuleKind::OldProperty, old_property),
    (SoftRuleKind::WoodConstruction, wood_construction),
    (SoftRuleKind::NoSecuritySystem, no_security_system),
    (SoftRuleKind::PoorFireProtection, poor_fire_protection),
    (SoftRuleKind::FloodZone, flood_zone),
    (SoftRuleKind::Smoker, smoker),
    (SoftRuleKind::PreExistingConditions, pre_existing_conditions),
    (SoftRuleKind::CoverageHighRelativeToIncome, coverage_high_relative_to_income),
    (SoftRuleKind::CoverageVeryHighRelativeToIncome, coverage_very_high_relative_to_income),
];

/// A soft rule that fired for an applicant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub kind: SoftRuleKind,
    pub penalty: Decimal,
}

#[derive(Clone, Copy)]
struct SoftRule {
    kind: SoftRuleKind,
    penalty: Decimal,
    predicate: SoftPredicate,
}

impl fmt::Debug for SoftRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftRule")
            .field("kind", &self.kind)
            .field("penalty", &self.penalty)
            .finish_non_exhaustive()
    }
}

/// Evaluates the soft rule table
#[derive(Debug, Clone)]
pub struct RiskFactorEvaluator {
    rules: Vec<SoftRule>,
    thresholds: NearMissThresholds,
}

impl RiskFactorEvaluator {
    /// Builds the table with penalties resolved from `soft_rules`
    pub fn new(thresholds: NearMissThresholds, soft_rules: &SoftRuleConfig) -> Self {
        let rules = SOFT_RULE_TABLE
            .iter()
            .map(|&(kind, predicate)| SoftRule {
                kind,
                penalty: soft_rules.penalty_for(kind),
                predicate,
            })
            .collect();
        Self { rules, thresholds }
    }

    /// Returns the fired soft rules in table order
    pub fn evaluate(&self, record: &ApplicantRecord) -> Vec<RiskFactor> {
        self.rules
            .iter()
            .filter(|rule| (rule.predicate)(record, &self.thresholds))
            .map(|rule| RiskFactor {
                kind: rule.kind,
                penalty: rule.penalty,
            })
            .collect()
    }
}

/// De-duplicated exclusions for a set of fired soft rules, in rule order
pub fn exclusions_for(factors: &[RiskFactor]) -> Vec<String> {
    let mut exclusions: Vec<String> = Vec::new();
    for exclusion in factors.iter().filter_map(|factor| factor.kind.exclusion()) {
        if !exclusions.iter().any(|existing| existing == exclusion) {
            exclusions.push(exclusion.to_string());
        }
    }
    exclusions
}
