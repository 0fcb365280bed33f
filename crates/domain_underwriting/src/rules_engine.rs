//! Hard auto-decline rules
//!
//! The rule engine is the first gate an application passes through. Each
//! rule is a named predicate over the applicant record; if any of them fires
//! the application is declined outright and never reaches the scorer, so a
//! strong credit profile can never offset fraud or a DUI.
//!
//! Rules are data rather than a chain of conditionals. The engine holds an
//! ordered list of [`RulePredicate`] trait objects built from the configured
//! rule ids, evaluates every one of them (no short-circuit), and reports the
//! ones that fired in list order.
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = RuleEngine::from_config(&HardRuleConfig::default())?;
//! let verdict = engine.evaluate(&record);
//! if verdict.declined {
//!     println!("declined by {:?}", verdict.triggered_rules);
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::applicant::ApplicantRecord;
use crate::config::HardRuleConfig;
use crate::error::ConfigurationError;

/// Identifier of a built-in hard rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardRuleId {
    DuiOrDwiHistory,
    FraudIndicator,
    CreditScoreBelowThreshold,
    LicenseSuspended,
    ExcessiveViolations,
}

impl HardRuleId {
    /// All hard rules in their default evaluation order
    pub const ALL: [HardRuleId; 5] = [
        HardRuleId::DuiOrDwiHistory,
        HardRuleId::FraudIndicator,
        HardRuleId::CreditScoreBelowThreshold,
        HardRuleId::LicenseSuspended,
        HardRuleId::ExcessiveViolations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HardRuleId::DuiOrDwiHistory => "dui_or_dwi_history",
            HardRuleId::FraudIndicator => "fraud_indicator",
            HardRuleId::CreditScoreBelowThreshold => "credit_score_below_threshold",
            HardRuleId::LicenseSuspended => "license_suspended",
            HardRuleId::ExcessiveViolations => "excessive_violations",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.as_str() == name)
    }
}

impl fmt::Display for HardRuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, side-effect free predicate over an applicant
///
/// Returning `true` means the rule fired and the application must be
/// declined. Rules that depend on an absent sub-record return `false`.
pub trait RulePredicate: Send + Sync + fmt::Debug {
    /// Identifier reported when the rule fires
    fn id(&self) -> HardRuleId;

    /// Evaluates the rule
    fn fires(&self, record: &ApplicantRecord) -> bool;
}

#[derive(Debug)]
struct DuiOrDwiHistory;

impl RulePredicate for DuiOrDwiHistory {
    fn id(&self) -> HardRuleId {
        HardRuleId::DuiOrDwiHistory
    }

    fn fires(&self, record: &ApplicantRecord) -> bool {
        record
            .driving_record
            .as_ref()
            .is_some_and(|driving| driving.dui_history)
    }
}

#[derive(Debug)]
struct FraudIndicator;

impl RulePredicate for FraudIndicator {
    fn id(&self) -> HardRuleId {
        HardRuleId::FraudIndicator
    }

    fn fires(&self, record: &ApplicantRecord) -> bool {
        record.claims_history.fraud_indicators
    }
}

#[derive(Debug)]
struct CreditScoreBelowThreshold {
    minimum: i32,
}

impl RulePredicate for CreditScoreBelowThreshold {
    fn id(&self) -> HardRuleId {
        HardRuleId::CreditScoreBelowThreshold
    }

    fn fires(&self, record: &ApplicantRecord) -> bool {
        record.credit_score < self.minimum
    }
}

#[derive(Debug)]
struct LicenseSuspended;

impl RulePredicate for LicenseSuspended {
    fn id(&self) -> HardRuleId {
        HardRuleId::LicenseSuspended
    }

    fn fires(&self, record: &ApplicantRecord) -> bool {
        record
            .driving_record
            .as_ref()
            .is_some_and(|driving| driving.license_suspended)
    }
}

#[derive(Debug)]
struct ExcessiveViolations {
    max_violations: u32,
    max_accidents: u32,
}

impl RulePredicate for ExcessiveViolations {
    fn id(&self) -> HardRuleId {
        HardRuleId::ExcessiveViolations
    }

    fn fires(&self, record: &ApplicantRecord) -> bool {
        record.driving_record.as_ref().is_some_and(|driving| {
            driving.violations_last_3_years > self.max_violations
                || driving.accidents_last_5_years > self.max_accidents
        })
    }
}

/// Builds the predicate for `id` from the configured thresholds
fn build_rule(id: HardRuleId, config: &HardRuleConfig) -> Box<dyn RulePredicate> {
    match id {
        HardRuleId::DuiOrDwiHistory => Box::new(DuiOrDwiHistory),
        HardRuleId::FraudIndicator => Box::new(FraudIndicator),
        HardRuleId::CreditScoreBelowThreshold => Box::new(CreditScoreBelowThreshold {
            minimum: config.min_credit_score,
        }),
        HardRuleId::LicenseSuspended => Box::new(LicenseSuspended),
        HardRuleId::ExcessiveViolations => Box::new(ExcessiveViolations {
            max_violations: config.max_violations,
            max_accidents: config.max_accidents,
        }),
    }
}

/// Outcome of running the hard rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleVerdict {
    /// True iff at least one rule fired
    pub declined: bool,
    /// Names of the rules that fired, in rule-list order
    pub triggered_rules: Vec<String>,
}

/// Ordered, immutable set of hard rules
#[derive(Debug)]
pub struct RuleEngine {
    rules: Vec<Box<dyn RulePredicate>>,
}

impl RuleEngine {
    /// Creates an engine from explicit predicates, evaluated in the given order
    pub fn new(rules: Vec<Box<dyn RulePredicate>>) -> Self {
        Self { rules }
    }

    /// Builds the engine from configuration
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for unknown or duplicated rule ids
    pub fn from_config(config: &HardRuleConfig) -> Result<Self, ConfigurationError> {
        let rules = config
            .rule_ids()?
            .into_iter()
            .map(|id| build_rule(id, config))
            .collect();
        Ok(Self::new(rules))
    }

    /// Rule names in evaluation order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.id().as_str()).collect()
    }

    /// Evaluates every rule against `record`
    pub fn evaluate(&self, record: &ApplicantRecord) -> RuleVerdict {
        let triggered_rules: Vec<String> = self
            .rules
            .iter()
            .filter(|rule| rule.fires(record))
            .map(|rule| rule.id().as_str().to_string())
            .collect();

        RuleVerdict {
            declined: !triggered_rules.is_empty(),
            triggered_rules,
        }
    }
}
