//! Pre-built Test Fixtures
//!
//! Provides ready-to-use applicants, clocks and configurations. The
//! applicants mirror the reference scenarios the engine is expected to
//! decide the same way every time.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::FixedClock;
use domain_underwriting::{
    ApplicantRecord, ConstructionType, DecisionTree, ModelSource, PropertyInfo, TreeNode,
    UnderwritingConfig, UnderwritingService,
};
use rust_decimal_macros::dec;

use crate::builders::{sound_property, ApplicantRecordBuilder};

/// Fixture for applicant records
pub struct ApplicantFixtures;

impl ApplicantFixtures {
    /// Credit 750, age 35, no claims, clean driving record
    pub fn clean_auto() -> ApplicantRecord {
        ApplicantRecordBuilder::new().with_id("APP-2025-001").build()
    }

    /// Excellent credit but a DUI on record
    pub fn dui_auto() -> ApplicantRecord {
        ApplicantRecordBuilder::new()
            .with_id("APP-2025-002")
            .with_name("Jane Doe")
            .with_credit_score(800)
            .with_dui(true)
            .build()
    }

    /// Credit below the auto-decline threshold
    pub fn poor_credit() -> ApplicantRecord {
        ApplicantRecordBuilder::new()
            .with_id("APP-2025-003")
            .with_credit_score(480)
            .build()
    }

    /// Flagged for fraud by a previous insurer, otherwise excellent
    pub fn fraud_flagged() -> ApplicantRecord {
        ApplicantRecordBuilder::new()
            .with_id("APP-2025-004")
            .with_credit_score(850)
            .with_fraud_indicators(true)
            .build()
    }

    /// Home application on a well protected brick house
    pub fn sound_home() -> ApplicantRecord {
        ApplicantRecordBuilder::new()
            .with_id("APP-2025-005")
            .with_age(45)
            .with_credit_score(780)
            .with_coverage(dec!(350000))
            .with_income(dec!(120000))
            .home(sound_property())
            .build()
    }

    /// Old wooden house in a flood zone with a modest credit history
    pub fn risky_home() -> ApplicantRecord {
        ApplicantRecordBuilder::new()
            .with_id("APP-2025-006")
            .with_age(58)
            .with_credit_score(640)
            .with_claims(3, 2, dec!(40000))
            .with_coverage(dec!(250000))
            .with_income(dec!(60000))
            .home(PropertyInfo {
                property_age: 80,
                construction_type: ConstructionType::Wood,
                security_system: false,
                fire_protection_class: 8,
                flood_zone: true,
            })
            .build()
    }

    /// Health applicant who smokes and has pre-existing conditions
    pub fn smoker_health() -> ApplicantRecord {
        ApplicantRecordBuilder::new()
            .with_id("APP-2025-007")
            .with_name("Bob Johnson")
            .with_age(45)
            .with_credit_score(700)
            .with_claims(2, 1, dec!(8000))
            .with_coverage(dec!(500000))
            .with_income(dec!(85000))
            .health(true, true)
            .build()
    }

    /// Applicant with an out-of-range age
    pub fn invalid_age() -> ApplicantRecord {
        ApplicantRecordBuilder::new()
            .with_id("APP-2025-008")
            .with_age(-4)
            .build()
    }
}

/// Fixture for time
pub struct ClockFixtures;

impl ClockFixtures {
    /// Decision instant used across tests (June 1, 2025 09:30 UTC)
    pub fn decision_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn fixed() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(Self::decision_time()))
    }
}

/// Fixture for engine configurations and services
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Default configuration
    pub fn default_config() -> UnderwritingConfig {
        UnderwritingConfig::default()
    }

    /// Configuration running without a risk model
    pub fn without_model() -> UnderwritingConfig {
        UnderwritingConfig {
            model: ModelSource::Disabled,
            ..UnderwritingConfig::default()
        }
    }

    /// Pretrained single-leaf model answering `high_risk` for everyone
    pub fn constant_model(version: &str, high_risk: f64) -> ModelSource {
        ModelSource::Pretrained {
            version: version.to_string(),
            tree: DecisionTree {
                feature_count: 6,
                nodes: vec![TreeNode::Leaf {
                    class_probabilities: [1.0 - high_risk, 0.0, high_risk],
                    high_risk,
                }],
            },
        }
    }

    /// Service built from `config` with the fixed test clock
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid
    pub fn service(config: UnderwritingConfig) -> UnderwritingService {
        UnderwritingService::new(config)
            .expect("test configuration must be valid")
            .with_clock(ClockFixtures::fixed())
    }

    /// Default service with the fixed test clock
    pub fn default_service() -> UnderwritingService {
        Self::service(Self::default_config())
    }
}
