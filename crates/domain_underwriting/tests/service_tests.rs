//! Underwriting Service Tests
//!
//! End-to-end tests of `UnderwritingService::evaluate` against the reference
//! applicants in `test_utils`.
//!
//! # Test Coverage
//!
//! - Hard rule declines and their exact reasons
//! - Score-path outcomes, reasons, conditions and exclusions
//! - Degraded evaluation without a risk model
//! - Model reload and versioning
//! - Reproducibility under a fixed clock
//! - Redaction of audit records
//! - Configuration rejection at startup
//!
//! # Test Organization
//!
//! - `hard_rule_tests` - Auto-decline behaviour
//! - `score_path_tests` - Banded outcomes
//! - `model_tests` - Degradation and reload
//! - `audit_tests` - Redacted audit side channel
//! - `configuration_tests` - Startup validation

use std::sync::Arc;

use domain_underwriting::{
    ConfigurationError, DataError, DecisionBands, InMemoryAuditSink, Outcome, RiskLevel,
    SoftRuleKind, UnderwritingConfig, UnderwritingService,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use test_utils::{
    assert_breakdown_within_caps, assert_declined_by_rules, assert_no_identity_leak,
    assert_outcome, ApplicantFixtures, ApplicantRecordBuilder, ConfigFixtures,
};

// ============================================================================
// Hard Rule Tests
// ============================================================================

mod hard_rule_tests {
    use super::*;

    #[test]
    fn test_dui_declines_despite_excellent_credit() {
        let service = ConfigFixtures::default_service();
        let decision = service.evaluate(&ApplicantFixtures::dui_auto()).unwrap();

        assert_declined_by_rules(&decision, &["dui_or_dwi_history"]);
        assert_eq!(decision.risk_level, RiskLevel::VeryHigh);
        assert!(decision.conditions.is_empty());
    }

    #[test]
    fn test_credit_below_threshold_declines() {
        let service = ConfigFixtures::default_service();
        let decision = service.evaluate(&ApplicantFixtures::poor_credit()).unwrap();
        assert_declined_by_rules(&decision, &["credit_score_below_threshold"]);
    }

    #[test]
    fn test_fraud_declines_best_possible_applicant() {
        let service = ConfigFixtures::default_service();
        let decision = service.evaluate(&ApplicantFixtures::fraud_flagged()).unwrap();
        assert_declined_by_rules(&decision, &["fraud_indicator"]);
    }

    #[test]
    fn test_every_fired_rule_is_reported() {
        let service = ConfigFixtures::default_service();
        let record = ApplicantRecordBuilder::new()
            .with_credit_score(450)
            .with_suspended_license(true)
            .with_driving(10, 4, 0)
            .build();

        let decision = service.evaluate(&record).unwrap();
        assert_declined_by_rules(
            &decision,
            &[
                "credit_score_below_threshold",
                "license_suspended",
                "excessive_violations",
            ],
        );
    }

    #[test]
    fn test_rule_decline_is_not_flagged_degraded() {
        let service = ConfigFixtures::service(ConfigFixtures::without_model());
        let decision = service.evaluate(&ApplicantFixtures::fraud_flagged()).unwrap();
        assert_declined_by_rules(&decision, &["fraud_indicator"]);
        assert!(!decision.ml_degraded);
    }
}

// ============================================================================
// Score Path Tests
// ============================================================================

mod score_path_tests {
    use super::*;

    #[test]
    fn test_clean_auto_is_approved() {
        let service = ConfigFixtures::default_service();
        let decision = service.evaluate(&ApplicantFixtures::clean_auto()).unwrap();

        assert_outcome(&decision, Outcome::Approved);
        assert_eq!(decision.reasons, vec!["composite_score_approved"]);
        assert!(decision.risk_factors.is_empty());
        assert_eq!(decision.risk_level, RiskLevel::Low);
        assert!(!decision.ml_degraded);
        assert_eq!(decision.model_version, "tree-v1-seed42-n1000");

        let breakdown = decision.score_breakdown.unwrap();
        assert_breakdown_within_caps(&breakdown);
        assert_eq!(breakdown.credit(), dec!(24.55));
        assert_eq!(breakdown.claims(), dec!(20));
        assert_eq!(breakdown.age(), dec!(10));
        assert_eq!(breakdown.rules(), dec!(25));
    }

    #[test]
    fn test_sound_home_is_approved() {
        let service = ConfigFixtures::default_service();
        let decision = service.evaluate(&ApplicantFixtures::sound_home()).unwrap();
        assert_outcome(&decision, Outcome::Approved);
    }

    #[test]
    fn test_health_smoker_approved_with_conditions() {
        let service = ConfigFixtures::service(ConfigFixtures::without_model());
        let decision = service.evaluate(&ApplicantFixtures::smoker_health()).unwrap();

        // 21.82 + 15.84 + 10 + 13 + 7.5
        let breakdown = decision.score_breakdown.unwrap();
        assert_eq!(breakdown.total(), dec!(68.16));

        assert_outcome(&decision, Outcome::ApprovedWithConditions);
        assert_eq!(
            decision.reasons,
            vec![
                "composite_score_conditional",
                "weak_rules",
                "weak_ml",
                "ml_model_unavailable",
            ]
        );
        assert_eq!(
            decision.conditions,
            vec![
                "Six-month policy review due to identified risk factors",
                "Additional documentation required annually",
            ]
        );
        assert_eq!(
            decision.exclusions,
            vec!["Pre-existing conditions excluded for the first 12 months"]
        );
        let kinds: Vec<SoftRuleKind> = decision.risk_factors.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SoftRuleKind::Smoker,
                SoftRuleKind::PreExistingConditions,
                SoftRuleKind::CoverageHighRelativeToIncome,
            ]
        );
        assert_eq!(decision.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_risky_home_referred_to_manual_review() {
        let service = ConfigFixtures::service(ConfigFixtures::without_model());
        let decision = service.evaluate(&ApplicantFixtures::risky_home()).unwrap();

        // 18.55 + 10.4 + 10 + 0 + 7.5
        assert_eq!(decision.score_breakdown.unwrap().total(), dec!(46.45));
        assert_outcome(&decision, Outcome::ReferToManualReview);
        assert_eq!(
            decision.reasons,
            vec![
                "composite_score_manual_review",
                "weak_rules",
                "weak_claims",
                "weak_ml",
                "ml_model_unavailable",
            ]
        );
        assert!(decision.conditions.is_empty());
        assert!(decision.exclusions.is_empty());
        assert_eq!(decision.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_score_below_minimum_declines() {
        let service = ConfigFixtures::service(ConfigFixtures::without_model());
        let record = ApplicantRecordBuilder::new()
            .with_age(19)
            .with_credit_score(520)
            .with_claims(3, 3, dec!(90000))
            .with_driving(1, 3, 3)
            .build();

        let decision = service.evaluate(&record).unwrap();
        assert_outcome(&decision, Outcome::Declined);
        assert_eq!(decision.reasons[0], "composite_score_below_minimum");
        assert!(decision.score_breakdown.is_some());
        assert_eq!(decision.risk_level, RiskLevel::VeryHigh);
    }

    #[test]
    fn test_extreme_amount_ratios_still_decide() {
        let service = ConfigFixtures::default_service();
        let tiny_coverage = ApplicantRecordBuilder::new()
            .with_coverage(Decimal::new(1, 22))
            .with_claims(1, 0, dec!(10000000000))
            .build();
        let tiny_income = ApplicantRecordBuilder::new()
            .with_income(Decimal::new(1, 22))
            .with_coverage(dec!(10000000000))
            .build();

        let decision = service.evaluate(&tiny_coverage).unwrap();
        assert_eq!(decision.score_breakdown.unwrap().claims(), dec!(10));

        let decision = service.evaluate(&tiny_income).unwrap();
        assert!(decision
            .risk_factors
            .iter()
            .any(|f| f.kind == SoftRuleKind::CoverageVeryHighRelativeToIncome));

        let results = service.evaluate_batch(&[tiny_coverage, tiny_income]);
        assert!(results.iter().all(Result::is_ok));
    }

    #[test]
    fn test_invalid_record_is_a_data_error() {
        let service = ConfigFixtures::default_service();
        let err = service.evaluate(&ApplicantFixtures::invalid_age()).unwrap_err();
        assert_eq!(err.field(), Some("age"));

        let record = ApplicantRecordBuilder::new().without_driving_record().build();
        assert_eq!(
            service.evaluate(&record),
            Err(DataError::missing("driving_record"))
        );
    }

    #[test]
    fn test_evaluation_is_reproducible() {
        let service = ConfigFixtures::default_service();
        let record = ApplicantFixtures::smoker_health();
        let first = service.evaluate(&record).unwrap();
        let second = service.evaluate(&record).unwrap();
        assert_eq!(first, second);

        let other_service = ConfigFixtures::default_service();
        assert_eq!(other_service.evaluate(&record).unwrap(), first);
    }

    #[test]
    fn test_decision_output_is_redacted() {
        let service = ConfigFixtures::default_service();
        let record = ApplicantRecordBuilder::new()
            .with_id("APP-SECRET-42")
            .with_identity("123-45-6789", "john@example.com", "555-0100")
            .build();

        let decision = service.evaluate(&record).unwrap();
        assert_no_identity_leak(
            &decision,
            &["APP-SECRET-42", "John Smith", "123-45-6789", "john@example.com", "555-0100"],
        );
    }
}

// ============================================================================
// Model Tests
// ============================================================================

mod model_tests {
    use super::*;

    #[test]
    fn test_disabled_model_degrades_every_scored_decision() {
        let service = ConfigFixtures::service(ConfigFixtures::without_model());
        let decision = service.evaluate(&ApplicantFixtures::clean_auto()).unwrap();

        assert!(decision.ml_degraded);
        assert_eq!(decision.model_version, "unavailable");
        assert_eq!(decision.score_breakdown.unwrap().ml(), dec!(7.5));
        assert_eq!(
            decision.reasons,
            vec!["composite_score_approved", "ml_model_unavailable"]
        );
    }

    #[test]
    fn test_pretrained_model_is_used() {
        let config = UnderwritingConfig {
            model: ConfigFixtures::constant_model("const-low", 0.0),
            ..UnderwritingConfig::default()
        };
        let service = ConfigFixtures::service(config);
        let decision = service.evaluate(&ApplicantFixtures::clean_auto()).unwrap();

        assert_eq!(decision.model_version, "const-low");
        assert_eq!(decision.score_breakdown.unwrap().ml(), dec!(15));
    }

    #[test]
    fn test_reload_changes_model_for_later_evaluations() {
        let service = ConfigFixtures::default_service();
        let record = ApplicantFixtures::clean_auto();
        let before = service.evaluate(&record).unwrap();

        service
            .reload_model(ConfigFixtures::constant_model("const-high", 1.0))
            .unwrap();
        let after = service.evaluate(&record).unwrap();

        assert_eq!(service.model_version(), "const-high");
        assert_eq!(after.model_version, "const-high");
        assert_eq!(after.score_breakdown.unwrap().ml(), dec!(0));
        assert_ne!(before.decision_id, after.decision_id);
        // 24.55 + 20 + 10 + 25 + 0 still clears the approval band
        assert_outcome(&after, Outcome::Approved);
    }

    #[test]
    fn test_failed_reload_keeps_current_model() {
        let service = ConfigFixtures::default_service();
        let result = service.reload_model(domain_underwriting::ModelSource::Pretrained {
            version: String::new(),
            tree: domain_underwriting::DecisionTree {
                feature_count: 6,
                nodes: Vec::new(),
            },
        });
        assert!(matches!(result, Err(ConfigurationError::InvalidModel(_))));
        assert_eq!(service.model_version(), "tree-v1-seed42-n1000");
    }
}

// ============================================================================
// Audit Tests
// ============================================================================

mod audit_tests {
    use super::*;

    #[test]
    fn test_audit_sink_receives_redacted_entries() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let service = ConfigFixtures::default_service().with_audit_sink(sink.clone());

        let record = ApplicantRecordBuilder::new()
            .with_identity("123-45-6789", "john@example.com", "555-0100")
            .build();
        let decision = service.evaluate(&record).unwrap();

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].decision_id, decision.decision_id.to_string());
        assert_eq!(entries[0].applicant.masked_name, "J*** S****");
        assert_eq!(entries[0].applicant.masked_ssn.as_deref(), Some("XXX-XX-6789"));
        assert_eq!(entries[0].applicant.age_band, "30-39");

        let json = serde_json::to_string(&entries).unwrap();
        for secret in ["John Smith", "123-45", "john@example.com", "555-0100"] {
            assert!(!json.contains(secret), "audit entry leaks {}", secret);
        }
    }

    #[test]
    fn test_rejected_records_are_not_audited() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let service = ConfigFixtures::default_service().with_audit_sink(sink.clone());
        assert!(service.evaluate(&ApplicantFixtures::invalid_age()).is_err());
        assert!(sink.is_empty());
    }
}

// ============================================================================
// Configuration Tests
// ============================================================================

mod configuration_tests {
    use super::*;

    #[test]
    fn test_unordered_bands_refuse_to_start() {
        let config = UnderwritingConfig {
            bands: DecisionBands {
                low: dec!(60),
                medium: dec!(50),
                high: dec!(75),
            },
            model: domain_underwriting::ModelSource::Disabled,
            ..UnderwritingConfig::default()
        };
        assert!(matches!(
            UnderwritingService::new(config),
            Err(ConfigurationError::UnorderedBands { .. })
        ));
    }

    #[test]
    fn test_unknown_rule_refuses_to_start() {
        let mut config = ConfigFixtures::without_model();
        config.rules.enabled = vec!["moon_phase".to_string()];
        assert_eq!(
            UnderwritingService::new(config).unwrap_err(),
            ConfigurationError::UnknownRule("moon_phase".to_string())
        );
    }

    #[test]
    fn test_empty_rule_set_is_allowed() {
        let mut config = ConfigFixtures::without_model();
        config.rules.enabled.clear();
        let service = ConfigFixtures::service(config);

        let decision = service.evaluate(&ApplicantFixtures::fraud_flagged()).unwrap();
        assert_ne!(decision.reasons, vec!["fraud_indicator"]);
        assert!(decision.score_breakdown.is_some());
    }

    #[test]
    fn test_custom_bands_shift_outcomes() {
        let config = UnderwritingConfig {
            bands: DecisionBands {
                low: dec!(30),
                medium: dec!(50),
                high: dec!(95),
            },
            model: ConfigFixtures::constant_model("const-low", 0.0),
            ..UnderwritingConfig::default()
        };
        let service = ConfigFixtures::service(config);
        let decision = service.evaluate(&ApplicantFixtures::clean_auto()).unwrap();
        // 24.55 + 20 + 10 + 25 + 15 = 94.55, nothing weak
        assert_outcome(&decision, Outcome::ApprovedWithConditions);
        assert_eq!(
            decision.reasons,
            vec!["composite_score_conditional", "weak_credit"]
        );
        assert_eq!(decision.conditions, vec!["Annual policy review required"]);
        assert!(decision.exclusions.is_empty());
    }
}
