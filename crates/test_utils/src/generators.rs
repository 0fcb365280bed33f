//! Property-Based Test Generators
//!
//! Provides proptest strategies for applicant records that satisfy every
//! record invariant, so properties can be checked on the decision path
//! rather than on validation failures.

use domain_underwriting::{
    ApplicantRecord, ClaimsHistory, ConstructionType, DrivingRecord, EmploymentStatus,
    InsuranceType, PropertyInfo,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for ages within the insurable range
pub fn age_strategy() -> impl Strategy<Value = i32> {
    18i32..=100
}

/// Strategy for credit scores on the full scale
pub fn credit_score_strategy() -> impl Strategy<Value = i32> {
    300i32..=850
}

/// Strategy for whole-dollar amounts between `min` and `max`
pub fn amount_strategy(min: i64, max: i64) -> impl Strategy<Value = Decimal> {
    (min..=max).prop_map(Decimal::from)
}

pub fn employment_strategy() -> impl Strategy<Value = EmploymentStatus> {
    prop_oneof![
        Just(EmploymentStatus::Employed),
        Just(EmploymentStatus::SelfEmployed),
        Just(EmploymentStatus::Unemployed),
        Just(EmploymentStatus::Retired),
    ]
}

/// Strategy for consistent claims histories (recent claims never exceed total)
pub fn claims_strategy() -> impl Strategy<Value = ClaimsHistory> {
    (0u32..8, 0u32..8, amount_strategy(0, 300_000), prop::bool::weighted(0.05)).prop_map(
        |(recent, older, amount, fraud)| ClaimsHistory {
            total_claims: recent + older,
            claims_last_3_years: recent,
            total_claimed_amount: if recent + older == 0 { Decimal::ZERO } else { amount },
            fraud_indicators: fraud,
        },
    )
}

pub fn driving_strategy() -> impl Strategy<Value = DrivingRecord> {
    (
        0u32..50,
        0u32..6,
        0u32..6,
        prop::bool::weighted(0.05),
        prop::bool::weighted(0.03),
    )
        .prop_map(|(years, accidents, violations, dui, suspended)| DrivingRecord {
            years_licensed: years,
            accidents_last_5_years: accidents,
            violations_last_3_years: violations,
            dui_history: dui,
            license_suspended: suspended,
        })
}

pub fn property_strategy() -> impl Strategy<Value = PropertyInfo> {
    (
        0u32..120,
        prop_oneof![
            Just(ConstructionType::Wood),
            Just(ConstructionType::Brick),
            Just(ConstructionType::Concrete),
            Just(ConstructionType::Mixed),
        ],
        any::<bool>(),
        1u8..=10,
        prop::bool::weighted(0.2),
    )
        .prop_map(|(age, construction, security, fire_class, flood)| PropertyInfo {
            property_age: age,
            construction_type: construction,
            security_system: security,
            fire_protection_class: fire_class,
            flood_zone: flood,
        })
}

/// Strategy for valid applicants of every insurance type
pub fn applicant_strategy() -> impl Strategy<Value = ApplicantRecord> {
    (
        1u32..1_000_000,
        age_strategy(),
        credit_score_strategy(),
        amount_strategy(0, 400_000),
        employment_strategy(),
        amount_strategy(1_000, 2_000_000),
        claims_strategy(),
        driving_strategy(),
        property_strategy(),
        (any::<bool>(), any::<bool>()),
        0usize..4,
    )
        .prop_map(
            |(id, age, credit, income, employment, coverage, claims, driving, property, health, kind)| {
                let (smoker, conditions) = health;
                let insurance_type = [
                    InsuranceType::Auto,
                    InsuranceType::Home,
                    InsuranceType::Life,
                    InsuranceType::Health,
                ][kind];
                ApplicantRecord {
                    applicant_id: format!("APP-{:07}", id),
                    name: "Test Applicant".to_string(),
                    ssn: None,
                    email: None,
                    phone: None,
                    age,
                    credit_score: credit,
                    annual_income: income,
                    employment_status: employment,
                    insurance_type,
                    coverage_amount: coverage,
                    claims_history: claims,
                    driving_record: (insurance_type == InsuranceType::Auto).then_some(driving),
                    property_info: (insurance_type == InsuranceType::Home).then_some(property),
                    smoker: matches!(insurance_type, InsuranceType::Life | InsuranceType::Health)
                        .then_some(smoker),
                    pre_existing_conditions: (insurance_type == InsuranceType::Health)
                        .then_some(conditions),
                }
            },
        )
}
