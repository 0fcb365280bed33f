use rust_decimal_macros::dec;

use crate::applicant::{ApplicantRecord, ClaimsHistory, DrivingRecord, EmploymentStatus, InsuranceType};

/// Auto applicant with a clean record, credit 750, age 35
pub(crate) fn clean_auto() -> ApplicantRecord {
    ApplicantRecord {
        applicant_id: "APP-2025-001".to_string(),
        name: "John Smith".to_string(),
        ssn: None,
        email: None,
        phone: None,
        age: 35,
        credit_score: 750,
        annual_income: dec!(75000),
        employment_status: EmploymentStatus::Employed,
        insurance_type: InsuranceType::Auto,
        coverage_amount: dec!(100000),
        claims_history: ClaimsHistory {
            total_claims: 0,
            claims_last_3_years: 0,
            total_claimed_amount: dec!(0),
            fraud_indicators: false,
        },
        driving_record: Some(DrivingRecord {
            years_licensed: 15,
            accidents_last_5_years: 0,
            violations_last_3_years: 0,
            dui_history: false,
            license_suspended: false,
        }),
        property_info: None,
        smoker: None,
        pre_existing_conditions: None,
    }
}
