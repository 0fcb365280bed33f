//! Test Data Builders
//!
//! Provides a builder for applicant records with sensible defaults. Tests
//! set only the fields they care about; everything else describes a clean,
//! valid auto applicant.

use domain_underwriting::{
    ApplicantRecord, ClaimsHistory, ConstructionType, DrivingRecord, EmploymentStatus,
    InsuranceType, PropertyInfo,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Builder for [`ApplicantRecord`] test data
#[derive(Debug, Clone)]
pub struct ApplicantRecordBuilder {
    record: ApplicantRecord,
}

impl Default for ApplicantRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicantRecordBuilder {
    /// Creates a builder for a clean auto applicant (credit 750, age 35)
    pub fn new() -> Self {
        Self {
            record: ApplicantRecord {
                applicant_id: "APP-TEST-001".to_string(),
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
                    total_claimed_amount: Decimal::ZERO,
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
            },
        }
    }

    /// Sets the applicant ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.record.applicant_id = id.into();
        self
    }

    /// Sets the applicant name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.record.name = name.into();
        self
    }

    /// Sets the identifying contact fields
    pub fn with_identity(
        mut self,
        ssn: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        self.record.ssn = Some(ssn.into());
        self.record.email = Some(email.into());
        self.record.phone = Some(phone.into());
        self
    }

    pub fn with_age(mut self, age: i32) -> Self {
        self.record.age = age;
        self
    }

    pub fn with_credit_score(mut self, credit_score: i32) -> Self {
        self.record.credit_score = credit_score;
        self
    }

    pub fn with_income(mut self, income: Decimal) -> Self {
        self.record.annual_income = income;
        self
    }

    pub fn with_employment(mut self, status: EmploymentStatus) -> Self {
        self.record.employment_status = status;
        self
    }

    pub fn with_coverage(mut self, coverage: Decimal) -> Self {
        self.record.coverage_amount = coverage;
        self
    }

    /// Sets the claim counts and the lifetime amount claimed
    pub fn with_claims(mut self, total: u32, last_3_years: u32, amount: Decimal) -> Self {
        self.record.claims_history.total_claims = total;
        self.record.claims_history.claims_last_3_years = last_3_years;
        self.record.claims_history.total_claimed_amount = amount;
        self
    }

    pub fn with_fraud_indicators(mut self, flagged: bool) -> Self {
        self.record.claims_history.fraud_indicators = flagged;
        self
    }

    /// Sets the driving record counters, creating the record if absent
    pub fn with_driving(mut self, years_licensed: u32, accidents: u32, violations: u32) -> Self {
        let driving = self.driving_mut();
        driving.years_licensed = years_licensed;
        driving.accidents_last_5_years = accidents;
        driving.violations_last_3_years = violations;
        self
    }

    pub fn with_dui(mut self, dui: bool) -> Self {
        self.driving_mut().dui_history = dui;
        self
    }

    pub fn with_suspended_license(mut self, suspended: bool) -> Self {
        self.driving_mut().license_suspended = suspended;
        self
    }

    /// Switches to a home application with the given property
    pub fn home(mut self, property: PropertyInfo) -> Self {
        self.record.insurance_type = InsuranceType::Home;
        self.record.driving_record = None;
        self.record.property_info = Some(property);
        self
    }

    /// Switches to a life application
    pub fn life(mut self, smoker: bool) -> Self {
        self.record.insurance_type = InsuranceType::Life;
        self.record.driving_record = None;
        self.record.smoker = Some(smoker);
        self
    }

    /// Switches to a health application
    pub fn health(mut self, smoker: bool, pre_existing_conditions: bool) -> Self {
        self.record.insurance_type = InsuranceType::Health;
        self.record.driving_record = None;
        self.record.smoker = Some(smoker);
        self.record.pre_existing_conditions = Some(pre_existing_conditions);
        self
    }

    /// Drops the driving record without changing the insurance type
    pub fn without_driving_record(mut self) -> Self {
        self.record.driving_record = None;
        self
    }

    /// Builds the record
    pub fn build(self) -> ApplicantRecord {
        self.record
    }

    fn driving_mut(&mut self) -> &mut DrivingRecord {
        self.record.driving_record.get_or_insert(DrivingRecord {
            years_licensed: 0,
            accidents_last_5_years: 0,
            violations_last_3_years: 0,
            dui_history: false,
            license_suspended: false,
        })
    }
}

/// Property with no soft-rule findings
pub fn sound_property() -> PropertyInfo {
    PropertyInfo {
        property_age: 15,
        construction_type: ConstructionType::Brick,
        security_system: true,
        fire_protection_class: 3,
        flood_zone: false,
    }
}
