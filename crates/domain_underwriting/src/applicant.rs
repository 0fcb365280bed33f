//! Applicant data model
//!
//! An [`ApplicantRecord`] is everything the engine knows about one
//! application. Identity fields (id, name, ssn, email, phone) are owned by the
//! caller and only ever leave the engine through the redactor; scoring looks
//! at the structural fields alone.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Youngest insurable age
pub const MIN_AGE: i32 = 18;
/// Oldest insurable age
pub const MAX_AGE: i32 = 100;
/// Lowest score on the credit scale
pub const MIN_CREDIT_SCORE: i32 = 300;
/// Highest score on the credit scale
pub const MAX_CREDIT_SCORE: i32 = 850;

/// Line of business being applied for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceType {
    Auto,
    Home,
    Life,
    Health,
}

impl InsuranceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsuranceType::Auto => "auto",
            InsuranceType::Home => "home",
            InsuranceType::Life => "life",
            InsuranceType::Health => "health",
        }
    }
}

/// Employment status of the applicant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Employed,
    SelfEmployed,
    Unemployed,
    Retired,
}

/// Primary construction material of an insured property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionType {
    Wood,
    Brick,
    Concrete,
    Mixed,
}

/// Prior claims across all lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimsHistory {
    /// Lifetime number of claims
    pub total_claims: u32,
    /// Claims filed in the last three years
    pub claims_last_3_years: u32,
    /// Lifetime amount claimed
    pub total_claimed_amount: Decimal,
    /// Set when a previous insurer flagged possible fraud
    #[serde(default)]
    pub fraud_indicators: bool,
}

/// Motor vehicle record, present for auto applications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivingRecord {
    pub years_licensed: u32,
    pub accidents_last_5_years: u32,
    pub violations_last_3_years: u32,
    /// DUI/DWI conviction on record
    #[serde(default)]
    pub dui_history: bool,
    #[serde(default)]
    pub license_suspended: bool,
}

/// Insured property, present for home applications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub property_age: u32,
    pub construction_type: ConstructionType,
    #[serde(default)]
    pub security_system: bool,
    /// ISO fire protection class, 1 (best) to 10 (unprotected)
    pub fire_protection_class: u8,
    #[serde(default)]
    pub flood_zone: bool,
}

/// Complete application submitted for underwriting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub applicant_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    pub age: i32,
    pub credit_score: i32,
    pub annual_income: Decimal,
    pub employment_status: EmploymentStatus,

    pub insurance_type: InsuranceType,
    pub coverage_amount: Decimal,
    pub claims_history: ClaimsHistory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driving_record: Option<DrivingRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_info: Option<PropertyInfo>,
    /// Required for life and health applications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoker: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_existing_conditions: Option<bool>,
}

impl ApplicantRecord {
    /// Checks the record invariants
    ///
    /// Returns the first violation found. Checks run in a fixed order so the
    /// same record always reports the same error.
    ///
    /// # Errors
    ///
    /// Returns a [`DataError`] describing the offending field
    pub fn validate(&self) -> Result<(), DataError> {
        if self.applicant_id.trim().is_empty() {
            return Err(DataError::missing("applicant_id"));
        }
        if self.name.trim().chars().count() < 2 {
            return Err(DataError::out_of_range("name", "<redacted>", "at least 2 characters"));
        }
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(DataError::out_of_range(
                "age",
                self.age,
                format!("{}..={}", MIN_AGE, MAX_AGE),
            ));
        }
        if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&self.credit_score) {
            return Err(DataError::out_of_range(
                "credit_score",
                self.credit_score,
                format!("{}..={}", MIN_CREDIT_SCORE, MAX_CREDIT_SCORE),
            ));
        }
        if self.annual_income.is_sign_negative() {
            return Err(DataError::out_of_range("annual_income", self.annual_income, ">= 0"));
        }
        if self.coverage_amount <= Decimal::ZERO {
            return Err(DataError::out_of_range("coverage_amount", self.coverage_amount, "> 0"));
        }

        let claims = &self.claims_history;
        if claims.total_claimed_amount.is_sign_negative() {
            return Err(DataError::out_of_range(
                "claims_history.total_claimed_amount",
                claims.total_claimed_amount,
                ">= 0",
            ));
        }
        if claims.claims_last_3_years > claims.total_claims {
            return Err(DataError::out_of_range(
                "claims_history.claims_last_3_years",
                claims.claims_last_3_years,
                format!("<= total_claims ({})", claims.total_claims),
            ));
        }

        match self.insurance_type {
            InsuranceType::Auto if self.driving_record.is_none() => {
                return Err(DataError::missing("driving_record"));
            }
            InsuranceType::Home => match &self.property_info {
                None => return Err(DataError::missing("property_info")),
                Some(property) if !(1..=10).contains(&property.fire_protection_class) => {
                    return Err(DataError::out_of_range(
                        "property_info.fire_protection_class",
                        property.fire_protection_class,
                        "1..=10",
                    ));
                }
                Some(_) => {}
            },
            InsuranceType::Life | InsuranceType::Health if self.smoker.is_none() => {
                return Err(DataError::missing("smoker"));
            }
            _ => {}
        }

        Ok(())
    }

    /// Years of driving experience
    ///
    /// Falls back to years since the minimum licensing age when no driving
    /// record was supplied.
    pub fn years_licensed(&self) -> u32 {
        match &self.driving_record {
            Some(record) => record.years_licensed,
            None => (self.age - MIN_AGE).max(0) as u32,
        }
    }

    /// Requested coverage as a multiple of annual income
    ///
    /// `None` when the applicant reports no income. A ratio too large to
    /// represent saturates at `Decimal::MAX`.
    pub fn coverage_to_income_ratio(&self) -> Option<Decimal> {
        if self.annual_income.is_zero() {
            None
        } else {
            Some(
                self.coverage_amount
                    .checked_div(self.annual_income)
                    .unwrap_or(Decimal::MAX),
            )
        }
    }
}
