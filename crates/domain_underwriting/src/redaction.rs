//! PII redaction
//!
//! Applicant identity never reaches a log line or an audit sink in the clear.
//! Identifiers are replaced by truncated SHA-256 digests (stable, so the same
//! applicant can be correlated across log lines) and names and SSNs are
//! masked. Redaction is total: it cannot fail and does not feed scoring.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::applicant::{ApplicantRecord, InsuranceType};

/// Hex characters kept from each digest
const HASH_LEN: usize = 12;

const MASKED_SSN: &str = "XXX-XX-XXXX";

/// Log-safe projection of an applicant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactedApplicant {
    /// Digest of the applicant id
    pub applicant_ref: String,
    pub name_hash: String,
    pub masked_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_ssn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_hash: Option<String>,
    pub insurance_type: InsuranceType,
    /// Decade of age, e.g. "30-39"
    pub age_band: String,
}

/// Redacts `record`
pub fn redact(record: &ApplicantRecord) -> RedactedApplicant {
    RedactedApplicant {
        applicant_ref: applicant_ref(&record.applicant_id),
        name_hash: hash12(record.name.trim()),
        masked_name: mask_name(&record.name),
        masked_ssn: record.ssn.as_deref().map(mask_ssn),
        email_hash: record
            .email
            .as_deref()
            .map(|email| hash12(&email.trim().to_lowercase())),
        phone_hash: record.phone.as_deref().map(|phone| {
            let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
            hash12(&digits)
        }),
        insurance_type: record.insurance_type,
        age_band: age_band(record.age),
    }
}

/// Stable reference for an applicant id
pub fn applicant_ref(applicant_id: &str) -> String {
    hash12(applicant_id)
}

/// First 12 hex characters of the SHA-256 digest of `value`
pub fn hash12(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(HASH_LEN);
    hex
}

/// Keeps the first letter of each name part
///
/// ```rust,ignore
/// assert_eq!(mask_name("John Smith"), "J*** S****");
/// ```
pub fn mask_name(name: &str) -> String {
    name.split_whitespace()
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    let mut masked = String::with_capacity(part.len());
                    masked.push(first);
                    masked.extend(chars.map(|_| '*'));
                    masked
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps the last four digits of an SSN
pub fn mask_ssn(ssn: &str) -> String {
    let digits: Vec<char> = ssn.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return MASKED_SSN.to_string();
    }
    let last4: String = digits[digits.len() - 4..].iter().collect();
    format!("XXX-XX-{}", last4)
}

/// Decade band for an age
pub fn age_band(age: i32) -> String {
    let start = age.max(0) / 10 * 10;
    format!("{}-{}", start, start + 9)
}
