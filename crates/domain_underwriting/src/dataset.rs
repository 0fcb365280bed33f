//! Features and synthetic training data for the risk model
//!
//! The risk model is trained on a fixed synthetic population. Generation is
//! seeded, so the same [`TrainingParams`](crate::config::TrainingParams)
//! always produce the same dataset and therefore the same tree.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::applicant::ApplicantRecord;

/// Number of model input features
pub const FEATURE_COUNT: usize = 6;

/// Feature names, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "credit_score",
    "age",
    "claims_last_3_years",
    "coverage_normalized",
    "years_licensed",
    "violations_last_3_years",
];

/// Coverage at or above this amount normalizes to 1.0
const COVERAGE_NORMALIZER: Decimal = dec!(100000);

/// Model input for one applicant
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Training label: what an experienced underwriter would have done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    Approve = 0,
    ApproveWithConditions = 1,
    Decline = 2,
}

impl RiskLabel {
    pub const ALL: [RiskLabel; 3] = [
        RiskLabel::Approve,
        RiskLabel::ApproveWithConditions,
        RiskLabel::Decline,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// One labelled training example
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: FeatureVector,
    pub label: RiskLabel,
}

/// Extracts the model features from an applicant
pub fn features_for(record: &ApplicantRecord) -> FeatureVector {
    let coverage_normalized = (record.coverage_amount / COVERAGE_NORMALIZER)
        .min(Decimal::ONE)
        .to_f64()
        .unwrap_or(1.0);
    let violations = record
        .driving_record
        .as_ref()
        .map(|driving| driving.violations_last_3_years)
        .unwrap_or(0);

    [
        f64::from(record.credit_score),
        f64::from(record.age),
        f64::from(record.claims_history.claims_last_3_years),
        coverage_normalized,
        f64::from(record.years_licensed()),
        f64::from(violations),
    ]
}

/// Labels a feature vector with the reference underwriting guideline
///
/// Points accumulate for weak credit, frequent claims, youth, high
/// coverage, inexperience and violations; five or more points decline and
/// three or more approve with conditions.
pub fn reference_label(features: &FeatureVector) -> RiskLabel {
    let [credit_score, age, claims, coverage, years_licensed, violations] = *features;
    let mut points = 0;

    if credit_score < 600.0 {
        points += 3;
    } else if credit_score < 700.0 {
        points += 1;
    }

    if claims > 3.0 {
        points += 2;
    } else if claims > 1.0 {
        points += 1;
    }

    if age < 25.0 {
        points += 1;
    }
    if coverage > 0.8 {
        points += 1;
    }
    if years_licensed < 3.0 {
        points += 1;
    }
    if violations > 2.0 {
        points += 1;
    }

    match points {
        p if p >= 5 => RiskLabel::Decline,
        p if p >= 3 => RiskLabel::ApproveWithConditions,
        _ => RiskLabel::Approve,
    }
}

/// Draws from a Poisson distribution (Knuth's method, fine for small means)
fn poisson(rng: &mut Pcg64Mcg, mean: f64) -> u32 {
    let limit = (-mean).exp();
    let mut k = 0;
    let mut p = 1.0;
    loop {
        p *= rng.gen::<f64>();
        if p <= limit {
            return k;
        }
        k += 1;
    }
}

/// Generates the synthetic training population
pub fn synthetic_samples(seed: u64, count: usize) -> Vec<Sample> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let features = [
                f64::from(rng.gen_range(300i32..850)),
                f64::from(rng.gen_range(18i32..80)),
                f64::from(poisson(&mut rng, 1.5)),
                rng.gen::<f64>(),
                f64::from(rng.gen_range(0u32..50)),
                f64::from(poisson(&mut rng, 0.8)),
            ];
            Sample {
                features,
                label: reference_label(&features),
            }
        })
        .collect()
}
