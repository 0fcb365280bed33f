//! Custom Test Assertions
//!
//! Provides assertion helpers for decisions and score breakdowns that give
//! more meaningful failure messages than plain `assert!`.

use domain_underwriting::{Decision, Outcome, ScoreBreakdown, ScoreComponent};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Asserts that every sub-score lies within `[0, cap]` and the total is their sum
///
/// # Panics
///
/// Panics naming the first component out of range, or the mismatched total
pub fn assert_breakdown_within_caps(breakdown: &ScoreBreakdown) {
    for component in ScoreComponent::ALL {
        let value = breakdown.component(component);
        assert!(
            value >= Decimal::ZERO && value <= component.cap(),
            "Sub-score {} out of range: {} (cap {})",
            component,
            value,
            component.cap()
        );
    }

    let sum = breakdown.credit() + breakdown.claims() + breakdown.age() + breakdown.rules() + breakdown.ml();
    assert_eq!(
        breakdown.total(), sum,
        "Total {} is not the sum of its parts ({})",
        breakdown.total(), sum
    );
    assert!(
        breakdown.total() >= Decimal::ZERO && breakdown.total() <= dec!(100),
        "Total out of range: {}",
        breakdown.total()
    );
}

/// Asserts a decision's outcome, showing its reasons on failure
pub fn assert_outcome(decision: &Decision, expected: Outcome) {
    assert_eq!(
        decision.outcome, expected,
        "Expected {} but got {} (reasons: {:?}, score: {:?})",
        expected,
        decision.outcome,
        decision.reasons,
        decision.score_breakdown.map(|b| b.total())
    );
}

/// Asserts that a decision came from the hard rules with exactly `rules` as reasons
pub fn assert_declined_by_rules(decision: &Decision, rules: &[&str]) {
    assert_outcome(decision, Outcome::Declined);
    assert_eq!(decision.reasons, rules, "Unexpected decline reasons");
    assert!(
        decision.score_breakdown.is_none(),
        "A hard-rule decline must not carry a score breakdown"
    );
}

/// Asserts that the decision's JSON form carries no raw identity
pub fn assert_no_identity_leak(decision: &Decision, forbidden: &[&str]) {
    let json = serde_json::to_string(decision).unwrap_or_default();
    for value in forbidden {
        assert!(
            !json.contains(value),
            "Decision output leaks identifying value {:?}",
            value
        );
    }
}
