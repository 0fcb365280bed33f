//! Decision tree risk model
//!
//! A shallow CART classifier over the six applicant features. Nodes are kept
//! in a flat vector in pre-order, so a child always sits at a higher index
//! than its parent and traversal cannot loop.
//!
//! Training applies monotone constraints to the high-risk probability: it may
//! only fall as credit score or driving experience rise, and only rise with
//! claims, coverage or violations. Each node carries an admissible output
//! interval; a split on a constrained feature is rejected when its children
//! point the wrong way, and otherwise the interval is cut at the midpoint of
//! the two children so every leaf on one side stays above every leaf on the
//! other. A better credit score can therefore never raise the predicted risk.
//!
//! # Example
//!
//! ```rust,ignore
//! let samples = synthetic_samples(42, 1000);
//! let tree = TreeTrainer::new(5, 20).fit(&samples)?;
//! let leaf = tree.predict(&features_for(&record))?;
//! println!("p(high risk) = {}", leaf.high_risk);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TrainingParams;
use crate::dataset::{RiskLabel, Sample, FEATURE_COUNT};
use crate::error::{ConfigurationError, ModelError};

const CLASS_COUNT: usize = 3;
const MIN_GAIN: f64 = 1e-12;
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Direction the high-risk probability must follow as a feature grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Monotonicity {
    Increasing,
    Decreasing,
    Unconstrained,
}

/// Constraint per feature, in feature vector order
pub const MONOTONE_CONSTRAINTS: [Monotonicity; FEATURE_COUNT] = [
    Monotonicity::Decreasing,    // credit_score
    Monotonicity::Unconstrained, // age
    Monotonicity::Increasing,    // claims_last_3_years
    Monotonicity::Increasing,    // coverage_normalized
    Monotonicity::Decreasing,    // years_licensed
    Monotonicity::Increasing,    // violations_last_3_years
];

/// One node of a fitted tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Samples with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class frequencies of the training samples in this leaf
        class_probabilities: [f64; CLASS_COUNT],
        /// Probability of high risk after monotone bounding
        high_risk: f64,
    },
}

/// Output of a tree for one feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafValue {
    pub class_probabilities: [f64; CLASS_COUNT],
    pub high_risk: f64,
}

impl LeafValue {
    /// Most likely class
    pub fn predicted_label(&self) -> RiskLabel {
        let mut best = 0;
        for (index, probability) in self.class_probabilities.iter().enumerate() {
            if *probability > self.class_probabilities[best] {
                best = index;
            }
        }
        RiskLabel::from_index(best).unwrap_or(RiskLabel::Decline)
    }
}

/// Fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub feature_count: usize,
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Checks the structural invariants of a tree loaded from outside
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidModel`] describing the first defect
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.feature_count != FEATURE_COUNT {
            return Err(ConfigurationError::invalid_model(format!(
                "tree expects {} features, engine provides {}",
                self.feature_count, FEATURE_COUNT
            )));
        }
        if self.nodes.is_empty() {
            return Err(ConfigurationError::invalid_model("tree has no nodes"));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= self.feature_count {
                        return Err(ConfigurationError::invalid_model(format!(
                            "node {} splits on unknown feature {}",
                            index, feature
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ConfigurationError::invalid_model(format!(
                            "node {} has a non-finite threshold",
                            index
                        )));
                    }
                    for child in [left, right] {
                        if *child <= index || *child >= self.nodes.len() {
                            return Err(ConfigurationError::invalid_model(format!(
                                "node {} has invalid child {}",
                                index, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf {
                    class_probabilities,
                    high_risk,
                } => {
                    let in_unit = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);
                    let total: f64 = class_probabilities.iter().sum();
                    if !class_probabilities.iter().all(|p| in_unit(*p))
                        || (total - 1.0).abs() > PROBABILITY_TOLERANCE
                        || !in_unit(*high_risk)
                    {
                        return Err(ConfigurationError::invalid_model(format!(
                            "leaf {} holds invalid probabilities",
                            index
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    /// Walks the tree for one feature vector
    ///
    /// # Errors
    ///
    /// - [`ModelError::FeatureMismatch`] if `features` has the wrong length
    /// - [`ModelError::Unavailable`] if the tree is structurally broken
    pub fn predict(&self, features: &[f64]) -> Result<LeafValue, ModelError> {
        if features.len() != self.feature_count {
            return Err(ModelError::FeatureMismatch {
                expected: self.feature_count,
                actual: features.len(),
            });
        }

        let mut index = 0;
        // Children always have higher indices, so this visits each node at most once
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features
                        .get(*feature)
                        .ok_or_else(|| ModelError::Unavailable("split on missing feature".into()))?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf {
                    class_probabilities,
                    high_risk,
                }) => {
                    return Ok(LeafValue {
                        class_probabilities: *class_probabilities,
                        high_risk: *high_risk,
                    });
                }
                None => break,
            }
        }
        Err(ModelError::Unavailable("tree traversal left the node table".into()))
    }

    /// Fraction of samples whose most likely class matches their label
    pub fn accuracy(&self, samples: &[Sample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let correct = samples
            .iter()
            .filter(|sample| {
                self.predict(&sample.features)
                    .map(|leaf| leaf.predicted_label() == sample.label)
                    .unwrap_or(false)
            })
            .count();
        correct as f64 / samples.len() as f64
    }
}

type ClassCounts = [usize; CLASS_COUNT];

fn class_counts(samples: &[Sample], indices: &[usize]) -> ClassCounts {
    let mut counts = [0; CLASS_COUNT];
    for &i in indices {
        counts[samples[i].label.index()] += 1;
    }
    counts
}

fn gini(counts: &ClassCounts) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// P(decline) + half of P(conditions)
fn high_risk_probability(counts: &ClassCounts) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.5;
    }
    (counts[RiskLabel::Decline.index()] as f64
        + 0.5 * counts[RiskLabel::ApproveWithConditions.index()] as f64)
        / total as f64
}

/// Admissible interval for a node's high-risk output
#[derive(Debug, Clone, Copy)]
struct Bounds {
    lower: f64,
    upper: f64,
}

impl Bounds {
    const UNIT: Bounds = Bounds {
        lower: 0.0,
        upper: 1.0,
    };

    fn clamp(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }
}

#[derive(Debug, Clone, Copy)]
struct CandidateSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
    left_risk: f64,
    right_risk: f64,
}

/// CART trainer with gini impurity and monotone constraints
#[derive(Debug, Clone)]
pub struct TreeTrainer {
    max_depth: usize,
    min_samples_split: usize,
    constraints: [Monotonicity; FEATURE_COUNT],
}

impl TreeTrainer {
    pub fn new(max_depth: usize, min_samples_split: usize) -> Self {
        Self {
            max_depth,
            min_samples_split,
            constraints: MONOTONE_CONSTRAINTS,
        }
    }

    pub fn from_params(params: &TrainingParams) -> Self {
        Self::new(params.max_depth, params.min_samples_split)
    }

    /// Overrides the per-feature constraints
    pub fn with_constraints(mut self, constraints: [Monotonicity; FEATURE_COUNT]) -> Self {
        self.constraints = constraints;
        self
    }

    /// Fits a tree to `samples`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidModel`] when there is nothing to fit
    pub fn fit(&self, samples: &[Sample]) -> Result<DecisionTree, ConfigurationError> {
        if samples.is_empty() {
            return Err(ConfigurationError::invalid_model("no training samples"));
        }

        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..samples.len()).collect();
        self.grow(samples, indices, 0, Bounds::UNIT, &mut nodes);

        let tree = DecisionTree {
            feature_count: FEATURE_COUNT,
            nodes,
        };
        debug!(
            nodes = tree.nodes.len(),
            leaves = tree.leaf_count(),
            "Decision tree fitted"
        );
        Ok(tree)
    }

    /// Appends the subtree for `indices` and returns its root index
    fn grow(
        &self,
        samples: &[Sample],
        indices: Vec<usize>,
        depth: usize,
        bounds: Bounds,
        nodes: &mut Vec<TreeNode>,
    ) -> usize {
        let counts = class_counts(samples, &indices);
        let index = nodes.len();
        nodes.push(Self::leaf(&counts, bounds));

        if depth >= self.max_depth || indices.len() < self.min_samples_split || gini(&counts) == 0.0
        {
            return index;
        }
        let Some(split) = self.best_split(samples, &indices, &counts, bounds) else {
            return index;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| samples[i].features[split.feature] <= split.threshold);

        let (left_bounds, right_bounds) = self.child_bounds(&split, bounds);
        let left = self.grow(samples, left_indices, depth + 1, left_bounds, nodes);
        let right = self.grow(samples, right_indices, depth + 1, right_bounds, nodes);

        nodes[index] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    fn leaf(counts: &ClassCounts, bounds: Bounds) -> TreeNode {
        let total = counts.iter().sum::<usize>().max(1) as f64;
        TreeNode::Leaf {
            class_probabilities: counts.map(|c| c as f64 / total),
            high_risk: bounds.clamp(high_risk_probability(counts)),
        }
    }

    fn child_bounds(&self, split: &CandidateSplit, bounds: Bounds) -> (Bounds, Bounds) {
        let mid = (split.left_risk + split.right_risk) / 2.0;
        let low_side = Bounds {
            lower: bounds.lower,
            upper: bounds.upper.min(mid),
        };
        let high_side = Bounds {
            lower: bounds.lower.max(mid),
            upper: bounds.upper,
        };
        match self.constraints[split.feature] {
            Monotonicity::Increasing => (low_side, high_side),
            Monotonicity::Decreasing => (high_side, low_side),
            Monotonicity::Unconstrained => (bounds, bounds),
        }
    }

    fn best_split(
        &self,
        samples: &[Sample],
        indices: &[usize],
        parent: &ClassCounts,
        bounds: Bounds,
    ) -> Option<CandidateSplit> {
        let parent_gini = gini(parent);
        let n = indices.len() as f64;
        let mut best: Option<CandidateSplit> = None;
        let mut sorted = indices.to_vec();

        for feature in 0..FEATURE_COUNT {
            let value = |i: usize| samples[i].features[feature];
            sorted.sort_by(|&a, &b| value(a).total_cmp(&value(b)));

            let mut left = [0; CLASS_COUNT];
            let mut right = *parent;
            for position in 1..sorted.len() {
                let moved = samples[sorted[position - 1]].label.index();
                left[moved] += 1;
                right[moved] -= 1;

                let below = value(sorted[position - 1]);
                let above = value(sorted[position]);
                if below >= above {
                    continue;
                }

                let left_n = position as f64;
                let right_n = n - left_n;
                let gain = parent_gini - (left_n * gini(&left) + right_n * gini(&right)) / n;
                if gain <= MIN_GAIN || best.is_some_and(|b| gain <= b.gain) {
                    continue;
                }

                let left_risk = bounds.clamp(high_risk_probability(&left));
                let right_risk = bounds.clamp(high_risk_probability(&right));
                let admissible = match self.constraints[feature] {
                    Monotonicity::Increasing => left_risk <= right_risk,
                    Monotonicity::Decreasing => left_risk >= right_risk,
                    Monotonicity::Unconstrained => true,
                };
                if !admissible {
                    continue;
                }

                let mut threshold = below + (above - below) / 2.0;
                if threshold >= above {
                    threshold = below;
                }
                best = Some(CandidateSplit {
                    feature,
                    threshold,
                    gain,
                    left_risk,
                    right_risk,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic_samples;

    fn trained() -> (DecisionTree, Vec<Sample>) {
        let samples = synthetic_samples(42, 1000);
        let tree = TreeTrainer::new(5, 20).fit(&samples).unwrap();
        (tree, samples)
    }

    fn leaf(high_risk: f64) -> TreeNode {
        TreeNode::Leaf {
            class_probabilities: [1.0 - high_risk, 0.0, high_risk],
            high_risk,
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let (first, _) = trained();
        let (second, _) = trained();
        assert_eq!(first, second);
    }

    #[test]
    fn test_trained_tree_is_valid_and_useful() {
        let (tree, samples) = trained();
        assert_eq!(tree.validate(), Ok(()));
        assert!(tree.leaf_count() > 1);
        assert!(tree.accuracy(&samples) > 0.5);
    }

    #[test]
    fn test_high_risk_never_rises_with_credit() {
        let (tree, samples) = trained();
        for sample in samples.iter().take(100) {
            let mut features = sample.features;
            let mut previous = f64::INFINITY;
            for credit in (300..=850).step_by(10) {
                features[0] = f64::from(credit);
                let risk = tree.predict(&features).unwrap().high_risk;
                assert!(risk <= previous + 1e-12, "risk rose at credit {}", credit);
                previous = risk;
            }
        }
    }

    #[test]
    fn test_high_risk_never_falls_with_claims() {
        let (tree, samples) = trained();
        for sample in samples.iter().take(100) {
            let mut features = sample.features;
            let mut previous = f64::NEG_INFINITY;
            for claims in 0..10 {
                features[2] = f64::from(claims);
                let risk = tree.predict(&features).unwrap().high_risk;
                assert!(risk + 1e-12 >= previous);
                previous = risk;
            }
        }
    }

    #[test]
    fn test_split_against_constraint_is_rejected() {
        // Risk rises with credit here, which the credit constraint forbids
        let samples: Vec<Sample> = (0..40)
            .map(|i| {
                let credit = 300.0 + 10.0 * f64::from(i);
                Sample {
                    features: [credit, 40.0, 0.0, 0.5, 10.0, 0.0],
                    label: if i < 20 { RiskLabel::Approve } else { RiskLabel::Decline },
                }
            })
            .collect();

        let tree = TreeTrainer::new(5, 2).fit(&samples).unwrap();
        assert_eq!(tree.nodes.len(), 1);

        let unconstrained = TreeTrainer::new(5, 2)
            .with_constraints([Monotonicity::Unconstrained; FEATURE_COUNT])
            .fit(&samples)
            .unwrap();
        assert_eq!(unconstrained.leaf_count(), 2);
    }

    #[test]
    fn test_predict_walks_left_on_equal() {
        let tree = DecisionTree {
            feature_count: FEATURE_COUNT,
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 600.0, left: 1, right: 2 },
                leaf(0.8),
                leaf(0.1),
            ],
        };
        assert_eq!(tree.validate(), Ok(()));
        assert_eq!(tree.predict(&[600.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap().high_risk, 0.8);
        assert_eq!(tree.predict(&[601.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap().high_risk, 0.1);
    }

    #[test]
    fn test_feature_mismatch() {
        let tree = DecisionTree { feature_count: FEATURE_COUNT, nodes: vec![leaf(0.2)] };
        assert_eq!(
            tree.predict(&[1.0, 2.0]),
            Err(ModelError::FeatureMismatch { expected: 6, actual: 2 })
        );
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let tree = DecisionTree {
            feature_count: FEATURE_COUNT,
            nodes: vec![
                leaf(0.2),
                TreeNode::Split { feature: 0, threshold: 1.0, left: 0, right: 0 },
            ],
        };
        assert!(matches!(tree.validate(), Err(ConfigurationError::InvalidModel(_))));
    }

    #[test]
    fn test_validate_rejects_bad_probabilities() {
        let tree = DecisionTree {
            feature_count: FEATURE_COUNT,
            nodes: vec![TreeNode::Leaf { class_probabilities: [0.5, 0.5, 0.5], high_risk: 0.2 }],
        };
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_serialized_form_is_tagged() {
        let tree = DecisionTree { feature_count: FEATURE_COUNT, nodes: vec![leaf(0.25)] };
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["nodes"][0]["kind"], "leaf");
        let back: DecisionTree = serde_json::from_value(json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_empty_training_set_rejected() {
        assert!(TreeTrainer::new(5, 20).fit(&[]).is_err());
    }
}
