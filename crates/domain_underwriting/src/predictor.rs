//! Risk predictor and model registry
//!
//! The predictor answers one question per applicant: how likely is this
//! application to be high risk? It reads from an immutable
//! [`RiskModelSnapshot`]. The [`ModelRegistry`] owns the current snapshot and
//! hands out `Arc` clones, so a reload never disturbs evaluations already in
//! flight: they finish on the snapshot they started with.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = ModelRegistry::from_source(&ModelSource::default())?;
//! let snapshot = registry.snapshot();
//! match snapshot.predict(&record) {
//!     Ok(prediction) => println!("p(high) = {}", prediction.high_risk),
//!     Err(e) => println!("degraded: {}", e),
//! }
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::applicant::ApplicantRecord;
use crate::config::ModelSource;
use crate::dataset::{features_for, synthetic_samples, RiskLabel};
use crate::error::{ConfigurationError, ModelError};
use crate::model::{DecisionTree, TreeTrainer};

/// Version reported when no model is installed
pub const UNAVAILABLE_VERSION: &str = "unavailable";

/// Probability substituted when the model cannot answer
pub const NEUTRAL_HIGH_RISK: f64 = 0.5;

/// Model output for one applicant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Probability that the applicant is high risk, in [0, 1]
    pub high_risk: f64,
    pub class_probabilities: [f64; 3],
    /// Most likely underwriting class
    pub label: RiskLabel,
}

/// Immutable, versioned model parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RiskModelSnapshot {
    version: String,
    tree: Option<DecisionTree>,
    training_accuracy: Option<f64>,
}

impl RiskModelSnapshot {
    /// Trains or loads the model described by `source`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the parameters are invalid or
    /// training produced nothing usable
    pub fn build(source: &ModelSource) -> Result<Self, ConfigurationError> {
        source.validate()?;
        match source {
            ModelSource::Train(params) => {
                let samples = synthetic_samples(params.seed, params.samples);
                let tree = TreeTrainer::from_params(params).fit(&samples)?;
                let accuracy = tree.accuracy(&samples);
                let version = params.version();
                info!(
                    model_version = %version,
                    training_accuracy = accuracy,
                    leaves = tree.leaf_count(),
                    "Risk model trained"
                );
                Ok(Self {
                    version,
                    tree: Some(tree),
                    training_accuracy: Some(accuracy),
                })
            }
            ModelSource::Pretrained { version, tree } => {
                info!(model_version = %version, "Risk model loaded from parameters");
                Ok(Self {
                    version: version.clone(),
                    tree: Some(tree.clone()),
                    training_accuracy: None,
                })
            }
            ModelSource::Disabled => {
                warn!("Risk model disabled; every decision will be ML-degraded");
                Ok(Self::unavailable())
            }
        }
    }

    /// Snapshot without a model
    pub fn unavailable() -> Self {
        Self {
            version: UNAVAILABLE_VERSION.to_string(),
            tree: None,
            training_accuracy: None,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Accuracy on the training data, when the model was trained here
    pub fn training_accuracy(&self) -> Option<f64> {
        self.training_accuracy
    }

    pub fn is_available(&self) -> bool {
        self.tree.is_some()
    }

    /// Predicts the high-risk probability for `record`
    ///
    /// # Errors
    ///
    /// - [`ModelError::Unavailable`] when no model is installed
    /// - [`ModelError::FeatureMismatch`] when the model was fitted on another feature layout
    pub fn predict(&self, record: &ApplicantRecord) -> Result<Prediction, ModelError> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| ModelError::Unavailable(format!("no model installed ({})", self.version)))?;

        let leaf = tree.predict(&features_for(record))?;
        Ok(Prediction {
            high_risk: leaf.high_risk.clamp(0.0, 1.0),
            class_probabilities: leaf.class_probabilities,
            label: leaf.predicted_label(),
        })
    }
}

/// Holder of the current model snapshot
///
/// Readers take an `Arc` clone and release the lock immediately. A reload
/// builds the replacement completely before the pointer is swapped.
#[derive(Debug)]
pub struct ModelRegistry {
    current: RwLock<Arc<RiskModelSnapshot>>,
}

impl ModelRegistry {
    pub fn new(snapshot: RiskModelSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Builds the registry from a model source
    ///
    /// # Errors
    ///
    /// Propagates the [`ConfigurationError`] from [`RiskModelSnapshot::build`]
    pub fn from_source(source: &ModelSource) -> Result<Self, ConfigurationError> {
        Ok(Self::new(RiskModelSnapshot::build(source)?))
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<RiskModelSnapshot> {
        // A poisoned lock still guards a fully built snapshot
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the snapshot with one built from `source`
    ///
    /// On error the current snapshot stays installed.
    ///
    /// # Errors
    ///
    /// Propagates the [`ConfigurationError`] from [`RiskModelSnapshot::build`]
    pub fn reload(&self, source: &ModelSource) -> Result<(), ConfigurationError> {
        let next = RiskModelSnapshot::build(source)?;
        self.install(next);
        Ok(())
    }

    /// Swaps in an already built snapshot
    pub fn install(&self, snapshot: RiskModelSnapshot) {
        let version = snapshot.version.clone();
        let next = Arc::new(snapshot);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *current, next);
        drop(current);
        info!(
            previous_version = %previous.version,
            model_version = %version,
            "Risk model swapped"
        );
    }
}
