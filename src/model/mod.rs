//! Model layer - the trainable-model-family boundary
//!
//! The elimination loop never inspects a model; it forwards an opaque
//! [`ModelBuilderFactory`] handle to the cross-validation engine, which
//! builds and trains models per fold through these seams.

mod enriched;
mod naive_bayes;

use std::collections::BTreeMap;

use anyhow::Result;

use crate::data::{AttributeBag, TrainingInstance};

pub use enriched::{AttributeEnricher, EnrichedModel};
pub use naive_bayes::{NaiveBayesBuilder, NaiveBayesFactory, NaiveBayesModel};

/// Opaque, string-keyed configuration passed through to the factory.
///
/// Values are JSON so callers can carry whatever their model family needs;
/// typed getters cover the common cases.
#[derive(Debug, Clone, Default)]
pub struct ModelConfig {
    entries: BTreeMap<String, serde_json::Value>,
}

impl ModelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<serde_json::Value>) -> &mut Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.entries.get(key).and_then(|v| v.as_f64())
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.entries.get(key).and_then(|v| v.as_u64()).map(|v| v as usize)
    }
}

/// A trained model: maps an attribute-bag to the probability of the
/// positive class.
pub trait PredictiveModel: Send + Sync {
    fn predict(&self, attributes: &AttributeBag) -> f64;
}

/// Trains one model from a slice of instances.
pub trait ModelBuilder: Send + Sync {
    fn train(&self, instances: &[TrainingInstance]) -> Result<Box<dyn PredictiveModel>>;
}

/// Abstracts the trainable model family. Built fresh per fold so training
/// state never leaks between folds.
pub trait ModelBuilderFactory: Send + Sync {
    fn build_builder(&self, config: &ModelConfig) -> Result<Box<dyn ModelBuilder>>;
}
