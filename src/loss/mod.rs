//! Loss functions - named, pluggable prediction-quality metrics
//!
//! The elimination loop never computes a loss itself; it references loss
//! functions by name through a [`LossRegistry`] and consumes the scalar
//! values the cross-validation engine produced under each name.

mod auc;
mod downsampling;
mod log_loss;

use std::collections::BTreeMap;

pub use auc::WeightedAuc;
pub use downsampling::DownsamplingCorrectedLogLoss;
pub use log_loss::LogLoss;

/// One pooled out-of-fold prediction: the model's probability of the
/// positive class, the observed label and the sample weight.
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub probability: f64,
    pub label: i32,
    pub weight: f64,
}

impl Prediction {
    pub fn new(probability: f64, label: i32, weight: f64) -> Self {
        Self {
            probability,
            label,
            weight,
        }
    }
}

/// Whether lower or higher values of a loss indicate a better model.
///
/// AUC is higher-is-better; the ranking key handles the sign instead of
/// assuming a uniform convention across metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Minimize,
    Maximize,
}

/// A scalar prediction-quality metric.
///
/// Implementations must return a neutral finite value for an empty
/// prediction slice so degenerate (empty training set) runs complete
/// without error.
pub trait LossFunction: Send + Sync {
    fn compute(&self, predictions: &[Prediction]) -> f64;

    fn direction(&self) -> Direction {
        Direction::Minimize
    }
}

/// Reference epsilon for probability clamping in log-loss variants.
pub(crate) const DEFAULT_LOG_LOSS_EPSILON: f64 = 1e-6;

/// Ordered mapping from loss-function name to implementation.
///
/// The registry supplied by the caller is authoritative: the elimination
/// loop evaluates exactly these losses every iteration and never swaps in
/// its own set. [`LossRegistry::standard`] is the opt-in default trio.
#[derive(Default)]
pub struct LossRegistry {
    entries: BTreeMap<String, Box<dyn LossFunction>>,
}

impl LossRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three standard losses: plain log-loss, weighted AUC and
    /// log-loss corrected for down-sampling (drop probability 0.99,
    /// minority label 0).
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("LogLoss", LogLoss::new(DEFAULT_LOG_LOSS_EPSILON));
        registry.register("AUC", WeightedAuc::new());
        registry.register(
            "LogLossCorrectedForDownSampling",
            DownsamplingCorrectedLogLoss::new(DEFAULT_LOG_LOSS_EPSILON, 0.99, 0),
        );
        registry
    }

    pub fn register(&mut self, name: &str, loss: impl LossFunction + 'static) {
        self.entries.insert(name.to_string(), Box::new(loss));
    }

    pub fn get(&self, name: &str) -> Option<&dyn LossFunction> {
        self.entries.get(name).map(|b| b.as_ref())
    }

    pub fn direction(&self, name: &str) -> Option<Direction> {
        self.get(name).map(|l| l.direction())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn LossFunction)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
