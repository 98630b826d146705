//! Weighted logarithmic loss

use super::{Direction, LossFunction, Prediction};

/// Weighted negative log-likelihood of the observed labels.
///
/// Probabilities are clamped to `[epsilon, 1 - epsilon]` before taking
/// logs so a confidently wrong model scores a large finite penalty rather
/// than infinity.
#[derive(Debug, Clone, Copy)]
pub struct LogLoss {
    epsilon: f64,
}

impl LogLoss {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl Default for LogLoss {
    fn default() -> Self {
        Self::new(super::DEFAULT_LOG_LOSS_EPSILON)
    }
}

impl LossFunction for LogLoss {
    fn compute(&self, predictions: &[Prediction]) -> f64 {
        weighted_log_loss(predictions, self.epsilon)
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }
}

pub(crate) fn weighted_log_loss(predictions: &[Prediction], epsilon: f64) -> f64 {
    let total_weight: f64 = predictions.iter().map(|p| p.weight).sum();
    if total_weight <= 0.0 {
        // Empty or zero-weight pool: neutral score, not NaN
        return 0.0;
    }

    let mut loss = 0.0;
    for p in predictions {
        let prob = p.probability.clamp(epsilon, 1.0 - epsilon);
        let term = if p.label == 1 {
            prob.ln()
        } else {
            (1.0 - prob).ln()
        };
        loss -= p.weight * term;
    }

    loss / total_weight
}
