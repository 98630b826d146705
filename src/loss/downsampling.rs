//! Log-loss corrected for class down-sampling
//!
//! Training sets for rare-event problems are often built by dropping most
//! instances of the majority class. A model trained on such a set predicts
//! probabilities for the *sampled* distribution; this loss undoes the
//! sampling shift in the odds before scoring, so the reported loss refers
//! to the original distribution.

use super::{log_loss::weighted_log_loss, Direction, LossFunction, Prediction};

/// Log-loss over probabilities corrected for down-sampling of the class
/// opposite `minority_label`, which was dropped with `drop_probability`.
#[derive(Debug, Clone, Copy)]
pub struct DownsamplingCorrectedLogLoss {
    epsilon: f64,
    drop_probability: f64,
    minority_label: i32,
}

impl DownsamplingCorrectedLogLoss {
    pub fn new(epsilon: f64, drop_probability: f64, minority_label: i32) -> Self {
        Self {
            epsilon,
            drop_probability,
            minority_label,
        }
    }

    /// Undo the sampling shift for one predicted positive-class probability.
    ///
    /// With retention `r = 1 - drop_probability` applied to the majority
    /// class, the observed odds differ from the true odds by the factor
    /// `r`; the correction rescales the odds and maps back to a
    /// probability.
    fn correct(&self, probability: f64) -> f64 {
        let retention = 1.0 - self.drop_probability;
        if self.minority_label == 1 {
            // Negatives were down-sampled: observed odds overstate positives
            let scaled = probability * retention;
            scaled / (scaled + (1.0 - probability))
        } else {
            // Positives were down-sampled: observed odds understate positives
            probability / (probability + (1.0 - probability) * retention)
        }
    }
}

impl LossFunction for DownsamplingCorrectedLogLoss {
    fn compute(&self, predictions: &[Prediction]) -> f64 {
        let corrected: Vec<Prediction> = predictions
            .iter()
            .map(|p| Prediction::new(self.correct(p.probability), p.label, p.weight))
            .collect();
        weighted_log_loss(&corrected, self.epsilon)
    }

    fn direction(&self) -> Direction {
        Direction::Minimize
    }
}
