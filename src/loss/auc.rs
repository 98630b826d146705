//! Weighted area under the ROC curve

use super::{Direction, LossFunction, Prediction};

/// Weighted AUC via the weighted Mann-Whitney U statistic.
///
/// Tie groups share their average weighted rank, so heavily quantized
/// scores (binned models, constant predictions) are handled correctly.
/// Degenerate pools (empty, or single-class) score 0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedAuc;

impl WeightedAuc {
    pub fn new() -> Self {
        Self
    }
}

impl LossFunction for WeightedAuc {
    fn compute(&self, predictions: &[Prediction]) -> f64 {
        let mut sorted: Vec<(f64, i32, f64)> = predictions
            .iter()
            .map(|p| (p.probability, p.label, p.weight))
            .collect();
        sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        weighted_auc(&sorted)
    }

    fn direction(&self) -> Direction {
        Direction::Maximize
    }
}

/// Weighted Mann-Whitney AUC over (score, target, weight) tuples sorted by
/// score ascending.
fn weighted_auc(sorted_tuples: &[(f64, i32, f64)]) -> f64 {
    if sorted_tuples.is_empty() {
        return 0.5;
    }

    let total_pos: f64 = sorted_tuples
        .iter()
        .filter(|(_, t, _)| *t == 1)
        .map(|(_, _, w)| w)
        .sum();
    let total_neg: f64 = sorted_tuples
        .iter()
        .filter(|(_, t, _)| *t == 0)
        .map(|(_, _, w)| w)
        .sum();

    if total_pos <= 0.0 || total_neg <= 0.0 {
        return 0.5;
    }

    let n = sorted_tuples.len();
    let mut weighted_rank_sum_pos = 0.0;
    let mut cumulative_weight = 0.0;
    let mut i = 0;

    while i < n {
        let current_value = sorted_tuples[i].0;
        let mut j = i;

        // Find all ties with the same score
        while j < n && (sorted_tuples[j].0 - current_value).abs() < 1e-10 {
            j += 1;
        }

        let group_weight: f64 = sorted_tuples[i..j].iter().map(|(_, _, w)| w).sum();

        // Members of a tie group share the weighted midpoint rank
        let avg_rank = cumulative_weight + group_weight / 2.0;

        for k in i..j {
            if sorted_tuples[k].1 == 1 {
                weighted_rank_sum_pos += avg_rank * sorted_tuples[k].2;
            }
        }

        cumulative_weight += group_weight;
        i = j;
    }

    let u = weighted_rank_sum_pos - total_pos * total_pos / 2.0;

    (u / (total_pos * total_neg)).clamp(0.0, 1.0)
}
