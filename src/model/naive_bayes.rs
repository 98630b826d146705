//! Weighted naive Bayes over attribute-bags
//!
//! The in-tree trainable model family: categorical values are used
//! directly, numeric values are quantile-binned at train time, and all
//! likelihoods are Laplace-smoothed weighted counts. Simple enough to
//! train thousands of times per elimination run, discriminative enough
//! for a leave-one-attribute-out loss to move when an informative
//! attribute disappears.

use std::collections::HashMap;

use anyhow::Result;

use super::{ModelBuilder, ModelBuilderFactory, ModelConfig, PredictiveModel};
use crate::data::{AttributeBag, AttributeValue, TrainingInstance};

/// Default Laplace smoothing constant for likelihood estimates.
const DEFAULT_SMOOTHING: f64 = 0.5;

/// Default number of quantile bins for numeric attributes.
const DEFAULT_NUMERIC_BINS: usize = 4;

/// Factory for [`NaiveBayesBuilder`]; reads `smoothing` and
/// `numeric_bins` from the model configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveBayesFactory;

impl ModelBuilderFactory for NaiveBayesFactory {
    fn build_builder(&self, config: &ModelConfig) -> Result<Box<dyn ModelBuilder>> {
        Ok(Box::new(NaiveBayesBuilder {
            smoothing: config.get_f64("smoothing").unwrap_or(DEFAULT_SMOOTHING),
            numeric_bins: config.get_usize("numeric_bins").unwrap_or(DEFAULT_NUMERIC_BINS),
        }))
    }
}

/// Trains a [`NaiveBayesModel`] from weighted instances.
#[derive(Debug, Clone, Copy)]
pub struct NaiveBayesBuilder {
    smoothing: f64,
    numeric_bins: usize,
}

impl NaiveBayesBuilder {
    pub fn new(smoothing: f64, numeric_bins: usize) -> Self {
        Self {
            smoothing,
            numeric_bins,
        }
    }
}

impl Default for NaiveBayesBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING, DEFAULT_NUMERIC_BINS)
    }
}

#[derive(Debug, Clone, Default)]
struct ValueCounts {
    events: f64,
    non_events: f64,
}

#[derive(Debug, Clone)]
struct AttributeLikelihoods {
    /// Quantile cut points for numeric values; empty when the attribute
    /// never carried a numeric value in training.
    bin_edges: Vec<f64>,
    /// Precomputed ln(P(value | event) / P(value | non-event)).
    value_log_ratios: HashMap<String, f64>,
    /// Log ratio applied to values never seen in training.
    unseen_log_ratio: f64,
}

/// A trained weighted naive Bayes classifier.
pub struct NaiveBayesModel {
    prior_log_odds: f64,
    attributes: HashMap<String, AttributeLikelihoods>,
}

impl ModelBuilder for NaiveBayesBuilder {
    fn train(&self, instances: &[TrainingInstance]) -> Result<Box<dyn PredictiveModel>> {
        let smoothing = self.smoothing;

        let total_events: f64 = instances
            .iter()
            .filter(|i| i.label == 1)
            .map(|i| i.weight)
            .sum();
        let total_non_events: f64 = instances
            .iter()
            .filter(|i| i.label != 1)
            .map(|i| i.weight)
            .sum();

        let prior_log_odds =
            ((total_events + smoothing) / (total_non_events + smoothing)).ln();

        // Pass 1: per-attribute numeric samples, for quantile bin edges
        let mut numeric_samples: HashMap<&str, Vec<f64>> = HashMap::new();
        for instance in instances {
            for (name, value) in &instance.attributes {
                if let AttributeValue::Numeric(v) = value {
                    if v.is_finite() {
                        numeric_samples.entry(name.as_str()).or_default().push(*v);
                    }
                }
            }
        }

        let mut bin_edges: HashMap<String, Vec<f64>> = HashMap::new();
        for (name, mut samples) in numeric_samples {
            samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            bin_edges.insert(name.to_string(), quantile_edges(&samples, self.numeric_bins));
        }

        // Pass 2: weighted value counts per attribute
        let mut counts: HashMap<String, HashMap<String, ValueCounts>> = HashMap::new();
        for instance in instances {
            for (name, value) in &instance.attributes {
                let edges = bin_edges.get(name).map(|e| e.as_slice()).unwrap_or(&[]);
                let key = discretize(value, edges);
                let entry = counts
                    .entry(name.clone())
                    .or_default()
                    .entry(key)
                    .or_default();
                if instance.label == 1 {
                    entry.events += instance.weight;
                } else {
                    entry.non_events += instance.weight;
                }
            }
        }

        let mut attributes = HashMap::with_capacity(counts.len());
        for (name, value_counts) in counts {
            let distinct = value_counts.len() as f64;
            let event_norm = total_events + smoothing * distinct;
            let non_event_norm = total_non_events + smoothing * distinct;

            let value_log_ratios = value_counts
                .into_iter()
                .map(|(key, c)| {
                    let ratio = ((c.events + smoothing) / event_norm)
                        / ((c.non_events + smoothing) / non_event_norm);
                    (key, ratio.ln())
                })
                .collect();

            let unseen_log_ratio =
                ((smoothing / event_norm) / (smoothing / non_event_norm)).ln();

            let edges = bin_edges.remove(&name).unwrap_or_default();
            attributes.insert(
                name,
                AttributeLikelihoods {
                    bin_edges: edges,
                    value_log_ratios,
                    unseen_log_ratio,
                },
            );
        }

        Ok(Box::new(NaiveBayesModel {
            prior_log_odds,
            attributes,
        }))
    }
}

impl PredictiveModel for NaiveBayesModel {
    fn predict(&self, attributes: &AttributeBag) -> f64 {
        let mut log_odds = self.prior_log_odds;

        // Attributes absent from the bag, or never seen in training,
        // contribute no evidence
        for (name, likelihoods) in &self.attributes {
            if let Some(value) = attributes.get(name) {
                let key = discretize(value, &likelihoods.bin_edges);
                log_odds += likelihoods
                    .value_log_ratios
                    .get(&key)
                    .copied()
                    .unwrap_or(likelihoods.unseen_log_ratio);
            }
        }

        sigmoid(log_odds)
    }
}

fn sigmoid(log_odds: f64) -> f64 {
    1.0 / (1.0 + (-log_odds).exp())
}

/// Interior quantile cut points over sorted samples.
fn quantile_edges(sorted_samples: &[f64], bins: usize) -> Vec<f64> {
    if sorted_samples.is_empty() || bins < 2 {
        return Vec::new();
    }

    let n = sorted_samples.len();
    let mut edges = Vec::with_capacity(bins - 1);
    for i in 1..bins {
        let idx = (i * n / bins).min(n - 1);
        let edge = sorted_samples[idx];
        if edges.last().map_or(true, |&last: &f64| edge > last) {
            edges.push(edge);
        }
    }
    edges
}

/// Map an attribute value to a discrete likelihood key.
fn discretize(value: &AttributeValue, bin_edges: &[f64]) -> String {
    match value {
        AttributeValue::Categorical(s) => s.clone(),
        AttributeValue::Boolean(b) => b.to_string(),
        AttributeValue::Numeric(v) => {
            let bin = bin_edges.iter().take_while(|&&edge| *v >= edge).count();
            format!("bin{}", bin)
        }
    }
}
