//! Recursive feature elimination orchestrator
//!
//! Drives a fixed number of elimination rounds. Each round asks the
//! cross-validation engine for a per-attribute loss ranking over the
//! current working set, then prunes the attributes whose removal costs
//! the least from both the working set and every training instance's
//! bag, in place. The baseline sentinel and any protected attributes are
//! never pruned.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use console::style;

use crate::crossval::{AttributeLossRecord, CrossValidator, CrossValidatorBuilder};
use crate::data::{attribute_union, strip_attributes, TrainingInstance, BASELINE_SENTINEL};
use crate::loss::{Direction, LossRegistry};
use crate::model::{ModelBuilderFactory, ModelConfig};
use crate::report::{EliminationReport, IterationRecord, RankedLoss};

use super::EliminationError;

/// Runs the elimination loop against a caller-owned training set.
#[derive(Debug, Clone, Default)]
pub struct RecursiveEliminator {
    protected: HashSet<String>,
    verbose: bool,
}

impl RecursiveEliminator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes that are never removed, regardless of rank.
    pub fn with_protected(protected: HashSet<String>) -> Self {
        Self {
            protected,
            verbose: false,
        }
    }

    /// Trace per-round baseline and attribute losses to the console.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run `iterations` elimination rounds over `data`.
    ///
    /// Each round builds a fresh cross-validator, ranks the current
    /// working set (attribute-name union of `data` plus the baseline
    /// sentinel), and, on every round but the last, removes the
    /// `floor(removal_fraction × set size)` attributes whose removal
    /// costs the least, skipping protected names and the sentinel.
    ///
    /// `data` is pruned **in place**: after `run` returns, every
    /// instance's bag reflects all removals, and it stays pruned if a
    /// later round fails. The supplied loss registry is authoritative;
    /// every registered loss is evaluated each round and `primary_loss`
    /// selects the ranking key (its direction decides the sign).
    ///
    /// # Arguments
    /// * `validator_builder` - builds one cross-validator per round
    /// * `factory` - opaque model-family handle, forwarded to the engine
    /// * `config` - opaque model configuration, forwarded to the engine
    /// * `data` - caller-owned training instances, mutated in place
    /// * `iterations` - number of rounds; the final round only ranks
    /// * `removal_fraction` - fraction of the working set pruned per round, in [0, 1]
    /// * `primary_loss` - name of the loss used as the ranking key
    /// * `losses` - named loss functions evaluated every round
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        validator_builder: &dyn CrossValidatorBuilder,
        factory: &dyn ModelBuilderFactory,
        config: &ModelConfig,
        data: &mut [TrainingInstance],
        iterations: usize,
        removal_fraction: f64,
        primary_loss: &str,
        losses: &LossRegistry,
    ) -> Result<EliminationReport> {
        validate_config(iterations, removal_fraction)?;

        let mut attributes = attribute_union(data);
        attributes.insert(BASELINE_SENTINEL.to_string());

        let mut report = EliminationReport::new(primary_loss);
        let mut ranking: Vec<AttributeLossRecord> = Vec::new();

        for iteration in 1..=iterations {
            let validator = validator_builder.build();
            ranking = validator
                .attribute_importances(factory, config, data, primary_loss, &attributes, losses)
                .with_context(|| format!("cross-validation failed on round {}", iteration))?;

            // Defensive: do not trust the collaborator's order; stable
            // sort keeps its order only as the tie-break
            sort_most_important_first(&mut ranking, primary_loss, losses)?;

            let removed = if iteration < iterations {
                self.prune(&ranking, &mut attributes, data, removal_fraction)
            } else {
                Vec::new()
            };

            let baseline = baseline_losses(&ranking).cloned().unwrap_or_default();
            if self.verbose {
                self.trace_round(iteration, iterations, &ranking, &baseline, &removed, primary_loss);
            }

            report.push_iteration(IterationRecord {
                iteration,
                attributes_evaluated: ranking.len(),
                baseline_losses: baseline,
                ranked_losses: ranking
                    .iter()
                    .map(|r| RankedLoss {
                        attribute: r.attribute.clone(),
                        // Presence checked during the sort above
                        loss: r.losses[primary_loss],
                    })
                    .collect(),
                removed,
            });
        }

        report.set_outcome(ranking, attributes.into_iter().collect());
        Ok(report)
    }

    /// Remove the worst `floor(removal_fraction × set size)` attributes:
    /// the tail of the ranking, where removal costs the least. Protected
    /// names and the sentinel are skipped, the scan range saturates when
    /// the removal count exceeds the set size, and every removal is
    /// applied to both the working set and the instances so the two never
    /// diverge.
    fn prune(
        &self,
        ranking: &[AttributeLossRecord],
        attributes: &mut HashSet<String>,
        data: &mut [TrainingInstance],
        removal_fraction: f64,
    ) -> Vec<String> {
        let count = (removal_fraction * attributes.len() as f64).floor() as usize;
        let start = ranking.len().saturating_sub(count);

        let mut removed = Vec::new();
        for record in ranking[start..].iter().rev() {
            let name = &record.attribute;
            if name == BASELINE_SENTINEL || self.protected.contains(name) {
                continue;
            }
            if attributes.remove(name) {
                removed.push(name.clone());
            }
        }

        // The sentinel is unconditionally retained
        attributes.insert(BASELINE_SENTINEL.to_string());

        strip_attributes(data, &removed);
        removed
    }

    fn trace_round(
        &self,
        iteration: usize,
        iterations: usize,
        ranking: &[AttributeLossRecord],
        baseline: &BTreeMap<String, f64>,
        removed: &[String],
        primary_loss: &str,
    ) {
        println!(
            "{} round {}/{}: {} attributes in play",
            style("▸").cyan().bold(),
            iteration,
            iterations,
            ranking.len()
        );

        let baseline_line: Vec<String> = baseline
            .iter()
            .map(|(name, value)| format!("{}={:.6}", name, value))
            .collect();
        println!("    baseline: {}", baseline_line.join("  "));

        for record in ranking {
            println!(
                "    {} {}: {:.6}",
                style("•").dim(),
                record.attribute,
                record.losses[primary_loss]
            );
        }

        if !removed.is_empty() {
            println!(
                "    {} removed: {}",
                style("✂").yellow(),
                removed.join(", ")
            );
        }
    }
}

fn validate_config(iterations: usize, removal_fraction: f64) -> Result<(), EliminationError> {
    if iterations < 1 {
        return Err(EliminationError::Configuration(
            "iterations must be at least 1".to_string(),
        ));
    }
    if !removal_fraction.is_finite() || !(0.0..=1.0).contains(&removal_fraction) {
        return Err(EliminationError::Configuration(format!(
            "removal_fraction must be within [0, 1], got {}",
            removal_fraction
        )));
    }
    Ok(())
}

/// Stable-sort the ranking most-important-first under the primary key:
/// highest held-out loss leads for minimized losses, lowest value leads
/// for maximized ones. Fails if the key is missing from the registry or
/// any record.
fn sort_most_important_first(
    ranking: &mut [AttributeLossRecord],
    primary_loss: &str,
    losses: &LossRegistry,
) -> Result<(), EliminationError> {
    let direction = losses
        .direction(primary_loss)
        .ok_or_else(|| EliminationError::LossFunctionNotFound(primary_loss.to_string()))?;

    for record in ranking.iter() {
        if !record.losses.contains_key(primary_loss) {
            return Err(EliminationError::LossFunctionNotFound(
                primary_loss.to_string(),
            ));
        }
    }

    ranking.sort_by(|a, b| {
        let la = a.losses[primary_loss];
        let lb = b.losses[primary_loss];
        let ord = la.partial_cmp(&lb).unwrap_or(Ordering::Equal);
        match direction {
            Direction::Minimize => ord.reverse(),
            Direction::Maximize => ord,
        }
    });

    Ok(())
}

/// The no-removal baseline record for a round, scanned from the tail.
fn baseline_losses(ranking: &[AttributeLossRecord]) -> Option<&BTreeMap<String, f64>> {
    ranking
        .iter()
        .rev()
        .find(|r| r.attribute == BASELINE_SENTINEL)
        .map(|r| &r.losses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::{LossFunction, Prediction};

    struct ConstantLoss;
    impl LossFunction for ConstantLoss {
        fn compute(&self, _predictions: &[Prediction]) -> f64 {
            1.0
        }
    }

    fn record(name: &str, loss: f64) -> AttributeLossRecord {
        let mut losses = BTreeMap::new();
        losses.insert("L".to_string(), loss);
        AttributeLossRecord::new(name, losses)
    }

    fn registry() -> LossRegistry {
        let mut registry = LossRegistry::new();
        registry.register("L", ConstantLoss);
        registry
    }

    #[test]
    fn test_validate_config_rejects_zero_iterations() {
        let err = validate_config(0, 0.2).unwrap_err();
        assert!(matches!(err, EliminationError::Configuration(_)));
    }

    #[test]
    fn test_validate_config_rejects_bad_fractions() {
        assert!(validate_config(3, -0.1).is_err());
        assert!(validate_config(3, 1.1).is_err());
        assert!(validate_config(3, f64::NAN).is_err());
        assert!(validate_config(3, 0.0).is_ok());
        assert!(validate_config(3, 1.0).is_ok());
    }

    #[test]
    fn test_sort_puts_costly_removals_first() {
        let mut ranking = vec![record("cheap", 0.1), record("costly", 0.9), record("mid", 0.5)];
        sort_most_important_first(&mut ranking, "L", &registry()).unwrap();

        let order: Vec<&str> = ranking.iter().map(|r| r.attribute.as_str()).collect();
        assert_eq!(order, vec!["costly", "mid", "cheap"]);
    }

    #[test]
    fn test_sort_respects_maximize_direction() {
        struct Auc;
        impl LossFunction for Auc {
            fn compute(&self, _predictions: &[Prediction]) -> f64 {
                0.5
            }
            fn direction(&self) -> Direction {
                Direction::Maximize
            }
        }

        let mut registry = LossRegistry::new();
        registry.register("L", Auc);

        // For a maximized metric the lowest value means the costliest removal
        let mut ranking = vec![record("cheap", 0.9), record("costly", 0.5)];
        sort_most_important_first(&mut ranking, "L", &registry).unwrap();

        let order: Vec<&str> = ranking.iter().map(|r| r.attribute.as_str()).collect();
        assert_eq!(order, vec!["costly", "cheap"]);
    }

    #[test]
    fn test_sort_missing_key_is_typed_failure() {
        let mut ranking = vec![record("a", 0.1)];
        let err = sort_most_important_first(&mut ranking, "F1", &registry()).unwrap_err();
        assert!(matches!(err, EliminationError::LossFunctionNotFound(name) if name == "F1"));
    }

    #[test]
    fn test_baseline_losses_found_from_tail() {
        let ranking = vec![record("a", 0.9), record(BASELINE_SENTINEL, 0.4), record("b", 0.1)];
        let baseline = baseline_losses(&ranking).unwrap();
        assert!((baseline["L"] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_baseline_losses_absent() {
        let ranking = vec![record("a", 0.9)];
        assert!(baseline_losses(&ranking).is_none());
    }

    #[test]
    fn test_prune_skips_sentinel_and_protected() {
        let mut protected = HashSet::new();
        protected.insert("keep".to_string());
        let eliminator = RecursiveEliminator::with_protected(protected);

        let ranking = vec![
            record("a", 0.9),
            record("keep", 0.3),
            record(BASELINE_SENTINEL, 0.2),
            record("b", 0.1),
        ];
        let mut attributes: HashSet<String> = ranking
            .iter()
            .map(|r| r.attribute.clone())
            .collect();
        let mut data: Vec<TrainingInstance> = Vec::new();

        // Tail of 3 covers keep, sentinel and b; only b may go
        let removed = eliminator.prune(&ranking, &mut attributes, &mut data, 0.75);

        assert_eq!(removed, vec!["b".to_string()]);
        assert!(attributes.contains("keep"));
        assert!(attributes.contains(BASELINE_SENTINEL));
        assert!(attributes.contains("a"));
    }

    #[test]
    fn test_prune_saturates_when_count_exceeds_size() {
        let eliminator = RecursiveEliminator::new();
        let ranking = vec![record(BASELINE_SENTINEL, 0.9), record("a", 0.5), record("b", 0.1)];
        let mut attributes: HashSet<String> = ranking.iter().map(|r| r.attribute.clone()).collect();
        let mut data: Vec<TrainingInstance> = Vec::new();

        let removed = eliminator.prune(&ranking, &mut attributes, &mut data, 1.0);

        assert_eq!(removed.len(), 2);
        assert_eq!(attributes.len(), 1);
        assert!(attributes.contains(BASELINE_SENTINEL));
    }
}
