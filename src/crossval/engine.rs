//! K-fold leave-one-attribute-out cross-validation engine

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::data::{TrainingInstance, BASELINE_SENTINEL};
use crate::loss::{Direction, LossRegistry, Prediction};
use crate::model::{ModelBuilderFactory, ModelConfig};
use crate::utils::create_progress_bar;

use super::{AttributeLossRecord, CrossValidator, CrossValidatorBuilder};

/// Default number of folds.
const DEFAULT_FOLDS: usize = 4;

/// Builds [`KFoldCrossValidator`]s with a fixed fold count and shuffle
/// seed, one per elimination iteration.
#[derive(Debug, Clone, Copy)]
pub struct KFoldCrossValidatorBuilder {
    folds: usize,
    seed: u64,
    show_progress: bool,
}

impl KFoldCrossValidatorBuilder {
    pub fn new(folds: usize, seed: u64) -> Self {
        Self {
            folds: folds.max(2),
            seed,
            show_progress: true,
        }
    }

    pub fn show_progress(mut self, visible: bool) -> Self {
        self.show_progress = visible;
        self
    }
}

impl Default for KFoldCrossValidatorBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_FOLDS, 0)
    }
}

impl CrossValidatorBuilder for KFoldCrossValidatorBuilder {
    fn build(&self) -> Box<dyn CrossValidator> {
        Box::new(KFoldCrossValidator {
            folds: self.folds,
            seed: self.seed,
            show_progress: self.show_progress,
        })
    }
}

/// K-fold cross-validator scoring each attribute by holding it out.
///
/// For every attribute in the working set a fresh model is trained per
/// fold on data with that attribute masked; out-of-fold predictions are
/// pooled and scored under every registered loss. The sentinel masks
/// nothing, so its record is the no-removal baseline. Attribute
/// evaluations run in parallel.
pub struct KFoldCrossValidator {
    folds: usize,
    seed: u64,
    show_progress: bool,
}

impl CrossValidator for KFoldCrossValidator {
    fn attribute_importances(
        &self,
        factory: &dyn ModelBuilderFactory,
        config: &ModelConfig,
        data: &[TrainingInstance],
        primary_loss: &str,
        attributes: &HashSet<String>,
        losses: &LossRegistry,
    ) -> Result<Vec<AttributeLossRecord>> {
        // Fixed name order so fold evaluation and tie-breaks are
        // reproducible for a given seed
        let mut names: Vec<&String> = attributes.iter().collect();
        names.sort();

        let fold_of = self.assign_folds(data.len());

        let pb = create_progress_bar(
            names.len() as u64,
            "Scoring attributes",
            self.show_progress,
        );

        let mut records: Vec<AttributeLossRecord> = names
            .par_iter()
            .map(|name| {
                let held_out = if name.as_str() == BASELINE_SENTINEL {
                    None
                } else {
                    Some(name.as_str())
                };

                let record = self
                    .evaluate_attribute(factory, config, data, &fold_of, held_out, losses)
                    .map(|loss_map| AttributeLossRecord::new(name.as_str(), loss_map))
                    .with_context(|| format!("evaluating attribute '{}'", name));

                pb.inc(1);
                record
            })
            .collect::<Result<Vec<_>>>()?;

        pb.finish_and_clear();

        sort_most_important_first(&mut records, primary_loss, losses);

        Ok(records)
    }
}

impl KFoldCrossValidator {
    /// Seeded shuffle of instance indices into round-robin folds.
    fn assign_folds(&self, len: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let mut fold_of = vec![0usize; len];
        for (position, &index) in indices.iter().enumerate() {
            fold_of[index] = position % self.folds;
        }
        fold_of
    }

    /// Pool out-of-fold predictions with `held_out` masked, then score the
    /// pool under every registered loss.
    fn evaluate_attribute(
        &self,
        factory: &dyn ModelBuilderFactory,
        config: &ModelConfig,
        data: &[TrainingInstance],
        fold_of: &[usize],
        held_out: Option<&str>,
        losses: &LossRegistry,
    ) -> Result<BTreeMap<String, f64>> {
        let mut pooled: Vec<Prediction> = Vec::with_capacity(data.len());

        for fold in 0..self.folds {
            let train: Vec<TrainingInstance> = data
                .iter()
                .enumerate()
                .filter(|(i, _)| fold_of[*i] != fold)
                .map(|(_, instance)| mask_attribute(instance, held_out))
                .collect();

            let test: Vec<&TrainingInstance> = data
                .iter()
                .enumerate()
                .filter(|(i, _)| fold_of[*i] == fold)
                .map(|(_, instance)| instance)
                .collect();

            if test.is_empty() {
                continue;
            }

            let builder = factory.build_builder(config)?;
            let model = builder.train(&train)?;

            for instance in test {
                let masked = mask_attribute(instance, held_out);
                pooled.push(Prediction::new(
                    model.predict(&masked.attributes),
                    instance.label,
                    instance.weight,
                ));
            }
        }

        let mut loss_map = BTreeMap::new();
        for (name, loss) in losses.iter() {
            loss_map.insert(name.to_string(), loss.compute(&pooled));
        }
        Ok(loss_map)
    }
}

fn mask_attribute(instance: &TrainingInstance, held_out: Option<&str>) -> TrainingInstance {
    let mut copy = instance.clone();
    if let Some(name) = held_out {
        copy.attributes.remove(name);
    }
    copy
}

/// Order records most-important-first under the primary ranking key:
/// for minimized losses the highest held-out loss leads, for maximized
/// ones the lowest value leads. Unknown primary names leave the records
/// in name order; the caller surfaces that as a lookup failure.
fn sort_most_important_first(
    records: &mut [AttributeLossRecord],
    primary_loss: &str,
    losses: &LossRegistry,
) {
    let direction = match losses.direction(primary_loss) {
        Some(direction) => direction,
        None => return,
    };

    records.sort_by(|a, b| {
        let la = a.losses.get(primary_loss).copied().unwrap_or(0.0);
        let lb = b.losses.get(primary_loss).copied().unwrap_or(0.0);
        let ord = la.partial_cmp(&lb).unwrap_or(Ordering::Equal);
        match direction {
            Direction::Minimize => ord.reverse(),
            Direction::Maximize => ord,
        }
    });
}
