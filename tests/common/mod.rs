//! Shared test utilities and fixture generators

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use rand::prelude::*;

use winnower::crossval::{AttributeLossRecord, CrossValidator, CrossValidatorBuilder};
use winnower::data::{AttributeBag, AttributeValue, TrainingInstance};
use winnower::loss::LossRegistry;
use winnower::model::{ModelBuilderFactory, ModelConfig};
use winnower::BASELINE_SENTINEL;

/// Instances that all carry the same named numeric attributes, labels
/// alternating 0/1.
pub fn uniform_instances(attribute_names: &[&str], rows: usize) -> Vec<TrainingInstance> {
    (0..rows)
        .map(|i| {
            let bag: AttributeBag = attribute_names
                .iter()
                .map(|name| (name.to_string(), AttributeValue::from(i as f64)))
                .collect();
            TrainingInstance::new(bag, (i % 2) as i32)
        })
        .collect()
}

/// Synthetic binary-classification data: one categorical attribute that
/// tracks the label plus `noise_attrs` random categorical attributes.
pub fn synthetic_classification(
    rows: usize,
    noise_attrs: usize,
    seed: u64,
) -> Vec<TrainingInstance> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..rows)
        .map(|i| {
            let label = (i % 2) as i32;
            let mut bag = AttributeBag::new();
            bag.insert(
                "signal".to_string(),
                AttributeValue::from(if label == 1 { "on" } else { "off" }),
            );
            for n in 0..noise_attrs {
                let value = if rng.gen::<bool>() { "x" } else { "y" };
                bag.insert(format!("noise_{}", n), AttributeValue::from(value));
            }
            TrainingInstance::new(bag, label)
        })
        .collect()
}

/// Union of attribute names actually present across instances.
pub fn names_in_instances(instances: &[TrainingInstance]) -> HashSet<String> {
    let mut names = HashSet::new();
    for instance in instances {
        names.extend(instance.attributes.keys().cloned());
    }
    names
}

/// A cross-validator with predetermined per-attribute importances.
///
/// Each record carries every registered loss name with the scripted value
/// for that attribute (unknown attributes default to 0.5, the sentinel to
/// `sentinel_loss`). Every call's working set is captured for assertions.
#[derive(Clone)]
pub struct ScriptedRanker {
    importances: HashMap<String, f64>,
    sentinel_loss: f64,
    fail_after: Option<usize>,
    pub calls: Arc<Mutex<Vec<HashSet<String>>>>,
}

impl ScriptedRanker {
    /// Higher loss = more important (the scripted metric is minimized).
    pub fn new(importances: &[(&str, f64)]) -> Self {
        Self {
            importances: importances
                .iter()
                .map(|(name, loss)| (name.to_string(), *loss))
                .collect(),
            sentinel_loss: 0.5,
            fail_after: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Place the sentinel at a chosen spot in the scripted ranking.
    pub fn with_sentinel_loss(mut self, loss: f64) -> Self {
        self.sentinel_loss = loss;
        self
    }

    /// Succeed for the first `calls` rounds, then fail.
    pub fn fail_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn working_sets(&self) -> Vec<HashSet<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn loss_for(&self, attribute: &str) -> f64 {
        if attribute == BASELINE_SENTINEL {
            self.sentinel_loss
        } else {
            self.importances.get(attribute).copied().unwrap_or(0.5)
        }
    }
}

impl CrossValidator for ScriptedRanker {
    fn attribute_importances(
        &self,
        _factory: &dyn ModelBuilderFactory,
        _config: &ModelConfig,
        _data: &[TrainingInstance],
        _primary_loss: &str,
        attributes: &HashSet<String>,
        losses: &LossRegistry,
    ) -> Result<Vec<AttributeLossRecord>> {
        self.calls.lock().unwrap().push(attributes.clone());

        if let Some(limit) = self.fail_after {
            if self.call_count() > limit {
                bail!("scripted collaborator failure")
            }
        }

        let mut records: Vec<AttributeLossRecord> = attributes
            .iter()
            .map(|name| {
                let value = self.loss_for(name);
                let loss_map: BTreeMap<String, f64> = losses
                    .names()
                    .map(|loss_name| (loss_name.to_string(), value))
                    .collect();
                AttributeLossRecord::new(name.as_str(), loss_map)
            })
            .collect();

        // Most-important-first under a minimized metric
        records.sort_by(|a, b| {
            self.loss_for(&b.attribute)
                .partial_cmp(&self.loss_for(&a.attribute))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(records)
    }
}

impl CrossValidatorBuilder for ScriptedRanker {
    fn build(&self) -> Box<dyn CrossValidator> {
        Box::new(self.clone())
    }
}

/// A cross-validator that always fails, for collaborator-failure tests.
pub struct FailingRanker;

impl CrossValidator for FailingRanker {
    fn attribute_importances(
        &self,
        _factory: &dyn ModelBuilderFactory,
        _config: &ModelConfig,
        _data: &[TrainingInstance],
        _primary_loss: &str,
        _attributes: &HashSet<String>,
        _losses: &LossRegistry,
    ) -> Result<Vec<AttributeLossRecord>> {
        bail!("fold executor ran out of memory")
    }
}

impl CrossValidatorBuilder for FailingRanker {
    fn build(&self) -> Box<dyn CrossValidator> {
        Box::new(FailingRanker)
    }
}

/// Registry with a single minimized loss named `L`, for scripted tests.
pub fn single_loss_registry() -> LossRegistry {
    use winnower::loss::{LossFunction, Prediction};

    struct Flat;
    impl LossFunction for Flat {
        fn compute(&self, _predictions: &[Prediction]) -> f64 {
            0.0
        }
    }

    let mut registry = LossRegistry::new();
    registry.register("L", Flat);
    registry
}
