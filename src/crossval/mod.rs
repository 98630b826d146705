//! Cross-validation boundary - per-attribute loss ranking
//!
//! The elimination loop consumes a [`CrossValidator`] purely through
//! [`CrossValidator::attribute_importances`]: one loss record per
//! attribute in the current working set, each scoring a model evaluated
//! with that attribute held out.

mod engine;

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use serde::Serialize;

pub use engine::{KFoldCrossValidator, KFoldCrossValidatorBuilder};

use crate::data::TrainingInstance;
use crate::loss::LossRegistry;
use crate::model::{ModelBuilderFactory, ModelConfig};

/// Losses observed with one attribute held out, keyed by loss-function
/// name. Produced fresh each iteration and consumed immediately; only the
/// pruned attribute set and training data persist across iterations.
#[derive(Debug, Clone, Serialize)]
pub struct AttributeLossRecord {
    pub attribute: String,
    pub losses: BTreeMap<String, f64>,
}

impl AttributeLossRecord {
    pub fn new(attribute: impl Into<String>, losses: BTreeMap<String, f64>) -> Self {
        Self {
            attribute: attribute.into(),
            losses,
        }
    }
}

/// Ranks attributes by the loss a model suffers when each is held out.
///
/// Contract: returns exactly one record per member of `attributes`
/// (the baseline sentinel included), ordered most-important-first: the
/// attributes whose removal costs the most lead, and the tail holds the
/// cheapest removals. Callers are free to re-sort; the elimination loop
/// does so defensively.
pub trait CrossValidator {
    fn attribute_importances(
        &self,
        factory: &dyn ModelBuilderFactory,
        config: &ModelConfig,
        data: &[TrainingInstance],
        primary_loss: &str,
        attributes: &HashSet<String>,
        losses: &LossRegistry,
    ) -> Result<Vec<AttributeLossRecord>>;
}

/// Builds a fresh [`CrossValidator`] for every elimination iteration, so
/// per-run state (fold assignments, progress bars) never leaks between
/// rounds.
pub trait CrossValidatorBuilder {
    fn build(&self) -> Box<dyn CrossValidator>;
}
