//! Training instances as sparse attribute-bags
//!
//! Instances do not share a schema: each carries its own mapping from
//! attribute name to value, and the set of names may differ per instance.
//! The elimination loop mutates these bags in place as attributes are
//! discarded, so the caller's collection reflects every pruning round.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Synthetic attribute-set member representing the no-removal baseline.
///
/// Always present in the working attribute set and never pruned; its loss
/// record is the reference point for the trajectory each iteration.
pub const BASELINE_SENTINEL: &str = "noAttributesRemoved";

/// A single attribute value inside an instance's bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Numeric(f64),
    Categorical(String),
    Boolean(bool),
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Numeric(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Categorical(v.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Boolean(v)
    }
}

/// Sparse mapping from attribute name to value.
pub type AttributeBag = HashMap<String, AttributeValue>;

/// A labeled, weighted attribute-bag.
///
/// Labels are binary (0/1). Weights default to 1.0 and feed every weighted
/// loss computation downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingInstance {
    pub attributes: AttributeBag,
    pub label: i32,
    pub weight: f64,
}

impl TrainingInstance {
    pub fn new(attributes: AttributeBag, label: i32) -> Self {
        Self {
            attributes,
            label,
            weight: 1.0,
        }
    }

    pub fn with_weight(attributes: AttributeBag, label: i32, weight: f64) -> Self {
        Self {
            attributes,
            label,
            weight,
        }
    }
}

/// Collect the union of all attribute names across the training set.
///
/// This seeds the working attribute set for elimination; the baseline
/// sentinel is not included here, the caller adds it.
pub fn attribute_union(instances: &[TrainingInstance]) -> HashSet<String> {
    let mut names = HashSet::new();
    for instance in instances {
        names.extend(instance.attributes.keys().cloned());
    }
    names
}

/// Strip the named attributes from every instance's bag, in place.
///
/// Instances that never carried a given name are left untouched.
pub fn strip_attributes(instances: &mut [TrainingInstance], names: &[String]) {
    for instance in instances.iter_mut() {
        for name in names {
            instance.attributes.remove(name);
        }
    }
}
