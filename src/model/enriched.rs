//! Attribute-enrichment decorator
//!
//! Wraps another predictive model and rewrites the attribute-bag through a
//! chain of enrichers before delegating prediction. Lets derived
//! attributes (ratios, interactions, lookups) be injected without the
//! wrapped model knowing.

use crate::data::AttributeBag;

use super::PredictiveModel;

/// Transforms an attribute-bag into an enriched one.
pub trait AttributeEnricher: Send + Sync {
    fn enrich(&self, attributes: &AttributeBag) -> AttributeBag;
}

impl<F> AttributeEnricher for F
where
    F: Fn(&AttributeBag) -> AttributeBag + Send + Sync,
{
    fn enrich(&self, attributes: &AttributeBag) -> AttributeBag {
        self(attributes)
    }
}

/// A predictive model that applies enrichers in order, then delegates to
/// the wrapped model.
pub struct EnrichedModel {
    wrapped: Box<dyn PredictiveModel>,
    enrichers: Vec<Box<dyn AttributeEnricher>>,
}

impl EnrichedModel {
    pub fn new(wrapped: Box<dyn PredictiveModel>, enrichers: Vec<Box<dyn AttributeEnricher>>) -> Self {
        Self { wrapped, enrichers }
    }
}

impl PredictiveModel for EnrichedModel {
    fn predict(&self, attributes: &AttributeBag) -> f64 {
        let mut enriched = attributes.clone();
        for enricher in &self.enrichers {
            enriched = enricher.enrich(&enriched);
        }
        self.wrapped.predict(&enriched)
    }
}
