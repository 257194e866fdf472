//! Reporting of recommendations and of the managed object census

use crate::model::{ManagedObject, UpdateMode};
use crate::quantity::to_metric_value;
use crate::sink::{
    MetricSink, ObjectCountLabels, RecommendationLabels, RecommendationType, ResourceName,
};
use std::collections::HashMap;

/// Write every recommended value of `object` to the sink.
///
/// Emits one gauge per container, band and resource. Objects without
/// recommendations produce no writes.
pub fn observe_recommendation(sink: &dyn MetricSink, object: &ManagedObject) {
    let pod_selector = object.pod_selector_string();

    for rec in object.container_recommendations() {
        for recommendation_type in RecommendationType::ALL {
            let band = recommendation_type.of(rec);
            for resource in ResourceName::ALL {
                let labels = RecommendationLabels {
                    object_name: &object.id.name,
                    namespace: &object.id.namespace,
                    pod_selector: &pod_selector,
                    container: &rec.container_name,
                    recommendation_type,
                    resource,
                };
                sink.set_recommendation(&labels, to_metric_value(&resource.of(band)));
            }
        }
    }
}

/// Census bucket: update mode (empty when unset) and recommendation presence
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    pub mode: String,
    pub has_recommendation: bool,
}

impl BucketKey {
    pub fn new(mode: impl Into<String>, has_recommendation: bool) -> Self {
        Self {
            mode: mode.into(),
            has_recommendation,
        }
    }

    fn of(object: &ManagedObject) -> Self {
        Self::new(object.mode_label(), object.has_recommendation())
    }
}

/// Splits managed objects into census buckets for one reporting cycle.
///
/// Every known update mode starts with a zero count for both values of the
/// recommendation flag, so a bucket that emptied since the last cycle is
/// reported as 0 instead of keeping its stale value. Build a fresh counter
/// for each cycle; [`ObjectCounter::observe`] does not reset it.
#[derive(Debug, Clone)]
pub struct ObjectCounter {
    counts: HashMap<BucketKey, u64>,
}

impl Default for ObjectCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectCounter {
    pub fn new() -> Self {
        let mut counts = HashMap::with_capacity(UpdateMode::KNOWN.len() * 2);
        for mode in &UpdateMode::KNOWN {
            for has_recommendation in [false, true] {
                counts.insert(BucketKey::new(mode.as_str(), has_recommendation), 0);
            }
        }
        Self { counts }
    }

    /// Count `object` in its bucket, creating the bucket if its mode is not
    /// one of the known ones.
    pub fn add(&mut self, object: &ManagedObject) {
        *self.counts.entry(BucketKey::of(object)).or_insert(0) += 1;
    }

    /// Write every bucket, zero-valued ones included, to the sink
    pub fn observe(&self, sink: &dyn MetricSink) {
        for (key, count) in &self.counts {
            let labels = ObjectCountLabels {
                update_mode: &key.mode,
                has_recommendation: key.has_recommendation,
            };
            sink.set_object_count(&labels, *count as f64);
        }
    }

    pub fn count(&self, key: &BucketKey) -> Option<u64> {
        self.counts.get(key).copied()
    }

    /// Number of buckets currently held
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
