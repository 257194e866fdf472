//! Write-only interface to the metrics backend
//!
//! Label tuples are typed structs rather than ad hoc string slices so a
//! caller cannot pass the wrong number or order of label values.

use crate::model::{ContainerRecommendation, ResourceList};
use crate::quantity::Quantity;

/// Label names of the per-container recommendation gauge, in order.
pub const RECOMMENDATION_LABEL_NAMES: [&str; 6] = [
    "vpa_name",
    "namespace",
    "pod_selector",
    "container",
    "recommendation_type",
    "resource_name",
];

/// Label names of the object census gauge, in order.
pub const OBJECT_COUNT_LABEL_NAMES: [&str; 2] = ["update_mode", "has_recommendation"];

/// One of the three recommendation bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecommendationType {
    LowerBound,
    Target,
    UpperBound,
}

impl RecommendationType {
    pub const ALL: [RecommendationType; 3] = [
        RecommendationType::LowerBound,
        RecommendationType::Target,
        RecommendationType::UpperBound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::LowerBound => "lower_bound",
            RecommendationType::Target => "target",
            RecommendationType::UpperBound => "upper_bound",
        }
    }

    pub fn of<'a>(&self, recommendation: &'a ContainerRecommendation) -> &'a ResourceList {
        match self {
            RecommendationType::LowerBound => &recommendation.lower_bound,
            RecommendationType::Target => &recommendation.target,
            RecommendationType::UpperBound => &recommendation.upper_bound,
        }
    }
}

/// Resource dimension reported per band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceName {
    Cpu,
    Memory,
}

impl ResourceName {
    pub const ALL: [ResourceName; 2] = [ResourceName::Cpu, ResourceName::Memory];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceName::Cpu => "cpu",
            ResourceName::Memory => "memory",
        }
    }

    pub fn of(&self, resources: &ResourceList) -> Quantity {
        match self {
            ResourceName::Cpu => resources.cpu(),
            ResourceName::Memory => resources.memory(),
        }
    }
}

/// Identifies one series of the recommendation gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationLabels<'a> {
    pub object_name: &'a str,
    pub namespace: &'a str,
    pub pod_selector: &'a str,
    pub container: &'a str,
    pub recommendation_type: RecommendationType,
    pub resource: ResourceName,
}

impl<'a> RecommendationLabels<'a> {
    /// Values in [`RECOMMENDATION_LABEL_NAMES`] order
    pub fn values(&self) -> [&'a str; 6] {
        [
            self.object_name,
            self.namespace,
            self.pod_selector,
            self.container,
            self.recommendation_type.as_str(),
            self.resource.as_str(),
        ]
    }
}

/// Identifies one bucket of the object census gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectCountLabels<'a> {
    pub update_mode: &'a str,
    pub has_recommendation: bool,
}

impl<'a> ObjectCountLabels<'a> {
    /// Values in [`OBJECT_COUNT_LABEL_NAMES`] order
    pub fn values(&self) -> [&'a str; 2] {
        let has = if self.has_recommendation { "true" } else { "false" };
        [self.update_mode, has]
    }
}

/// Destination for recommender metrics.
///
/// Gauges are last-write-wins per label tuple. Implementations must accept
/// concurrent writes.
pub trait MetricSink: Send + Sync {
    fn set_recommendation(&self, labels: &RecommendationLabels<'_>, value: f64);

    fn set_object_count(&self, labels: &ObjectCountLabels<'_>, count: f64);

    /// Seconds from object creation to its first recommendation
    fn observe_recommendation_latency(&self, seconds: f64);

    /// Seconds spent in one step of the recommender loop
    fn observe_execution_time(&self, step: &str, seconds: f64);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// A single call made against [`RecordingSink`]
    #[derive(Debug, Clone, PartialEq)]
    pub enum SinkWrite {
        Recommendation { labels: Vec<String>, value: f64 },
        ObjectCount { labels: Vec<String>, count: f64 },
        RecommendationLatency(f64),
        ExecutionTime { step: String, seconds: f64 },
    }

    /// In-memory sink that keeps every write in call order.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        writes: Mutex<Vec<SinkWrite>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn writes(&self) -> Vec<SinkWrite> {
            self.writes.lock().unwrap().clone()
        }

        pub fn recommendation_writes(&self) -> Vec<(Vec<String>, f64)> {
            self.writes()
                .into_iter()
                .filter_map(|w| match w {
                    SinkWrite::Recommendation { labels, value } => Some((labels, value)),
                    _ => None,
                })
                .collect()
        }

        /// Last written count per (mode, has_recommendation) bucket
        pub fn object_counts(&self) -> BTreeMap<(String, String), f64> {
            let mut counts = BTreeMap::new();
            for write in self.writes() {
                if let SinkWrite::ObjectCount { labels, count } = write {
                    counts.insert((labels[0].clone(), labels[1].clone()), count);
                }
            }
            counts
        }

        pub fn latencies(&self) -> Vec<f64> {
            self.writes()
                .into_iter()
                .filter_map(|w| match w {
                    SinkWrite::RecommendationLatency(seconds) => Some(seconds),
                    _ => None,
                })
                .collect()
        }

        pub fn execution_steps(&self) -> Vec<(String, f64)> {
            self.writes()
                .into_iter()
                .filter_map(|w| match w {
                    SinkWrite::ExecutionTime { step, seconds } => Some((step, seconds)),
                    _ => None,
                })
                .collect()
        }

        pub fn clear(&self) {
            self.writes.lock().unwrap().clear();
        }

        fn push(&self, write: SinkWrite) {
            self.writes.lock().unwrap().push(write);
        }
    }

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    impl MetricSink for RecordingSink {
        fn set_recommendation(&self, labels: &RecommendationLabels<'_>, value: f64) {
            self.push(SinkWrite::Recommendation {
                labels: owned(&labels.values()),
                value,
            });
        }

        fn set_object_count(&self, labels: &ObjectCountLabels<'_>, count: f64) {
            self.push(SinkWrite::ObjectCount {
                labels: owned(&labels.values()),
                count,
            });
        }

        fn observe_recommendation_latency(&self, seconds: f64) {
            self.push(SinkWrite::RecommendationLatency(seconds));
        }

        fn observe_execution_time(&self, step: &str, seconds: f64) {
            self.push(SinkWrite::ExecutionTime {
                step: step.to_string(),
                seconds,
            });
        }
    }
}
